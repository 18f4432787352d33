//! Materializes a package file on disk before installation.
use std::future::Future;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::extension::error::BoxError;

/// Produces the path of a raw package file once it is on disk.
///
/// Any `Fn() -> impl Future<Output = Result<PathBuf, BoxError>>` closure is a
/// fetcher, so callers can pass `move || async move { ... }` directly.
#[async_trait]
pub trait PackageFetcher: Send + Sync {
    async fn fetch(&self) -> Result<PathBuf, BoxError>;
}

#[async_trait]
impl<F, Fut> PackageFetcher for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<PathBuf, BoxError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<PathBuf, BoxError> {
        (self)().await
    }
}

/// Fetcher for a package that already sits on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalPackageFetcher {
    path: PathBuf,
}

impl LocalPackageFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PackageFetcher for LocalPackageFetcher {
    async fn fetch(&self) -> Result<PathBuf, BoxError> {
        let metadata = fs::metadata(&self.path).await.map_err(|e| {
            Box::new(std::io::Error::new(
                e.kind(),
                format!("cannot access package '{}': {}", self.path.display(), e),
            )) as BoxError
        })?;
        if !metadata.is_file() {
            return Err(format!("package '{}' is not a file", self.path.display()).into());
        }
        Ok(self.path.clone())
    }
}
