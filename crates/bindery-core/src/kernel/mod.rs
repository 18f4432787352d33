//! # Bindery Core Kernel
//!
//! Process-wide pieces shared by every other module: the read-only
//! [`constants`] the installer validates packages against, and the crate-level
//! [`Error`](error::Error) type that aggregates the subsystem errors.
pub mod constants;
pub mod error;

pub use error::{Error, Result};
