mod cli; // Declare the cli module

use std::path::{Path, PathBuf};

use bindery_core::config::{ConfigFormat, InstallerConfig};
use bindery_core::extension::{
    ArchiveInspector, ExtensionInstaller, InstallSettings, LocalPackageFetcher, PackageInspector,
};
use bindery_core::kernel::Error;
use clap::{Parser, Subcommand};
use log::debug;

/// Bindery: installs content-source extension packages
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Installer configuration file (.json, .yaml or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install an extension package and list the sources it provides
    Install {
        /// Path to the extension package
        package: PathBuf,
        /// Directory for the converted payload (a temporary one by default)
        #[arg(long)]
        tmp_dir: Option<PathBuf>,
    },
    /// Show a package's manifest and whether it would be accepted
    Inspect {
        /// Path to the extension package
        package: PathBuf,
    },
    /// Print the effective installer configuration
    Config {
        /// Output format: json, yaml or toml
        #[arg(long, default_value = "json")]
        format: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Failed to initialize env_logger: {}", e);
    }
}

fn load_settings(config: Option<&Path>) -> Result<InstallSettings, Error> {
    let config = match config {
        Some(path) => InstallerConfig::load(path)?,
        None => InstallerConfig::default(),
    };
    Ok(config.into_settings()?)
}

async fn run(args: CliArgs) -> Result<(), Error> {
    let settings = load_settings(args.config.as_deref())?;

    match args.command {
        Commands::Install { package, tmp_dir } => {
            // Keep the temporary directory alive until the sources are printed
            let scratch = match tmp_dir {
                Some(dir) => {
                    std::fs::create_dir_all(&dir).map_err(|e| Error::io(e, "create_tmp_dir", dir.clone()))?;
                    (dir, None)
                }
                None => {
                    let temp = tempfile::Builder::new()
                        .prefix("bindery-install-")
                        .tempdir()
                        .map_err(|e| Error::io(e, "create_tmp_dir", std::env::temp_dir()))?;
                    (temp.path().to_path_buf(), Some(temp))
                }
            };
            debug!("Using {} for converted payloads", scratch.0.display());

            let installer = ExtensionInstaller::new(settings);
            let result = installer
                .install(&scratch.0, &LocalPackageFetcher::new(package))
                .await?;
            cli::print_install_result(&result);
            Ok(())
        }
        Commands::Inspect { package } => {
            let manifest = ArchiveInspector::new().inspect(&package)?;
            let verdict = ExtensionInstaller::new(settings)
                .validate(&manifest)
                .map_err(|e| e.to_string());
            cli::print_manifest(&manifest, &verdict);
            Ok(())
        }
        Commands::Config { format } => {
            let format = ConfigFormat::from_name(&format)
                .ok_or_else(|| bindery_core::config::ConfigError::UnsupportedFormat(format.clone()))?;
            let text = InstallerConfig::from(&settings).to_string(format)?;
            println!("{}", text.trim_end());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
