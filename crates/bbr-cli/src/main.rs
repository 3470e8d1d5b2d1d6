mod cmd;
mod manifest_path;
mod output;

use bbr_core::BbrError;
use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, window::WindowOperation};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bbr-uaadb",
    about = "BOSH Backup and Restore scripts for the UAA database: lock, back up, restore, unlock",
    version,
    propagate_version = true
)]
struct Cli {
    /// Rendered job manifest (default: /var/vcap/jobs/bbr-uaadb/config/manifest.yml)
    #[arg(long, global = true, env = "BBR_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Put UAA in limited functionality mode before a backup
    PreBackupLock,

    /// Return UAA to normal operation after a backup
    PostBackupUnlock,

    /// Stop UAA before a restore
    PreRestoreLock,

    /// Start UAA and run its post-start hook after a restore
    PostRestoreUnlock,

    /// Write the restorer config and run the backup
    Backup {
        /// Directory provided by the BBR run for this job's artifacts
        #[arg(long, env = "BBR_ARTIFACT_DIRECTORY")]
        artifact_dir: PathBuf,
    },

    /// Write the restorer config and run the restore
    Restore {
        /// Directory provided by the BBR run for this job's artifacts
        #[arg(long, env = "BBR_ARTIFACT_DIRECTORY")]
        artifact_dir: PathBuf,
    },

    /// Lock, run and unlock in one process (unlock runs even if the tool fails)
    Window {
        #[arg(value_enum)]
        operation: WindowOperation,

        /// Directory provided by the BBR run for this job's artifacts
        #[arg(long, env = "BBR_ARTIFACT_DIRECTORY")]
        artifact_dir: PathBuf,
    },

    /// Render, show and validate the resolved configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Show whether the limited functionality marker is present
    Status,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Config { .. } | Commands::Status => tracing::Level::WARN,
        _ => tracing::Level::INFO,
    };

    // stdout belongs to the restorer; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let manifest = manifest_path::resolve_manifest_path(cli.manifest.as_deref());

    let result = match cli.command {
        Commands::PreBackupLock => cmd::lock::pre_backup_lock(&manifest, cli.json),
        Commands::PostBackupUnlock => cmd::lock::post_backup_unlock(&manifest, cli.json),
        Commands::PreRestoreLock => cmd::lock::pre_restore_lock(&manifest, cli.json),
        Commands::PostRestoreUnlock => cmd::lock::post_restore_unlock(&manifest, cli.json),
        Commands::Backup { artifact_dir } => cmd::tool::backup(&manifest, &artifact_dir, cli.json),
        Commands::Restore { artifact_dir } => {
            cmd::tool::restore(&manifest, &artifact_dir, cli.json)
        }
        Commands::Window {
            operation,
            artifact_dir,
        } => cmd::window::run(&manifest, operation, &artifact_dir, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&manifest, subcommand, cli.json),
        Commands::Status => cmd::status::run(&manifest, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        let code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<BbrError>())
            .map(BbrError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
