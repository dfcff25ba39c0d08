use anyhow::{Context, Result};
use blockops_hal::{DeviceError, DeviceOps, DeviceOpsConfig, LinuxHal, MountOptions, SystemHal};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod logging;

#[derive(Debug, Parser)]
#[command(name = "blockops")]
#[command(about = "Inspect, format and mount block devices")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log destructive operations instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Run privileged commands directly instead of through the escalation prefix
    #[arg(long, global = true)]
    no_escalation: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the filesystem type of a mounted device (e.g. sda1)
    Fstype { device: String },

    /// Create an ext4 filesystem on a device
    Format {
        device_path: PathBuf,

        /// Confirm that all data on the device will be destroyed
        #[arg(long)]
        yes_i_know: bool,
    },

    /// Print the GPT disk GUID (empty if unavailable)
    Uuid { device: String },

    /// Print where a device is mounted (empty if not mounted)
    MountPoint { device: String },

    /// Print the device mounted at a path (empty if none)
    Device { mount_point: PathBuf },

    /// Mount a device, creating the target directory
    Mount {
        device_path: PathBuf,
        mount_path: PathBuf,

        /// Comma-separated mount options
        #[arg(short = 'o', long)]
        options: Option<String>,
    },

    /// Unmount a device (succeeds if it is not mounted)
    Unmount { device_path: PathBuf },

    /// Report whether a device has partitions
    HasChildren { device: String },

    /// Recursively give a path to the current user
    Chown { path: PathBuf },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DeviceOpsConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DeviceOpsConfig::default(),
    };
    if cli.dry_run {
        config.dry_run = true;
    }
    if cli.no_escalation {
        config.escalation.clear();
    }

    let ops = DeviceOps::new(LinuxHal::new(), config);
    let stdout = io::stdout();
    run(&ops, cli.command, &mut stdout.lock())
}

fn run<H: SystemHal>(ops: &DeviceOps<H>, command: Commands, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Fstype { device } => writeln!(out, "{}", ops.filesystem_type(&device)?)?,
        Commands::Format {
            device_path,
            yes_i_know,
        } => {
            if !yes_i_know {
                return Err(DeviceError::MissingYesIKnow.into());
            }
            ops.format_device(&device_path)?;
            log::info!("{}", format_summary(ops.config().dry_run, &device_path));
        }
        Commands::Uuid { device } => writeln!(out, "{}", ops.disk_uuid(&device)?)?,
        Commands::MountPoint { device } => writeln!(out, "{}", ops.mount_point(&device)?)?,
        Commands::Device { mount_point } => {
            writeln!(out, "{}", ops.device_from_mount_point(&mount_point)?)?
        }
        Commands::Mount {
            device_path,
            mount_path,
            options,
        } => {
            let options = options.map(MountOptions::with_options).unwrap_or_default();
            ops.mount_with_options(&device_path, &mount_path, &options)?;
        }
        Commands::Unmount { device_path } => ops.unmount(&device_path)?,
        Commands::HasChildren { device } => writeln!(out, "{}", ops.has_children(&device)?)?,
        Commands::Chown { path } => ops.reconcile_ownership(&path),
    }
    Ok(())
}

fn format_summary(dry_run: bool, device_path: &Path) -> String {
    if dry_run {
        format!("dry run: {} left untouched", device_path.display())
    } else {
        format!("formatted {}", device_path.display())
    }
}
