use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fatmirror::logging::log_set_stderr;
use fatmirror::passthrough::mount::mount;
use fatmirror::{LogLevel, MountConfig};
use log::{error, info};
use tokio::signal;

/// Mirror a directory tree with every FAT-illegal character in file names
/// replaced, so the tree can be copied onto FAT-style filesystems.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Where to mount the mirror
    mountpoint: PathBuf,
    /// Mirror the filesystem from under this directory
    #[arg(long, default_value = "/")]
    root: PathBuf,
    /// Characters to replace in addition to `?*:`
    #[arg(long, default_value = "")]
    extra_illegal: String,
    /// Replacement for every illegal character
    #[arg(long, default_value_t = '_')]
    replacement: char,
    /// Let other users access the mount
    #[arg(long)]
    allow_other: bool,
    /// Mount directly instead of through fusermount3
    #[arg(long)]
    privileged: bool,
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match MountConfig::builder(&args.mountpoint)
        .root(&args.root)
        .extra_illegal(args.extra_illegal)
        .replacement(args.replacement)
        .allow_other(args.allow_other)
        .unprivileged(!args.privileged)
        .log_level(args.log_level)
        .build()
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("fatmirror: invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = log_set_stderr(config.log_level) {
        eprintln!("fatmirror: {err}");
    }

    let mut mount_handle = match mount(&config).await {
        Ok(handle) => handle,
        Err(err) => {
            error!("mount failed: {err}");
            eprintln!("fatmirror: mount failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let handle = &mut mount_handle;
    tokio::select! {
        res = handle => {
            if let Err(err) = res {
                eprintln!("fatmirror: session ended with error: {err}");
                return ExitCode::FAILURE;
            }
        }
        _ = signal::ctrl_c() => {
            info!("interrupted; unmounting {}", config.mountpoint.display());
            if let Err(err) = mount_handle.unmount().await {
                eprintln!("fatmirror: unmount failed: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
