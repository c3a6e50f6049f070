//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Config file used when neither `--config` nor `OBIXGW_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "obix.cfg";

#[derive(Parser)]
#[command(name = "obixgw", about = "OBIX gateway to sensor event bus bridge", version)]
pub struct Cli {
    /// Mapping config file (JSON)
    #[arg(long, short = 'c', global = true, env = "OBIXGW_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the polling daemon
    Daemon(DaemonOpts),
    /// Validate the config file and print the mapping summary
    Check,
    /// Read one mapped point once and print the reading (JSON)
    Read(ReadOpts),
}

#[derive(clap::Args, Default)]
pub struct DaemonOpts {
    /// Override the configured poll period, in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Append events to this file instead of stdout (one JSON object per line)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ReadOpts {
    /// Gateway-side point identifier, as found in the mapping config
    pub remote_id: String,
}
