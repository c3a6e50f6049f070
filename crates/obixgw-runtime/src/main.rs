//! obixgw: polls point values from an OBIX building-automation gateway
//! and republishes the meaningful ones as sensor events.

use clap::Parser;

mod cli;
mod cmd_check;
mod cmd_read;
mod config_file;
mod daemon;
mod emitter;
mod poll_loop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr; stdout is the default event bus.
    let filter = std::env::var("OBIXGW_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        cli::Command::Daemon(opts) => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "obixgw daemon starting");
            let config = config_file::load_config(&args.config)?;
            daemon::run_daemon(config, opts).await?;
        }
        cli::Command::Check => cmd_check::cmd_check(&args.config)?,
        cli::Command::Read(opts) => cmd_read::cmd_read(&args.config, &opts.remote_id).await?,
    }

    Ok(())
}
