//! SpatialBias - spatial fairness audit client
//!
//! Main entry point of the `spatialbias` binary.

use std::process::ExitCode;

use clap::Parser;
use spatialbias_app::cli::{Cli, Commands};
use spatialbias_app::{commands, AppContext};
use spatialbias_infra::config;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before the filter reads RUST_LOG
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Defaults { mode } => {
            println!("{}", commands::defaults_json(mode)?);
        }
        Commands::Run(args) => {
            let ctx = AppContext::new(config::load()?).await?;
            let outcome = commands::run_analysis(&ctx, &args).await?;
            commands::write_output(&outcome, args.output.as_deref())?;
        }
        Commands::Status => {
            let ctx = AppContext::new(config::load()?).await?;
            println!("{}", commands::status_json(&ctx).await?);
        }
        Commands::Logout => {
            let ctx = AppContext::new(config::load()?).await?;
            ctx.credentials.logout().await;
            info!("Logged out");
        }
    }
    Ok(())
}
