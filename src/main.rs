//! homesentry CLI entrypoint

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use homesentry::cli::Cli;
use homesentry::MonitorError;

/// Exit code when the device stream cannot be opened
const EXIT_DEVICE_UNAVAILABLE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Parse and execute CLI
    let cli = Cli::parse();
    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            let fatal = e
                .downcast_ref::<MonitorError>()
                .is_some_and(MonitorError::is_fatal);
            if fatal {
                ExitCode::from(EXIT_DEVICE_UNAVAILABLE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
