//! viewbind command-line entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use viewbind::cli;
use viewbind::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let filter = match (std::env::var("RUST_LOG").is_ok(), cli.log_level()) {
        (true, _) => Some(EnvFilter::from_default_env()),
        (false, Some(level)) => Some(EnvFilter::new(format!("viewbind={level}"))),
        (false, None) => None,
    };
    if let Some(filter) = filter {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    // Execute the command
    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
