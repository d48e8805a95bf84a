//! Main entry point for the ipscope-rs CLI tool

use clap::Parser;
use log::info;

use ipscope_rs::Result;
use ipscope_rs::cli::Cli;
use ipscope_rs::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    info!("Starting ipscope-rs v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let loaded = match cli.config {
        Some(ref path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}, using defaults", e);
        AppConfig::default()
    });

    // Execute CLI logic
    if let Err(e) = cli.run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
