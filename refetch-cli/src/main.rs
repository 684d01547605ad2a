//! Refetch command-line entry point.

mod cli;
mod commands;
mod telemetry;

use clap::Parser;
use cli::{Cli, Commands};
use refetch_client::HttpClient;
use refetch_core::{ClientConfig, RefetchResult};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> RefetchResult<()> {
    let cli = Cli::parse();
    let config = ClientConfig::load_from(cli.config.clone())?;

    if let Err(e) = telemetry::init(config.log_format, cli.verbose) {
        eprintln!("{}", e);
    }
    tracing::debug!(
        base_url = %config.api_base_url,
        ttl_ms = config.cache.ttl_ms,
        timeout_ms = config.request_timeout_ms,
        "Configuration loaded"
    );

    let client = HttpClient::from_config(&config)?;

    let result = match cli.command {
        Commands::Get(args) => commands::get(&client, args).await,
        Commands::Send(args) => commands::send(&client, args).await,
        Commands::Watch(args) => commands::watch(&client, &config.fetch, args).await,
        Commands::CacheDemo(args) => commands::cache_demo(&client, args).await,
    };

    client.cache().shutdown();
    result
}
