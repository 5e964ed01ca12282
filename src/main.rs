mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use queuewatch::config::Config;
use queuewatch::observability::{init_tracing, with_bootstrap_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = with_bootstrap_logging(Config::load)?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve(args) => queuewatch::api::run(config, args.address).await?,
        Commands::CheckConfig => print_config(&config),
    }

    Ok(())
}

/// Connection strings are left out; they usually carry credentials.
fn print_config(config: &Config) {
    let settings = [
        ("server.bind_addr", config.server.bind_addr().to_string()),
        ("database.max_connections", config.database.max_connections.to_string()),
        ("database.acquire_timeout_secs", config.database.acquire_timeout_secs.to_string()),
        ("cache.key_prefix", config.cache.key_prefix.clone()),
        ("cache.scan_count", config.cache.scan_count.to_string()),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format).to_lowercase()),
    ];

    for (key, value) in settings {
        println!("{key:<30} = {value}");
    }
}
