use std::path::Path;

use clap::Parser;
use tracing::info;

use tfredis_server::config::ServeConfig;

/// Redis string provider plugin. Speaks the plugin protocol on stdio.
#[derive(Parser, Debug)]
#[command(
    name = "terraform-provider-redis",
    version,
    about = "Terraform-style provider for Redis string keys"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "terraform-provider-redis.toml")]
    config: String,

    /// Override the log filter (e.g. `debug` or `tfredis_provider=trace`).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let mut config = ServeConfig::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.log_json {
        config.logging.json = true;
    }

    tfredis_server::telemetry::init(&config.logging)?;

    if !Path::new(&cli.config).exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    tfredis_server::run(&config).await?;
    Ok(())
}
