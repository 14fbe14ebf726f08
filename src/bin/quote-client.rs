use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use quote_relay::client;
use quote_relay::config::{self, RelayConfig};
use quote_relay::observability;

#[derive(Parser)]
#[command(name = "quote-client")]
#[command(about = "Fetches the current bid from the quote relay and writes it to a file", long_about = None)]
struct Cli {
    /// TOML configuration file (uses the `[client]` section).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relay endpoint.
    #[arg(short, long)]
    url: Option<String>,

    /// Output file, overwritten on success.
    #[arg(short, long)]
    output: Option<String>,

    /// Budget for the call to the relay, in milliseconds.
    #[arg(short, long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match config::load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("quote-client: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => RelayConfig::default(),
    };
    if let Some(url) = cli.url {
        config.client.server_url = url;
    }
    if let Some(output) = cli.output {
        config.client.output_path = output;
    }
    if let Some(ms) = cli.timeout_ms {
        config.client.timeout_ms = ms;
    }
    if let Err(errors) = config::validate_config(&config) {
        eprintln!("quote-client: {}", config::ConfigError::Validation(errors));
        return ExitCode::FAILURE;
    }

    observability::logging::init(&config.observability);

    match client::run(&config.client).await {
        Ok(_) => {
            println!("quote saved in {} successfully!", config.client.output_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Client run failed");
            ExitCode::FAILURE
        }
    }
}
