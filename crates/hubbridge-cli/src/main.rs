//! hubbridge — prints the Event Hubs-compatible connection string of an
//! IoT Hub, discovered from the hub's own connection string.

mod amqp;
mod config;

use anyhow::Context;
use clap::Parser;
use hubbridge_sdk::Converter;
use tracing::info;

use crate::amqp::AmqpSessionOpener;
use crate::config::{CliConfig, OutputFormat};

/// Discover the broker-compatible connection string of a device registry.
#[derive(Parser, Debug)]
#[command(name = "hubbridge", author, version, about, long_about = None)]
struct Args {
    /// Registry connection string
    /// (`HostName=…;SharedAccessKeyName=…;SharedAccessKey=…`).
    #[arg(env = "IotConnectionString", hide_env_values = true)]
    connection_string: String,

    /// Seconds to wait for the registry's redirect.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print a JSON object instead of the bare connection string.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the result.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = CliConfig::from_env().with_overrides(args.timeout_secs, args.json);
    info!(timeout = ?config.redirect_timeout, "converting connection string");

    let converter =
        Converter::new(AmqpSessionOpener).with_redirect_timeout(config.redirect_timeout);
    let output = converter
        .convert(&args.connection_string)
        .await
        .context("failed to derive the Event Hubs-compatible connection string")?;

    match config.output {
        OutputFormat::Plain => println!("{output}"),
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&output)?;
            value["connectionString"] = output.to_string().into();
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
