use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use bledut_harness::config::{Config, ConfigLoader, LogFormat, LoggingConfig};
use bledut_harness::runner::{run_with_transport, GpioErrorCheckTest, TestCase};
use bledut_harness::transport::GatewayTransport;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Automated functional test for a BLE peripheral's GPIO control endpoint.",
    long_about = "Connects to a device under test through a serial-attached BLE gateway, \
exercises the GPIO configuration and write commands with valid and invalid parameters, and \
checks the returned status codes. The process always exits 0; orchestrators consume the \
PASS/FAIL log line, not the exit code."
)]
struct Args {
    /// Run as stand-alone test
    #[arg(short, long)]
    run: bool,

    /// Path to a configuration file (overrides standard resolution)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&logging.level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let writer = match &logging.file {
        Some(path) => match std::fs::File::create(path) {
            Ok(file) => BoxMakeWriter::new(Arc::new(file)),
            Err(e) => {
                eprintln!("Could not open log file {}: {e}", path.display());
                BoxMakeWriter::new(std::io::stderr)
            }
        },
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config: Config = {
        let loaded = match &args.config {
            Some(path) => ConfigLoader::load_from(path),
            None => ConfigLoader::load(),
        };
        match loaded {
            Ok(loader) => loader.into_config(),
            Err(e) => {
                eprintln!("Configuration error: {e}");
                std::process::exit(2);
            }
        }
    };

    init_tracing(&config.logging, args.log_level.as_deref());

    if !args.run {
        info!("Nothing to do; pass --run to execute the test standalone");
        return;
    }

    let Some(port) = config.device.gateway_port.clone() else {
        error!("No gateway port configured; set device.gateway_port or BLEDUT_DEVICE_GATEWAY_PORT");
        std::process::exit(2);
    };

    let transport = match GatewayTransport::open(&port, config.device.baud) {
        Ok(transport) => transport,
        Err(e) => {
            error!(port = %port, error = %e, "could not open BLE gateway");
            std::process::exit(2);
        }
    };

    info!("Running test: {}", GpioErrorCheckTest.display_name());
    let report = run_with_transport(Box::new(transport), &config).await;

    for record in &report.records {
        info!("{}", record.summary());
    }
    info!("Test Result: {}", report.outcome);
    if let Some(note) = &report.note {
        info!("Test Note: {note}");
    }

    // The exit code intentionally does not encode the verdict; orchestrators
    // parse the result line above.
}
