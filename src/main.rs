//! Varnish Load Tester
//!
//! Reads `varnishlog` output from one server and makes identical HTTP
//! requests (same method, path, headers) to another. Request bodies are not
//! replayed.
//!
//! # Architecture Overview
//!
//! ```text
//!   varnishlog -c -o -u -i RxRequest,RxURL,RxProtocol,RxHeader,ReqEnd
//!        │
//!        ▼
//!   ┌──────────┐    ┌──────────┐    ┌───────────┐
//!   │  source  │───▶│ decoder  │───▶│ assembler │
//!   │  driver  │    └──────────┘    └─────┬─────┘
//!   └──────────┘                          │ completed record
//!                                         ▼
//!                               ┌───────────────────┐
//!                               │ dispatcher (task  │──▶ target host
//!                               │ per record)       │
//!                               └─────────┬─────────┘
//!                                         ▼
//!                       [12ms] [200] GET http://www.dogs.com/...
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use varnish_replay::config::{load_config, normalize_target, validate_config, ReplayConfig};
use varnish_replay::observability::{logging, metrics};
use varnish_replay::replay::{build_client, Dispatcher, InFlightTracker};
use varnish_replay::source::{LogSource, StreamDriver};

#[derive(Parser)]
#[command(name = "varnish-replay")]
#[command(about = "Replay live Varnish traffic against another host", long_about = None)]
struct Cli {
    /// Destination host, e.g. teststage.local or 10.0.0.5:8080
    host: String,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read varnishlog output from stdin instead of spawning varnishlog
    #[arg(long)]
    stdin: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ReplayConfig::default(),
    };
    config.target = normalize_target(&cli.host);
    if cli.stdin {
        config.source.stdin = true;
    }

    logging::init_logging(&config.observability.log_level);

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(error = %error, "Invalid configuration");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    tracing::info!(
        target_host = %config.target,
        command = %config.source.command,
        stdin = config.source.stdin,
        "varnish-replay v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let in_flight = InFlightTracker::new();
    let dispatcher = Dispatcher::new(
        build_client(&config.client),
        config.target.as_str(),
        in_flight.clone(),
    );

    let (reader, _child) = LogSource::open(&config.source)?.into_parts();
    let mut driver = StreamDriver::new(dispatcher);
    driver.run(reader).await?;

    let remaining = in_flight
        .wait_idle(Duration::from_secs(config.source.drain_timeout_secs))
        .await;
    if remaining > 0 {
        tracing::warn!(remaining, "Abandoning in-flight requests");
    }

    Ok(())
}
