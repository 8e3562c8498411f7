//! agentlink-probe: checks that a collector address resolves and accepts TCP.
//!
//! Usage:
//!   agentlink-probe collector.example.com:5555 --timeout 10
//!
//! Exit status is 0 when reachable, 1 otherwise. `RUST_LOG` controls verbosity.

use std::process::ExitCode;
use std::time::Duration;

use agentlink::probe::{DEFAULT_PROBE_TIMEOUT, probe};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "agentlink-probe")]
#[command(about = "Check DNS resolution and TCP reachability of a collector")]
#[command(version)]
struct Args {
    /// Collector address (host:port)
    #[arg(env = "AGENTLINK_SERVER")]
    address: String,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT.as_secs())]
    timeout: u64,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let timeout = Duration::from_secs(args.timeout);

    match probe(&args.address, timeout).await {
        Ok(report) => {
            info!(
                host = %report.host,
                resolved = report.resolved.len(),
                connected = %report.connected,
                "collector reachable"
            );
            if args.json {
                match serde_json::to_string(&report) {
                    Ok(line) => println!("{line}"),
                    Err(e) => error!(error = %e, "cannot render report"),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(address = %args.address, label = e.as_label(), error = %e, "collector unreachable");
            ExitCode::FAILURE
        }
    }
}
