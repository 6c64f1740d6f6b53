use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use port_scan_rs::config::{ScanConfig, DEFAULT_CONCURRENCY, DEFAULT_HOST};
use port_scan_rs::controller::run_scan_with_cancel;
use port_scan_rs::error::ScanError;
use port_scan_rs::output;
use port_scan_rs::ports::PortRange;
use port_scan_rs::types::ScanReport;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

/// port-scan-rs — Concurrent TCP connect port scanner with bounded sockets.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "port-scan-rs",
    version,
    about = "Concurrent TCP connect port scanner with bounded sockets.",
    long_about = None
)]
struct Cli {
    /// Host name or IP address to scan.
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Single port (`80`) or inclusive range (`8000-8010`).
    #[arg(long, default_value = "1-65535")]
    ports: PortRange,

    /// Max concurrent TCP connect attempts.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 1000)]
    timeout_ms: u64,

    /// Write the full report as pretty JSON to this path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print a scanned-vs-open summary line after the port list.
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ScanConfig::new(cli.host.clone(), cli.ports)
        .with_concurrency(cli.concurrency)
        .with_timeout(Duration::from_millis(cli.timeout_ms));

    // Ctrl-C cancels the scan; probes already in flight finish on their own timeout.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_ctrlc.cancel();
        }
    });

    match run_scan_with_cancel(config, cancel).await {
        Ok(report) => match emit(&cli, &report) {
            Ok(()) if report.is_complete() => ExitCode::SUCCESS,
            Ok(()) => ExitCode::from(EXIT_CANCELLED),
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::from(EXIT_FAILURE)
            }
        },
        Err(e @ ScanError::Config(_)) => {
            eprintln!("Configuration error: {e}");
            ExitCode::from(EXIT_CONFIG)
        }
        Err(e) => {
            eprintln!("Scan failed: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn emit(cli: &Cli, report: &ScanReport) -> Result<()> {
    print!("{}", output::render_open_ports(report));
    if cli.summary || !report.is_complete() {
        println!("{}", output::render_summary(report));
    }
    if let Some(path) = cli.output.as_deref() {
        output::write_report_json(path, report)?;
        eprintln!("Wrote JSON report to {}", path.display());
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
