//! Library crate for port-scan-rs: a bounded, cancellable TCP connect scanner.
pub mod collector;
pub mod config;
pub mod controller;
pub mod error;
pub mod output;
pub mod ports;
pub mod probe;
pub mod scanner;
pub mod types;

pub use collector::ResultCollector;
pub use config::ScanConfig;
pub use controller::{run_scan, run_scan_with_cancel, ScanController};
pub use error::{ConfigError, ScanError};
pub use ports::PortRange;
pub use probe::ProbeTask;
pub use scanner::{ScanProgress, Scanner};
pub use types::{PortState, ProbeError, ProbeResult, ScanReport, ScanStatus, ScanSummary};
