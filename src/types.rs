use crate::ports::PortRange;
use ::time::{format_description::well_known, OffsetDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

/// Outcome class of one probe.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PortState {
    Open,
    Closed,
    Error,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
            PortState::Error => write!(f, "error"),
        }
    }
}

/// Why a probe ended in `PortState::Error`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeError {
    #[error("no response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("{message}")]
    Io { message: String },
}

/// One scan result entry for a single port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub port: u16,
    pub state: PortState,
    pub latency_ms: Option<u64>,
    pub error: Option<ProbeError>,
}

impl ProbeResult {
    pub fn open(port: u16, latency_ms: u64) -> Self {
        Self {
            port,
            state: PortState::Open,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn closed(port: u16, latency_ms: u64) -> Self {
        Self {
            port,
            state: PortState::Closed,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn failed(port: u16, error: ProbeError) -> Self {
        Self {
            port,
            state: PortState::Error,
            latency_ms: None,
            error: Some(error),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Every port in the range was probed.
    Complete,
    /// Dispatch stopped early; the report holds only the ports probed so far.
    Cancelled,
}

/// Scan-level details the collector stamps onto the finished report.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub host: String,
    pub address: IpAddr,
    pub range: PortRange,
    pub status: ScanStatus,
    pub started_at: String,
}

/// Final, port-ordered result of one scan.
#[derive(Serialize, Debug, Clone)]
pub struct ScanReport {
    pub host: String,
    pub address: IpAddr,
    pub range: PortRange,
    pub status: ScanStatus,
    pub started_at: String,
    pub finished_at: String,
    pub results: Vec<ProbeResult>,
}

impl ScanReport {
    pub fn is_complete(&self) -> bool {
        self.status == ScanStatus::Complete
    }

    /// Open ports in ascending order.
    pub fn open_ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.results.iter().filter(|r| r.is_open()).map(|r| r.port)
    }

    pub fn get(&self, port: u16) -> Option<&ProbeResult> {
        self.results
            .binary_search_by_key(&port, |r| r.port)
            .ok()
            .map(|i| &self.results[i])
    }

    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary {
            total: self.range.len() as u64,
            scanned: self.results.len() as u64,
            ..ScanSummary::default()
        };
        for r in &self.results {
            match r.state {
                PortState::Open => summary.open += 1,
                PortState::Closed => summary.closed += 1,
                PortState::Error => summary.errors += 1,
            }
        }
        summary
    }
}

/// Aggregate counters over a report.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub total: u64,
    pub scanned: u64,
    pub open: u64,
    pub closed: u64,
    pub errors: u64,
}

pub(crate) fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
