use crate::types::ScanReport;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;

/// One `<port> open` line per open port, ascending.
pub fn render_open_ports(report: &ScanReport) -> String {
    let mut out = String::new();
    for port in report.open_ports() {
        let _ = writeln!(out, "{port} open");
    }
    out
}

/// Single-line scanned-vs-open summary.
pub fn render_summary(report: &ScanReport) -> String {
    let s = report.summary();
    let mut line = format!(
        "{}: scanned {} of {} ports, {} open, {} closed, {} errors",
        report.host, s.scanned, s.total, s.open, s.closed, s.errors
    );
    if !report.is_complete() {
        line.push_str(" (cancelled, partial results)");
    }
    line
}

/// Write the full report as pretty JSON.
pub fn write_report_json(path: &Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("failed to write JSON to {}", path.display()))?;
    Ok(())
}
