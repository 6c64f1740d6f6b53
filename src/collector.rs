use crate::error::ScanError;
use crate::types::{now_rfc3339, ProbeResult, ReportMeta, ScanReport, ScanStatus};
use std::collections::btree_map::{BTreeMap, Entry};
use tokio::sync::Mutex;

/// Thread-safe sink for probe results, keyed by port.
///
/// Each port may be recorded once. Ordering comes from the map, so
/// `finalize` yields results ascending by port regardless of the order
/// probes finished in.
#[derive(Debug)]
pub struct ResultCollector {
    expected: usize,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    results: BTreeMap<u16, ProbeResult>,
    finalized: bool,
}

impl ResultCollector {
    /// `expected` is the number of ports a complete scan records.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Stores `result`. A second result for the same port is a dispatch bug:
    /// it is rejected with `CollectorConflict` and the first one is kept.
    pub async fn record(&self, result: ProbeResult) -> Result<(), ScanError> {
        let mut guard = self.inner.lock().await;
        if guard.finalized {
            return Err(ScanError::CollectorFinalized);
        }
        match guard.results.entry(result.port) {
            Entry::Occupied(_) => {
                tracing::error!(port = result.port, "duplicate probe result");
                Err(ScanError::CollectorConflict { port: result.port })
            }
            Entry::Vacant(slot) => {
                slot.insert(result);
                Ok(())
            }
        }
    }

    /// Number of results recorded so far.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.results.len()
    }

    /// Freezes the collector and hands out the sorted report.
    ///
    /// A `Complete` report must hold exactly `expected` results; a `Cancelled`
    /// one may hold fewer.
    pub async fn finalize(&self, meta: ReportMeta) -> Result<ScanReport, ScanError> {
        let mut guard = self.inner.lock().await;
        if guard.finalized {
            return Err(ScanError::CollectorFinalized);
        }
        guard.finalized = true;
        let recorded = guard.results.len();
        if meta.status == ScanStatus::Complete && recorded != self.expected {
            tracing::error!(expected = self.expected, recorded, "complete scan is missing results");
            return Err(ScanError::MissingResults {
                expected: self.expected,
                recorded,
            });
        }
        let results: Vec<ProbeResult> = std::mem::take(&mut guard.results).into_values().collect();
        Ok(ScanReport {
            host: meta.host,
            address: meta.address,
            range: meta.range,
            status: meta.status,
            started_at: meta.started_at,
            finished_at: now_rfc3339(),
            results,
        })
    }
}
