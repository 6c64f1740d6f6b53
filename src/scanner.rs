use crate::collector::ResultCollector;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::probe::ProbeTask;
use crate::types::{now_rfc3339, ProbeResult, ReportMeta, ScanReport, ScanStatus};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Upper bound on simultaneous sockets regardless of the configured limit.
pub const MAX_CONCURRENCY: usize = 5_000;

/// Live counters for a running scan. Clones share the same counters.
#[derive(Clone, Debug)]
pub struct ScanProgress {
    pub total: Arc<AtomicU64>,
    pub completed: Arc<AtomicU64>,
    pub open: Arc<AtomicU64>,
    pub in_flight: Arc<AtomicUsize>,
    pub peak_in_flight: Arc<AtomicUsize>,
}

impl ScanProgress {
    pub fn new(total: u64) -> Self {
        Self {
            total: Arc::new(AtomicU64::new(total)),
            completed: Arc::new(AtomicU64::new(0)),
            open: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn enter(&self) -> InFlight {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight {
            in_flight: self.in_flight.clone(),
        }
    }

    fn finish(&self, result: &ProbeResult) {
        if result.is_open() {
            self.open.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

// Decrements the in-flight gauge on every exit path of a probe task.
struct InFlight {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Dispatches one probe per port, at most `concurrency` at a time.
#[derive(Debug)]
pub struct Scanner {
    config: Arc<ScanConfig>,
    address: IpAddr,
    collector: Arc<ResultCollector>,
    progress: ScanProgress,
}

impl Scanner {
    /// `address` is the already-resolved form of `config.host`.
    pub fn new(config: ScanConfig, address: IpAddr, collector: Arc<ResultCollector>) -> Self {
        let progress = ScanProgress::new(config.range.len() as u64);
        Self {
            config: Arc::new(config),
            address,
            collector,
            progress,
        }
    }

    pub fn progress(&self) -> ScanProgress {
        self.progress.clone()
    }

    /// Runs the scan until every port is probed or `cancel` fires.
    ///
    /// - Admission goes through a `Semaphore`; a permit is taken before a task is
    ///   spawned and held until it finishes, so sockets stay bounded by the limit.
    /// - Finished tasks are reaped while dispatching so the `JoinSet` never holds
    ///   more than the in-flight set plus a few completed handles.
    /// - After cancellation no new probes start; in-flight ones run to their own
    ///   timeout and the partial report is marked `Cancelled`.
    /// - A collector conflict or a panicking task aborts everything still running.
    pub async fn scan(&self, cancel: CancellationToken) -> Result<ScanReport, ScanError> {
        let config = self.config.clone();
        let started_at = now_rfc3339();
        let limit = config.concurrency.clamp(1, MAX_CONCURRENCY);
        if limit != config.concurrency {
            tracing::warn!(
                requested = config.concurrency,
                limit,
                "concurrency clamped"
            );
        }
        tracing::info!(
            host = %config.host,
            address = %self.address,
            range = %config.range,
            concurrency = limit,
            timeout_ms = config.timeout.as_millis() as u64,
            "scan started"
        );

        let sem = Arc::new(Semaphore::new(limit));
        let mut set: JoinSet<Result<(), ScanError>> = JoinSet::new();
        let mut status = ScanStatus::Complete;

        for port in config.range {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = sem.clone().acquire_owned() => Some(permit?),
            };
            let Some(permit) = permit else {
                status = ScanStatus::Cancelled;
                tracing::warn!(next_port = port, "scan cancelled, draining in-flight probes");
                break;
            };

            let task = ProbeTask::new(SocketAddr::new(self.address, port), config.timeout);
            let collector = self.collector.clone();
            let progress = self.progress.clone();
            set.spawn(async move {
                let _permit = permit;
                let result = {
                    let _flight = progress.enter();
                    task.run().await
                };
                progress.finish(&result);
                collector.record(result).await
            });

            while let Some(joined) = set.try_join_next() {
                if let Err(e) = settle(joined) {
                    set.abort_all();
                    return Err(e);
                }
            }
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = settle(joined) {
                set.abort_all();
                return Err(e);
            }
        }

        let report = self
            .collector
            .finalize(ReportMeta {
                host: config.host.clone(),
                address: self.address,
                range: config.range,
                status,
                started_at,
            })
            .await?;
        let summary = report.summary();
        tracing::info!(
            scanned = summary.scanned,
            open = summary.open,
            errors = summary.errors,
            status = ?report.status,
            "scan finished"
        );
        Ok(report)
    }
}

fn settle(joined: Result<Result<(), ScanError>, JoinError>) -> Result<(), ScanError> {
    joined?
}
