use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use port_scan_rs::{
    run_scan, run_scan_with_cancel, ConfigError, PortRange, PortState, ScanConfig,
    ScanController, ScanError, ScanReport, ScanStatus,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

// Loopback scans run one at a time so one test's listeners never land inside
// another test's window.
static LOOPBACK: Mutex<()> = Mutex::const_new(());

/// Binds listeners on the 2nd and 4th port of an 11-port window and returns
/// the window start. Listeners must stay alive for the duration of the test.
async fn bind_window() -> (u16, Vec<TcpListener>) {
    for _ in 0..50 {
        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let p = first.local_addr().unwrap().port();
        if p < 2 || p > 65525 {
            continue;
        }
        let base = p - 1;
        if let Ok(second) = TcpListener::bind(("127.0.0.1", base + 3)).await {
            return (base, vec![first, second]);
        }
    }
    panic!("could not bind test listeners");
}

fn states(report: &ScanReport) -> Vec<(u16, PortState)> {
    report.results.iter().map(|r| (r.port, r.state)).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn window_reports_listeners_open_and_rest_closed() {
    let _serial = LOOPBACK.lock().await;
    let (base, _listeners) = bind_window().await;
    let config = ScanConfig::new("127.0.0.1", PortRange::new(base, base + 10).unwrap())
        .with_concurrency(4)
        .with_timeout(Duration::from_millis(500));

    let report = run_scan(config).await.expect("scan ok");

    assert_eq!(report.status, ScanStatus::Complete);
    assert_eq!(report.results.len(), 11);
    let ports: Vec<u16> = report.results.iter().map(|r| r.port).collect();
    assert_eq!(ports, (base..=base + 10).collect::<Vec<_>>());

    let open: BTreeSet<u16> = report.open_ports().collect();
    assert_eq!(open, BTreeSet::from([base + 1, base + 3]));
    for r in &report.results {
        if !open.contains(&r.port) {
            assert_eq!(r.state, PortState::Closed, "port {}", r.port);
            assert!(r.error.is_none());
        }
    }

    let summary = report.summary();
    assert_eq!((summary.total, summary.scanned, summary.open), (11, 11, 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_scans_agree() {
    let _serial = LOOPBACK.lock().await;
    let (base, _listeners) = bind_window().await;
    let config = ScanConfig::new("localhost", PortRange::new(base, base + 10).unwrap())
        .with_concurrency(4)
        .with_timeout(Duration::from_millis(500));

    let first = run_scan(config.clone()).await.expect("first scan");
    let second = run_scan(config).await.expect("second scan");
    assert_eq!(states(&first), states(&second));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_probes_never_exceed_limit() {
    let _serial = LOOPBACK.lock().await;
    let config = ScanConfig::new("127.0.0.1", PortRange::new(1, 300).unwrap())
        .with_concurrency(3)
        .with_timeout(Duration::from_millis(500));
    let scanner = ScanController::new(config).prepare().await.expect("valid config");
    let progress = scanner.progress();

    let report = scanner.scan(CancellationToken::new()).await.expect("scan ok");

    assert_eq!(report.results.len(), 300);
    let peak = progress.peak_in_flight.load(Ordering::SeqCst);
    assert!((1..=3).contains(&peak), "peak in flight was {peak}");
    assert_eq!(progress.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(progress.completed.load(Ordering::Relaxed), 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_returns_partial_report_promptly() {
    let _serial = LOOPBACK.lock().await;
    let timeout = Duration::from_millis(500);
    let config = ScanConfig::new("127.0.0.1", PortRange::FULL)
        .with_concurrency(1)
        .with_timeout(timeout);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let report = run_scan_with_cancel(config, cancel).await.expect("scan ok");
    let elapsed = start.elapsed();

    assert_eq!(report.status, ScanStatus::Cancelled);
    assert!(report.results.len() < 65535);
    assert!(report.results.windows(2).all(|w| w[0].port < w[1].port));
    assert!(
        elapsed < Duration::from_millis(50) + timeout + Duration::from_secs(1),
        "took {elapsed:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn remote_scan_finishes_within_timeout() {
    // Whether TEST-NET-1 is unroutable, silently dropped or answered by a
    // proxy depends on the host network; only the time bound is fixed.
    let timeout = Duration::from_millis(300);
    let config = ScanConfig::new("192.0.2.1", PortRange::new(80, 83).unwrap())
        .with_concurrency(4)
        .with_timeout(timeout);

    let start = Instant::now();
    let report = run_scan(config).await.expect("scan ok");
    let elapsed = start.elapsed();

    assert_eq!(report.status, ScanStatus::Complete);
    let ports: Vec<u16> = report.results.iter().map(|r| r.port).collect();
    assert_eq!(ports, vec![80, 81, 82, 83]);
    for r in &report.results {
        assert_eq!(r.error.is_some(), r.state == PortState::Error, "port {}", r.port);
    }
    assert!(elapsed < timeout + Duration::from_millis(700), "took {elapsed:?}");
}

#[tokio::test]
async fn unresolvable_host_rejected_before_scanning() {
    let config = ScanConfig::new("no-such-host.invalid", PortRange::single(80).unwrap());
    let err = run_scan(config).await.unwrap_err();
    assert!(matches!(
        err,
        ScanError::Config(ConfigError::UnresolvableHost { .. })
    ));
}

#[tokio::test]
async fn zero_concurrency_rejected_before_scanning() {
    let config = ScanConfig::new("127.0.0.1", PortRange::single(80).unwrap()).with_concurrency(0);
    let err = ScanController::new(config).prepare().await.unwrap_err();
    assert!(matches!(err, ScanError::Config(ConfigError::ZeroConcurrency)));
}
