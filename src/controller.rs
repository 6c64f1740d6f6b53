use crate::collector::ResultCollector;
use crate::config::ScanConfig;
use crate::error::{ConfigError, ScanError};
use crate::scanner::Scanner;
use crate::types::ScanReport;
use std::net::IpAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Validate `config`, resolve its host and scan it to completion.
pub async fn run_scan(config: ScanConfig) -> Result<ScanReport, ScanError> {
    ScanController::new(config).run(CancellationToken::new()).await
}

/// Variant that accepts a `CancellationToken` to allow external cancellation.
pub async fn run_scan_with_cancel(
    config: ScanConfig,
    cancel: CancellationToken,
) -> Result<ScanReport, ScanError> {
    ScanController::new(config).run(cancel).await
}

/// Top-level entry point: configuration checks, then one scan.
#[derive(Debug, Clone)]
pub struct ScanController {
    config: ScanConfig,
}

impl ScanController {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Validates and resolves without sending a single probe.
    pub async fn prepare(&self) -> Result<Scanner, ScanError> {
        self.config.validate()?;
        let address = resolve_host(&self.config.host).await?;
        Ok(Scanner::new(
            self.config.clone(),
            address,
            Arc::new(ResultCollector::new(self.config.range.len())),
        ))
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<ScanReport, ScanError> {
        let scanner = self.prepare().await?;
        scanner.scan(cancel).await
    }
}

/// Resolves `host` to a single address, preferring IPv4.
pub async fn resolve_host(host: &str) -> Result<IpAddr, ConfigError> {
    let host = host.trim();
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    let unresolvable = |reason: String| ConfigError::UnresolvableHost {
        host: host.to_string(),
        reason,
    };
    let addrs: Vec<IpAddr> = tokio::net::lookup_host((host, 0u16))
        .await
        .map_err(|e| unresolvable(e.to_string()))?
        .map(|sa| sa.ip())
        .collect();
    let chosen = addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| unresolvable("no addresses returned".into()))?;
    tracing::debug!(host, address = %chosen, "resolved host");
    Ok(chosen)
}
