use crate::error::ConfigError;
use crate::ports::PortRange;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_CONCURRENCY: usize = 1000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Inputs for one scan. The scanner takes ownership once a scan starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub host: String,
    pub range: PortRange,
    pub concurrency: usize,
    pub timeout: Duration,
}

impl ScanConfig {
    pub fn new(host: impl Into<String>, range: PortRange) -> Self {
        Self {
            host: host.into(),
            range,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks everything that does not need the network. Host resolution is
    /// done by the controller. `range` needs no check here: a `PortRange` can
    /// only be built valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::UnresolvableHost {
                host: self.host.clone(),
                reason: "empty host".into(),
            });
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, PortRange::FULL)
    }
}
