use thiserror::Error;

/// Configuration problems. Any of these stops a scan before the first probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid port value: {0}")]
    InvalidPort(String),

    #[error("invalid port range {start}-{end}")]
    InvalidRange { start: u32, end: u32 },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("cannot resolve host {host}: {reason}")]
    UnresolvableHost { host: String, reason: String },
}

/// Failures that halt a whole scan. Per-port failures never end up here;
/// they are recorded on the port's `ProbeResult` instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("port {port} was recorded twice")]
    CollectorConflict { port: u16 },

    #[error("scan finished with {recorded} of {expected} ports recorded")]
    MissingResults { expected: usize, recorded: usize },

    #[error("result collector is already finalized")]
    CollectorFinalized,

    #[error("dispatch semaphore closed")]
    Dispatch(#[from] tokio::sync::AcquireError),

    #[error("probe task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ScanError {
    /// True for errors caused by user input rather than the scan itself.
    pub fn is_config(&self) -> bool {
        matches!(self, ScanError::Config(_))
    }
}
