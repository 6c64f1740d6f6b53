use crate::types::{ProbeError, ProbeResult};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

/// One TCP connect attempt against a single address.
///
/// The socket is owned by the task: a connected stream is dropped right after
/// the handshake, and on timeout the pending connect future is dropped, which
/// closes the half-open socket.
#[derive(Debug, Clone, Copy)]
pub struct ProbeTask {
    addr: SocketAddr,
    timeout: Duration,
}

impl ProbeTask {
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    /// Connects with `tokio::time::timeout` bounding the handshake.
    pub async fn run(self) -> ProbeResult {
        let port = self.addr.port();
        let start = Instant::now();
        let result = match time::timeout(self.timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(stream)) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                drop(stream);
                ProbeResult::open(port, latency_ms)
            }
            Ok(Err(e)) if is_refusal(&e) => {
                ProbeResult::closed(port, start.elapsed().as_millis() as u64)
            }
            Ok(Err(e)) => ProbeResult::failed(
                port,
                ProbeError::Io {
                    message: e.to_string(),
                },
            ),
            Err(_) => ProbeResult::failed(
                port,
                ProbeError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                },
            ),
        };
        tracing::debug!(addr = %self.addr, state = %result.state, "probe finished");
        result
    }
}

fn is_refusal(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
    )
}
