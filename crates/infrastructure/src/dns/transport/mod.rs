pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use dnseye_domain::TraceError;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::time::{timeout_at, Instant};

pub use tcp::TcpTransport;
pub use udp::UdpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

/// Raw reply bytes and the protocol that carried them.
#[derive(Debug)]
pub struct Reply {
    pub bytes: Vec<u8>,
    pub protocol: Protocol,
}

/// One query/reply round trip with a single nameserver, finished by
/// `deadline`.
#[async_trait]
pub trait WireExchange: Send + Sync {
    async fn exchange(&self, query: &[u8], deadline: Instant) -> Result<Reply, TraceError>;
}

/// Runs one socket step against the shared deadline. Expiry is a timeout,
/// an io error is a network error naming the step.
pub(crate) async fn step<T, F>(
    deadline: Instant,
    server: SocketAddr,
    what: &str,
    io_step: F,
) -> Result<T, TraceError>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout_at(deadline, io_step).await {
        Err(_) => Err(TraceError::Timeout),
        Ok(Err(e)) => Err(network_error(server, format!("{}: {}", what, e))),
        Ok(Ok(value)) => Ok(value),
    }
}

pub(crate) fn network_error(server: SocketAddr, reason: impl std::fmt::Display) -> TraceError {
    TraceError::Network {
        server: server.to_string(),
        reason: reason.to_string(),
    }
}
