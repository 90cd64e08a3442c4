//! Plain datagram exchange (RFC 1035 §4.2.1). A reply with the TC bit set is
//! handed back as-is; the caller decides whether to repeat over TCP.

use super::{network_error, step, Protocol, Reply, WireExchange};
use async_trait::async_trait;
use dnseye_domain::TraceError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Large enough for any EDNS(0) payload we advertise.
const RECV_BUFFER: usize = 4096;

pub struct UdpTransport {
    server: SocketAddr,
}

impl UdpTransport {
    pub fn new(server: SocketAddr) -> Self {
        Self { server }
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    fn local_addr(&self) -> SocketAddr {
        match self.server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        }
    }
}

#[async_trait]
impl WireExchange for UdpTransport {
    async fn exchange(&self, query: &[u8], deadline: Instant) -> Result<Reply, TraceError> {
        let socket = UdpSocket::bind(self.local_addr())
            .await
            .map_err(|e| network_error(self.server, format!("bind: {}", e)))?;

        step(deadline, self.server, "send", socket.send_to(query, self.server)).await?;

        let mut buf = vec![0u8; RECV_BUFFER];
        loop {
            let (len, from) = step(deadline, self.server, "recv", socket.recv_from(&mut buf)).await?;
            if from != self.server {
                warn!(server = %self.server, from = %from, "Ignoring datagram from unexpected source");
                continue;
            }
            buf.truncate(len);
            debug!(server = %self.server, len, "UDP reply");
            return Ok(Reply {
                bytes: buf,
                protocol: Protocol::Udp,
            });
        }
    }
}
