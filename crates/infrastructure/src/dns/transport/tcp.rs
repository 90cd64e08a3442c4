//! Length-prefixed stream exchange (RFC 1035 §4.2.2), one connection per
//! query.

use super::{step, Protocol, Reply, WireExchange};
use async_trait::async_trait;
use dnseye_domain::TraceError;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

pub struct TcpTransport {
    server: SocketAddr,
}

impl TcpTransport {
    pub fn new(server: SocketAddr) -> Self {
        Self { server }
    }
}

#[async_trait]
impl WireExchange for TcpTransport {
    async fn exchange(&self, query: &[u8], deadline: Instant) -> Result<Reply, TraceError> {
        let mut stream = step(deadline, self.server, "connect", TcpStream::connect(self.server)).await?;
        let _ = stream.set_nodelay(true);

        step(deadline, self.server, "write", write_frame(&mut stream, query)).await?;
        let bytes = step(deadline, self.server, "read", read_frame(&mut stream)).await?;

        debug!(server = %self.server, len = bytes.len(), "TCP reply");
        Ok(Reply {
            bytes,
            protocol: Protocol::Tcp,
        })
    }
}

/// Writes `message` behind its two-byte big-endian length.
pub async fn write_frame<S>(stream: &mut S, message: &[u8]) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let len = u16::try_from(message.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} bytes do not fit a DNS frame", message.len()),
        )
    })?;
    let mut frame = Vec::with_capacity(message.len() + 2);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(message);
    stream.write_all(&frame).await?;
    stream.flush().await
}

/// Reads one length-prefixed message.
pub async fn read_frame<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let len = stream.read_u16().await? as usize;
    let mut message = vec![0u8; len];
    stream.read_exact(&mut message).await?;
    Ok(message)
}
