use async_trait::async_trait;
use dnseye_application::ports::{NameserverQuery, NsResponse};
use dnseye_domain::{TraceError, Zone};
use hickory_proto::op::Message;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

use super::transport::{TcpTransport, UdpTransport, WireExchange};
use super::wire::message_builder::WireQuery;
use super::wire::{MessageBuilder, ResponseParser};

/// Sends one query over UDP and repeats it over TCP when the answer comes
/// back truncated. Both legs share `timeout`.
pub async fn exchange(
    server: SocketAddr,
    query: &WireQuery,
    timeout: Duration,
) -> Result<Message, TraceError> {
    let deadline = Instant::now() + timeout;

    let reply = UdpTransport::new(server).exchange(&query.bytes, deadline).await?;
    let message = ResponseParser::decode(&reply.bytes, query.id)?;
    if !message.truncated() {
        return Ok(message);
    }
    if Instant::now() >= deadline {
        return Err(TraceError::Timeout);
    }
    debug!(server = %server, "Truncated UDP response, retrying over TCP");

    let reply = TcpTransport::new(server).exchange(&query.bytes, deadline).await?;
    debug!(server = %server, protocol = reply.protocol.as_str(), "Retried reply received");
    ResponseParser::decode(&reply.bytes, query.id)
}

/// Non-recursive NS queries against authoritative servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HickoryNameserverClient;

impl HickoryNameserverClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NameserverQuery for HickoryNameserverClient {
    #[instrument(level = "debug", skip_all, fields(server = %server, name = %name))]
    async fn query_ns(
        &self,
        server: SocketAddr,
        name: &Zone,
        timeout: Duration,
    ) -> Result<NsResponse, TraceError> {
        let query = MessageBuilder::ns_query(name.as_str())?;
        let message = exchange(server, &query, timeout).await?;
        Ok(ResponseParser::ns_response(&message))
    }
}
