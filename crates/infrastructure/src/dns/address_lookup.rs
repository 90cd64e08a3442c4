use async_trait::async_trait;
use dnseye_application::ports::{AddressLookup, Rcode};
use dnseye_domain::{normalize_host, TraceError};
use hickory_proto::rr::RecordType;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

use super::nameserver_client::exchange;
use super::wire::{MessageBuilder, ResponseParser};

/// Resolves through the operating system's configured resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAddressLookup;

impl SystemAddressLookup {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AddressLookup for SystemAddressLookup {
    async fn lookup(&self, host: &str, timeout: Duration) -> Result<Vec<IpAddr>, TraceError> {
        let host = normalize_host(host);
        let resolved = tokio::time::timeout(timeout, tokio::net::lookup_host((host.as_str(), 0)))
            .await
            .map_err(|_| TraceError::Timeout)?;

        let mut addrs: Vec<IpAddr> = match resolved {
            Ok(iter) => iter.map(|sa| sa.ip()).collect(),
            Err(e) => {
                debug!(host = %host, error = %e, "System lookup failed");
                return Err(TraceError::Nxdomain);
            }
        };
        addrs.sort();
        addrs.dedup();

        if addrs.is_empty() {
            return Err(TraceError::Nxdomain);
        }
        Ok(addrs)
    }
}

/// Resolves by asking one specific recursive server for A and AAAA.
#[derive(Debug, Clone, Copy)]
pub struct RecursiveAddressLookup {
    server: SocketAddr,
}

impl RecursiveAddressLookup {
    pub fn new(server: SocketAddr) -> Self {
        Self { server }
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    async fn query(
        &self,
        host: &str,
        record_type: RecordType,
        timeout: Duration,
    ) -> Result<Vec<IpAddr>, TraceError> {
        let query = MessageBuilder::address_query(host, record_type)?;
        let message = exchange(self.server, &query, timeout).await?;

        match ResponseParser::rcode(message.response_code()) {
            Rcode::NoError => Ok(ResponseParser::addresses(&message)),
            Rcode::NxDomain => Err(TraceError::Nxdomain),
            Rcode::ServFail => Err(TraceError::Servfail),
            Rcode::Refused => Err(TraceError::Refused),
            Rcode::Other(code) => Err(TraceError::MalformedAnswer(format!(
                "unexpected response code {}",
                code
            ))),
        }
    }
}

#[async_trait]
impl AddressLookup for RecursiveAddressLookup {
    async fn lookup(&self, host: &str, timeout: Duration) -> Result<Vec<IpAddr>, TraceError> {
        let host = normalize_host(host);
        let (v4, v6) = tokio::join!(
            self.query(&host, RecordType::A, timeout),
            self.query(&host, RecordType::AAAA, timeout),
        );

        let mut addrs = match (v4, v6) {
            (Err(e), Err(_)) => return Err(e),
            (v4, v6) => {
                let mut addrs = v4.unwrap_or_default();
                addrs.extend(v6.unwrap_or_default());
                addrs
            }
        };
        addrs.sort();
        addrs.dedup();

        debug!(host = %host, server = %self.server, found = addrs.len(), "Recursive lookup finished");
        if addrs.is_empty() {
            return Err(TraceError::Nxdomain);
        }
        Ok(addrs)
    }
}
