use async_trait::async_trait;
use dnseye_domain::{GlueRecord, NsRecord, TraceError, Zone};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    NxDomain,
    ServFail,
    Refused,
    Other(u16),
}

/// The parts of an NS response the tracer looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsResponse {
    pub rcode: Rcode,
    pub authoritative: bool,
    pub truncated: bool,
    /// NS records from the answer section.
    pub answers: Vec<NsRecord>,
    /// NS records from the authority section.
    pub authority: Vec<NsRecord>,
    /// Whether the authority section carries an SOA.
    pub has_soa: bool,
    /// A/AAAA records from the additional section.
    pub additional: Vec<GlueRecord>,
}

impl NsResponse {
    pub fn empty(rcode: Rcode) -> Self {
        Self {
            rcode,
            authoritative: false,
            truncated: false,
            answers: Vec::new(),
            authority: Vec::new(),
            has_soa: false,
            additional: Vec::new(),
        }
    }

    /// NS set carried by the response: the answer section when present,
    /// else the authority section.
    pub fn ns_records(&self) -> &[NsRecord] {
        if self.answers.is_empty() {
            &self.authority
        } else {
            &self.answers
        }
    }

    pub fn from_answer_section(&self) -> bool {
        !self.answers.is_empty()
    }

    /// A negative answer that still proves the name exists.
    pub fn is_nodata(&self) -> bool {
        self.rcode == Rcode::NoError
            && self.ns_records().is_empty()
            && (self.authoritative || self.has_soa)
    }
}

/// Sends a single non-recursive NS query to one nameserver.
#[async_trait]
pub trait NameserverQuery: Send + Sync {
    async fn query_ns(
        &self,
        server: SocketAddr,
        name: &Zone,
        timeout: Duration,
    ) -> Result<NsResponse, TraceError>;
}
