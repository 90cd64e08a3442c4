//! DNS Message Builder
//!
//! Constructs query messages in wire format using `hickory-proto`.

use dnseye_domain::{normalize_host, TraceError};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

/// A serialized query and the ID its response must carry.
#[derive(Debug, Clone)]
pub struct WireQuery {
    pub id: u16,
    pub bytes: Vec<u8>,
}

pub struct MessageBuilder;

impl MessageBuilder {
    /// NS question sent straight to an authoritative server.
    ///
    /// RD is cleared: the tracer follows referrals itself and wants the
    /// server's own view, not a recursive answer.
    pub fn ns_query(name: &str) -> Result<WireQuery, TraceError> {
        Self::build(name, RecordType::NS, false)
    }

    /// A or AAAA question for a recursive resolver (RD set).
    pub fn address_query(name: &str, record_type: RecordType) -> Result<WireQuery, TraceError> {
        Self::build(name, record_type, true)
    }

    fn build(
        name: &str,
        record_type: RecordType,
        recursion_desired: bool,
    ) -> Result<WireQuery, TraceError> {
        let mut query = Query::new();
        query.set_name(fqdn(name)?);
        query.set_query_type(record_type);
        query.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);
        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(recursion_desired);
        message.add_query(query);

        Ok(WireQuery {
            id,
            bytes: Self::serialize(&message)?,
        })
    }

    /// Serialize a Message to wire format bytes
    pub fn serialize(message: &Message) -> Result<Vec<u8>, TraceError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            TraceError::InvalidDomainName(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}

/// Absolute name for any spelling of `name`; the empty string and `"."` are
/// the root.
pub fn fqdn(name: &str) -> Result<Name, TraceError> {
    let bare = normalize_host(name);
    let absolute = format!("{}.", bare);
    let absolute = if bare.is_empty() { "." } else { absolute.as_str() };
    Name::from_str(absolute)
        .map_err(|e| TraceError::InvalidDomainName(format!("Invalid name '{}': {}", name, e)))
}
