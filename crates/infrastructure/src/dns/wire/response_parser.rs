use dnseye_application::ports::{NsResponse, Rcode};
use dnseye_domain::{GlueRecord, NsRecord, TraceError};
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::{RData, Record};
use std::net::IpAddr;
use tracing::debug;

pub struct ResponseParser;

impl ResponseParser {
    /// Decodes a response and checks it answers the query with `expected_id`.
    pub fn decode(bytes: &[u8], expected_id: u16) -> Result<Message, TraceError> {
        let message = Message::from_vec(bytes).map_err(|e| {
            TraceError::MalformedAnswer(format!("Failed to parse DNS response: {}", e))
        })?;

        if message.message_type() != MessageType::Response {
            return Err(TraceError::MalformedAnswer(
                "Received a query instead of a response".to_string(),
            ));
        }
        if message.id() != expected_id {
            return Err(TraceError::MalformedAnswer(format!(
                "Response ID {} does not match query ID {}",
                message.id(),
                expected_id
            )));
        }
        Ok(message)
    }

    /// The NS-relevant view of a response.
    pub fn ns_response(message: &Message) -> NsResponse {
        let answers = ns_records(message.answers());
        let authority = ns_records(message.name_servers());
        let has_soa = message
            .name_servers()
            .iter()
            .any(|r| matches!(r.data(), RData::SOA(_)));

        let additional = message
            .additionals()
            .iter()
            .filter_map(|record| {
                let addr = address_of(record)?;
                Some(GlueRecord::new(&record.name().to_utf8(), addr))
            })
            .collect();

        let response = NsResponse {
            rcode: Self::rcode(message.response_code()),
            authoritative: message.authoritative(),
            truncated: message.truncated(),
            answers,
            authority,
            has_soa,
            additional,
        };

        debug!(
            rcode = ?response.rcode,
            aa = response.authoritative,
            tc = response.truncated,
            answers = response.answers.len(),
            authority = response.authority.len(),
            glue = response.additional.len(),
            "NS response parsed"
        );
        response
    }

    /// A and AAAA data in the answer section.
    pub fn addresses(message: &Message) -> Vec<IpAddr> {
        message.answers().iter().filter_map(address_of).collect()
    }

    pub fn rcode(code: ResponseCode) -> Rcode {
        match code {
            ResponseCode::NoError => Rcode::NoError,
            ResponseCode::NXDomain => Rcode::NxDomain,
            ResponseCode::ServFail => Rcode::ServFail,
            ResponseCode::Refused => Rcode::Refused,
            other => Rcode::Other(u16::from(other)),
        }
    }
}

fn ns_records(records: &[Record]) -> Vec<NsRecord> {
    records
        .iter()
        .filter_map(|record| match record.data() {
            RData::NS(ns) => Some(NsRecord::new(&record.name().to_utf8(), &ns.0.to_utf8())),
            _ => None,
        })
        .collect()
}

fn address_of(record: &Record) -> Option<IpAddr> {
    match record.data() {
        RData::A(a) => Some(IpAddr::V4(a.0)),
        RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
        _ => None,
    }
}
