use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::errors::TraceError;
use crate::nameserver::Nameserver;
use crate::zone::{normalize_host, Zone};

/// Outcome of one delegation layer as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    Ok,
    /// A usable answer arrived but the layer deadline cancelled other queries.
    Partial,
    Nxdomain,
    Servfail,
    Timeout,
    Refused,
    /// Unparseable, lame or out-of-bailiwick answers.
    Malformed,
    /// No nameserver had an address, or every query hit a network error.
    Unreachable,
}

impl LayerStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::Partial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Partial => "partial",
            Self::Nxdomain => "nxdomain",
            Self::Servfail => "servfail",
            Self::Timeout => "timeout",
            Self::Refused => "refused",
            Self::Malformed => "malformed",
            Self::Unreachable => "unreachable",
        }
    }

    /// The error a failed layer terminates a trace with.
    pub fn to_error(&self, zone: &Zone) -> Option<TraceError> {
        match self {
            Self::Ok | Self::Partial => None,
            Self::Nxdomain => Some(TraceError::Nxdomain),
            Self::Servfail => Some(TraceError::Servfail),
            Self::Timeout => Some(TraceError::Timeout),
            Self::Refused => Some(TraceError::Refused),
            Self::Malformed => Some(TraceError::MalformedAnswer(format!(
                "no usable answer from the nameservers of {}",
                zone
            ))),
            Self::Unreachable => Some(TraceError::LayerUnreachable {
                zone: zone.to_string(),
            }),
        }
    }
}

/// Outcome of one nameserver at one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Nxdomain,
    Servfail,
    Refused,
    Timeout,
    Malformed,
    Unreachable,
    /// Still outstanding when the layer deadline fired.
    Cancelled,
}

impl QueryStatus {
    pub fn from_error(error: &TraceError) -> Self {
        match error {
            TraceError::Timeout | TraceError::DeadlineExceeded => Self::Timeout,
            TraceError::Nxdomain => Self::Nxdomain,
            TraceError::Servfail => Self::Servfail,
            TraceError::Refused => Self::Refused,
            TraceError::MalformedAnswer(_) => Self::Malformed,
            _ => Self::Unreachable,
        }
    }

    /// True when the nameserver sent something back.
    pub fn got_response(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Nxdomain | Self::Servfail | Self::Refused | Self::Malformed
        )
    }
}

/// Whether an outcome comes from resolving the nameserver's address or from
/// querying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    Resolve,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub nameserver: String,
    pub address: Option<IpAddr>,
    pub status: QueryStatus,
    pub phase: QueryPhase,
    /// Elapsed time of the last attempt.
    pub elapsed_ms: u64,
    pub attempts: u32,
    pub slow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl QueryOutcome {
    pub fn resolve_failure(nameserver: &str, error: &TraceError) -> Self {
        Self {
            nameserver: normalize_host(nameserver),
            address: None,
            status: QueryStatus::from_error(error),
            phase: QueryPhase::Resolve,
            elapsed_ms: 0,
            attempts: 0,
            slow: false,
            detail: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NsRecord {
    /// Owner name of the NS record.
    pub zone: Zone,
    pub host: String,
}

impl NsRecord {
    pub fn new(zone: &str, host: &str) -> Self {
        Self {
            zone: Zone::new(zone),
            host: normalize_host(host),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlueRecord {
    pub host: String,
    pub addr: IpAddr,
}

impl GlueRecord {
    pub fn new(host: &str, addr: IpAddr) -> Self {
        Self {
            host: normalize_host(host),
            addr,
        }
    }
}

/// A responder whose next-hop NS set differs from the winning answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergentAnswer {
    pub nameserver: String,
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Non-authoritative NS set in the authority section.
    Referral,
    /// NS set in the answer section of an authoritative response.
    Authoritative,
    /// Authoritative answer with no NS records.
    NoData,
    /// No usable answer.
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerTiming {
    pub max_ms: u64,
    pub mean_ms: f64,
    pub slow_count: usize,
    pub query_count: usize,
}

/// One zone's resolution step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationLayer {
    /// Zone whose nameservers were asked.
    pub zone: Zone,
    /// Name the NS query was sent for.
    pub query_name: Zone,
    /// Zone the answer hands over to, when it is a delegation.
    pub delegated_zone: Option<Zone>,
    pub nameservers: Vec<Nameserver>,
    /// Nameservers that returned a usable answer, in asked order.
    pub answered_by: Vec<String>,
    pub outcomes: Vec<QueryOutcome>,
    pub status: LayerStatus,
    pub authoritative: bool,
    pub answer_kind: AnswerKind,
    /// Elapsed time of the winning response.
    pub response_ms: Option<u64>,
    pub ns_records: Vec<NsRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glue_records: Vec<GlueRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub divergent_answers: Vec<DivergentAnswer>,
    pub timing: LayerTiming,
}

impl DelegationLayer {
    /// A layer that produced no usable answer.
    pub fn failed(
        zone: Zone,
        query_name: Zone,
        nameservers: Vec<Nameserver>,
        outcomes: Vec<QueryOutcome>,
        status: LayerStatus,
    ) -> Self {
        Self {
            zone,
            query_name,
            delegated_zone: None,
            nameservers,
            answered_by: Vec::new(),
            outcomes,
            status,
            authoritative: false,
            answer_kind: AnswerKind::None,
            response_ms: None,
            ns_records: Vec::new(),
            glue_records: Vec::new(),
            divergent_answers: Vec::new(),
            timing: LayerTiming::default(),
        }
    }

    /// Distinct NS hostnames of the answer, in answer order.
    pub fn ns_hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::with_capacity(self.ns_records.len());
        for record in &self.ns_records {
            if !hosts.contains(&record.host) {
                hosts.push(record.host.clone());
            }
        }
        hosts
    }

    /// Glue addresses supplied for `host` in the additional section.
    pub fn glue_for(&self, host: &str) -> Vec<IpAddr> {
        let host = normalize_host(host);
        self.glue_records
            .iter()
            .filter(|g| g.host == host)
            .map(|g| g.addr)
            .collect()
    }

    pub fn has_slow_responses(&self) -> bool {
        self.outcomes.iter().any(|o| o.slow)
    }
}
