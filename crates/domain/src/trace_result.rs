use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::ResolverSelector;
use crate::delegation_layer::DelegationLayer;
use crate::errors::TraceError;
use crate::glue::GlueFinding;
use crate::health::HealthScore;
use crate::zone::{Domain, Zone};

pub const CHAIN_SEPARATOR: &str = " → ";

/// Terminal state of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    /// Reached an authoritative answer for the domain itself.
    Complete,
    /// Stopped partway; the layers learned so far are kept.
    Partial,
    /// Could not get past the root.
    Failed,
}

impl TraceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    pub max_ms: u64,
    pub mean_ms: f64,
    pub slow_count: usize,
    pub query_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceResult {
    pub domain: Domain,
    pub resolver: ResolverSelector,
    pub status: TraceStatus,
    /// Why descent stopped, for partial and failed traces.
    pub termination: Option<TraceError>,
    /// Ordered root first, most specific last.
    pub layers: Vec<DelegationLayer>,
    pub glue_findings: Vec<GlueFinding>,
    pub timing: TimingSummary,
    pub health: HealthScore,
    pub elapsed_ms: u64,
    /// RFC 3339 start time.
    pub started_at: String,
}

impl TraceResult {
    /// Nameserver set of the deepest layer: its NS answer when it has one,
    /// otherwise the nameservers that were asked.
    pub fn final_nameservers(&self) -> BTreeSet<String> {
        let Some(last) = self.layers.last() else {
            return BTreeSet::new();
        };
        if last.ns_records.is_empty() {
            last.nameservers.iter().map(|ns| ns.hostname.clone()).collect()
        } else {
            last.ns_records.iter().map(|r| r.host.clone()).collect()
        }
    }

    pub fn chain(&self) -> Vec<Zone> {
        self.layers.iter().map(|layer| layer.zone.clone()).collect()
    }

    pub fn chain_display(&self) -> String {
        self.layers
            .iter()
            .map(|layer| layer.zone.as_str())
            .collect::<Vec<_>>()
            .join(CHAIN_SEPARATOR)
    }

    pub fn glue_error_count(&self) -> usize {
        self.glue_findings.iter().filter(|f| f.is_error()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.status == TraceStatus::Complete
    }
}

/// Condensed view of one trace in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub domain: Domain,
    pub resolver: ResolverSelector,
    pub status: TraceStatus,
    pub chain: String,
    /// Sum of each layer's winning response time.
    pub total_response_ms: u64,
    pub slow_responses: usize,
    pub nameserver_count: usize,
    pub health: HealthScore,
}

impl From<&TraceResult> for TraceSummary {
    fn from(trace: &TraceResult) -> Self {
        Self {
            domain: trace.domain.clone(),
            resolver: trace.resolver,
            status: trace.status,
            chain: trace.chain_display(),
            total_response_ms: trace.layers.iter().filter_map(|l| l.response_ms).sum(),
            slow_responses: trace.timing.slow_count,
            nameserver_count: trace.layers.iter().map(|l| l.ns_hosts().len()).sum(),
            health: trace.health.clone(),
        }
    }
}
