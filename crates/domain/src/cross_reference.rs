use serde::{Deserialize, Serialize};

use crate::config::ResolverSelector;
use crate::delegation_layer::DivergentAnswer;
use crate::trace_result::TraceStatus;
use crate::zone::{Domain, Zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairVerdict {
    Identical,
    Divergent,
}

/// One compared trace, reduced to its final nameserver set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSubject {
    pub domain: Domain,
    pub resolver: ResolverSelector,
    pub status: TraceStatus,
    /// Sorted and deduplicated.
    pub nameservers: Vec<String>,
}

impl ReferenceSubject {
    pub fn label(&self) -> String {
        format!("{} via {}", self.domain, self.resolver)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDivergence {
    /// Index into `CrossReferenceReport::subjects`.
    pub left: usize,
    pub right: usize,
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
    pub symmetric_difference: Vec<String>,
}

/// Responders within one layer of one trace that disagreed on the next hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDivergence {
    pub subject: usize,
    pub zone: Zone,
    pub winning_hosts: Vec<String>,
    pub divergent: Vec<DivergentAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceReport {
    pub subjects: Vec<ReferenceSubject>,
    /// `matrix[i][j]` compares subject `i` with subject `j`.
    pub matrix: Vec<Vec<PairVerdict>>,
    pub divergences: Vec<PairDivergence>,
    pub layer_divergences: Vec<LayerDivergence>,
}

impl CrossReferenceReport {
    pub fn is_consistent(&self) -> bool {
        self.divergences.is_empty()
    }

    pub fn verdict(&self, left: usize, right: usize) -> Option<PairVerdict> {
        self.matrix.get(left).and_then(|row| row.get(right)).copied()
    }
}
