use dnseye_domain::{
    CrossReferenceReport, LayerDivergence, PairDivergence, PairVerdict, ReferenceSubject,
    TraceResult,
};
use std::collections::BTreeSet;

/// Compares the final nameserver sets of several traces.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossReferenceAnalyzer;

impl CrossReferenceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, traces: &[TraceResult]) -> CrossReferenceReport {
        let sets: Vec<BTreeSet<String>> = traces.iter().map(|t| t.final_nameservers()).collect();

        let subjects = traces
            .iter()
            .zip(&sets)
            .map(|(trace, set)| ReferenceSubject {
                domain: trace.domain.clone(),
                resolver: trace.resolver,
                status: trace.status,
                nameservers: set.iter().cloned().collect(),
            })
            .collect();

        let mut matrix = vec![vec![PairVerdict::Identical; sets.len()]; sets.len()];
        let mut divergences = Vec::new();

        for left in 0..sets.len() {
            for right in (left + 1)..sets.len() {
                if sets[left] == sets[right] {
                    continue;
                }
                matrix[left][right] = PairVerdict::Divergent;
                matrix[right][left] = PairVerdict::Divergent;

                let only_in_left: Vec<String> =
                    sets[left].difference(&sets[right]).cloned().collect();
                let only_in_right: Vec<String> =
                    sets[right].difference(&sets[left]).cloned().collect();
                let symmetric_difference = sets[left]
                    .symmetric_difference(&sets[right])
                    .cloned()
                    .collect();

                divergences.push(PairDivergence {
                    left,
                    right,
                    only_in_left,
                    only_in_right,
                    symmetric_difference,
                });
            }
        }

        let layer_divergences = traces
            .iter()
            .enumerate()
            .flat_map(|(subject, trace)| {
                trace
                    .layers
                    .iter()
                    .filter(|layer| !layer.divergent_answers.is_empty())
                    .map(move |layer| {
                        let mut winning_hosts = layer.ns_hosts();
                        winning_hosts.sort();
                        LayerDivergence {
                            subject,
                            zone: layer.zone.clone(),
                            winning_hosts,
                            divergent: layer.divergent_answers.clone(),
                        }
                    })
            })
            .collect();

        CrossReferenceReport {
            subjects,
            matrix,
            divergences,
            layer_divergences,
        }
    }
}
