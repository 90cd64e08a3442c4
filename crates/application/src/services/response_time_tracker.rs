use dnseye_domain::{DelegationLayer, LayerTiming, QueryOutcome, QueryPhase, TimingSummary};

/// Flags slow responses and aggregates timings measured by the layer
/// executor. It never measures anything itself.
#[derive(Debug, Clone, Copy)]
pub struct ResponseTimeTracker {
    slow_threshold_ms: u64,
}

impl ResponseTimeTracker {
    pub fn new(slow_threshold_ms: u64) -> Self {
        Self { slow_threshold_ms }
    }

    /// Only answers that actually arrived can be slow; timeouts are failures.
    pub fn is_slow(&self, outcome: &QueryOutcome) -> bool {
        outcome.phase == QueryPhase::Query
            && outcome.status.got_response()
            && outcome.elapsed_ms > self.slow_threshold_ms
    }

    pub fn annotate(&self, layer: &mut DelegationLayer) {
        for outcome in &mut layer.outcomes {
            outcome.slow = self.is_slow(outcome);
        }

        let timed: Vec<u64> = timed_outcomes(&layer.outcomes).collect();
        layer.timing = LayerTiming {
            max_ms: timed.iter().copied().max().unwrap_or(0),
            mean_ms: mean(&timed),
            slow_count: layer.outcomes.iter().filter(|o| o.slow).count(),
            query_count: timed.len(),
        };
    }

    pub fn summarize(&self, layers: &[DelegationLayer]) -> TimingSummary {
        let timed: Vec<u64> = layers
            .iter()
            .flat_map(|layer| timed_outcomes(&layer.outcomes))
            .collect();

        TimingSummary {
            max_ms: timed.iter().copied().max().unwrap_or(0),
            mean_ms: mean(&timed),
            slow_count: layers.iter().map(|l| l.timing.slow_count).sum(),
            query_count: timed.len(),
        }
    }
}

fn timed_outcomes(outcomes: &[QueryOutcome]) -> impl Iterator<Item = u64> + '_ {
    outcomes
        .iter()
        .filter(|o| o.phase == QueryPhase::Query && o.status.got_response())
        .map(|o| o.elapsed_ms)
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: u64 = values.iter().sum();
    (total as f64 / values.len() as f64 * 100.0).round() / 100.0
}
