use dnseye_domain::{HealthScore, Reachability, TraceResult, TraceStatus};

const BONUS_POINTS: u32 = 3;

/// Pure reduction of a trace to a score; identical traces always score the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthScorer;

impl HealthScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, trace: &TraceResult) -> HealthScore {
        if trace.status == TraceStatus::Failed || trace.layers.is_empty() {
            return HealthScore {
                score: 0,
                max_score: 0,
                percentage: 0.0,
                breakdown: vec!["0 points: trace could not get past the root".to_string()],
            };
        }

        let mut score = 0u32;
        let mut breakdown = Vec::new();

        for layer in &trace.layers {
            if layer.status.is_success() {
                score += 1;
                breakdown.push(format!("+1 point: {} resolved ({})", layer.zone, layer.status.as_str()));
            } else {
                breakdown.push(format!("+0 points: {} failed ({})", layer.zone, layer.status.as_str()));
            }
        }

        let unreachable = trace
            .layers
            .iter()
            .flat_map(|layer| &layer.nameservers)
            .filter(|ns| ns.reachability != Reachability::Reachable)
            .count();
        if unreachable == 0 {
            score += 1;
            breakdown.push("+1 point: all nameservers reachable".to_string());
        } else {
            breakdown.push(format!("+0 points: {} nameserver(s) unreachable", unreachable));
        }

        let slow = trace.timing.slow_count;
        if slow == 0 {
            score += 1;
            breakdown.push("+1 point: no slow responses".to_string());
        } else {
            breakdown.push(format!("+0 points: {} slow response(s)", slow));
        }

        let glue_errors = trace.glue_error_count();
        if glue_errors == 0 {
            score += 1;
            breakdown.push("+1 point: no glue record errors".to_string());
        } else {
            breakdown.push(format!("+0 points: {} glue record error(s)", glue_errors));
        }

        let max_score = trace.layers.len() as u32 + BONUS_POINTS;
        let score = score.min(max_score);
        let percentage = (score as f64 / max_score as f64 * 1000.0).round() / 10.0;

        HealthScore {
            score,
            max_score,
            percentage,
            breakdown,
        }
    }
}
