use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    /// One line per point awarded or withheld.
    pub breakdown: Vec<String>,
}

impl HealthScore {
    pub fn is_perfect(&self) -> bool {
        self.max_score > 0 && self.score == self.max_score
    }
}
