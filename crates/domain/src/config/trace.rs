use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::root_hints::{default_root_hints, RootHint};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraceConfig {
    /// Timeout for a single query attempt against one nameserver.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Deadline for all queries of one delegation layer.
    #[serde(default = "default_layer_lifetime_ms")]
    pub layer_lifetime_ms: u64,

    /// Deadline for a whole trace, root to leaf.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,

    /// Extra attempts per nameserver after a timeout or SERVFAIL.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    #[serde(default = "default_max_concurrent_traces")]
    pub max_concurrent_traces: usize,

    #[serde(default = "default_max_compare_subjects")]
    pub max_compare_subjects: usize,

    #[serde(default = "default_true")]
    pub check_glue: bool,

    #[serde(default)]
    pub use_ipv6: bool,

    #[serde(default = "default_root_hints")]
    pub root_hints: Vec<RootHint>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            layer_lifetime_ms: default_layer_lifetime_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            slow_threshold_ms: default_slow_threshold_ms(),
            retries: default_retries(),
            max_concurrent_queries: default_max_concurrent_queries(),
            max_concurrent_traces: default_max_concurrent_traces(),
            max_compare_subjects: default_max_compare_subjects(),
            check_glue: true,
            use_ipv6: false,
            root_hints: default_root_hints(),
        }
    }
}

impl TraceConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn layer_lifetime(&self) -> Duration {
        Duration::from_millis(self.layer_lifetime_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_layer_lifetime_ms() -> u64 {
    4000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_slow_threshold_ms() -> u64 {
    500
}

fn default_retries() -> u32 {
    1
}

fn default_max_concurrent_queries() -> usize {
    8
}

fn default_max_concurrent_traces() -> usize {
    4
}

fn default_max_compare_subjects() -> usize {
    10
}

fn default_true() -> bool {
    true
}
