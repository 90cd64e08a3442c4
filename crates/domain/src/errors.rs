use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TraceError {
    #[error("Query timeout")]
    Timeout,

    #[error("Domain not found (NXDOMAIN)")]
    Nxdomain,

    #[error("Server failure (SERVFAIL)")]
    Servfail,

    #[error("Query refused (REFUSED)")]
    Refused,

    #[error("Malformed answer: {0}")]
    MalformedAnswer(String),

    #[error("Missing glue for in-zone nameserver {nameserver}")]
    NoGlue { nameserver: String },

    #[error("Glue for {nameserver} does not match live resolution")]
    GlueMismatch { nameserver: String },

    #[error("All nameservers for zone {zone} failed")]
    LayerUnreachable { zone: String },

    #[error("Network error talking to {server}: {reason}")]
    Network { server: String, reason: String },

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid comparison: {0}")]
    InvalidComparison(String),
}

impl TraceError {
    /// Errors that are worth another attempt against the same nameserver.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Servfail)
    }
}
