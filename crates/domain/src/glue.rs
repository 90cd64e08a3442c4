use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::errors::TraceError;
use crate::zone::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlueVerdict {
    /// In-zone nameserver delegated without glue.
    Missing,
    /// Out-of-zone nameserver delegated with glue anyway.
    UnnecessaryPresent,
    Consistent,
    /// In-zone glue disagrees with a live lookup of the hostname.
    AddressMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Info,
    Error,
}

impl GlueVerdict {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Missing | Self::AddressMismatch => Severity::Error,
            Self::UnnecessaryPresent => Severity::Info,
            Self::Consistent => Severity::Ok,
        }
    }
}

/// Verdict for one nameserver within one delegation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlueFinding {
    /// Zone of the layer that handed out the delegation.
    pub zone: Zone,
    /// Zone being delegated.
    pub delegated_zone: Zone,
    pub nameserver: String,
    pub verdict: GlueVerdict,
    pub severity: Severity,
    pub in_zone: bool,
    pub glue_addrs: Vec<IpAddr>,
    pub resolved_addrs: Vec<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl GlueFinding {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn to_error(&self) -> Option<TraceError> {
        match self.verdict {
            GlueVerdict::Missing => Some(TraceError::NoGlue {
                nameserver: self.nameserver.clone(),
            }),
            GlueVerdict::AddressMismatch => Some(TraceError::GlueMismatch {
                nameserver: self.nameserver.clone(),
            }),
            GlueVerdict::UnnecessaryPresent | GlueVerdict::Consistent => None,
        }
    }
}
