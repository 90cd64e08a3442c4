use serde::{Deserialize, Serialize};

use crate::zone::Domain;

/// What one nameserver says the domain's NS set is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameserverReferences {
    pub nameserver: String,
    /// Sorted NS hostnames from the answer and authority sections.
    pub references: Vec<String>,
    pub self_reference: bool,
    /// Other probed nameservers this one lists that also list it back.
    pub mutual_references: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceReport {
    pub domain: Domain,
    pub nameservers: Vec<NameserverReferences>,
}
