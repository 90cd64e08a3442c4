use crate::errors::TraceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// Lowercases a hostname and drops the trailing root dot.
pub fn normalize_host(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// A point in the delegation hierarchy.
///
/// Always stored lowercase and fully qualified: `"."`, `"com."`,
/// `"example.com."`. Ordering is lexical, not by specificity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(Arc<str>);

impl Zone {
    pub fn root() -> Self {
        Self(Arc::from("."))
    }

    /// Builds a zone from any spelling of a name. Labels are not validated;
    /// use [`Domain::parse`] for user input.
    pub fn new(name: &str) -> Self {
        let bare = normalize_host(name);
        if bare.is_empty() {
            Self::root()
        } else {
            Self(Arc::from(format!("{}.", bare)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        &*self.0 == "."
    }

    /// The name without its trailing dot (empty for the root).
    pub fn bare(&self) -> &str {
        &self.0[..self.0.len() - 1]
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bare().split('.').filter(|label| !label.is_empty())
    }

    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    pub fn parent(&self) -> Option<Zone> {
        if self.is_root() {
            return None;
        }
        match self.bare().split_once('.') {
            Some((_, rest)) => Some(Zone::new(rest)),
            None => Some(Zone::root()),
        }
    }

    /// True when `name` is this zone's apex or any name underneath it.
    pub fn contains(&self, name: &str) -> bool {
        if self.is_root() {
            return true;
        }
        let name = normalize_host(name);
        let apex = self.bare();
        if name == apex {
            return true;
        }
        name.len() > apex.len()
            && name.ends_with(apex)
            && name.as_bytes()[name.len() - apex.len() - 1] == b'.'
    }

    /// True when `self` sits strictly below `ancestor`.
    pub fn is_subzone_of(&self, ancestor: &Zone) -> bool {
        self != ancestor && !self.is_root() && ancestor.contains(self.bare())
    }

    /// The name one label below `self` on the way down to `target`.
    ///
    /// Returns `None` when `target` is not strictly below `self`.
    pub fn child_toward(&self, target: &Zone) -> Option<Zone> {
        if !target.is_subzone_of(self) {
            return None;
        }
        let labels: Vec<&str> = target.labels().collect();
        let start = labels.len() - (self.label_count() + 1);
        Some(Zone::new(&labels[start..].join(".")))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, fully-qualified domain under analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain {
    zone: Zone,
}

impl Domain {
    pub fn parse(input: &str) -> Result<Self, TraceError> {
        let name = normalize_host(input);
        if name.is_empty() {
            return Err(TraceError::InvalidDomainName("domain is empty".to_string()));
        }
        if name.len() > MAX_DOMAIN_LENGTH {
            return Err(TraceError::InvalidDomainName(format!(
                "{} exceeds {} characters",
                name, MAX_DOMAIN_LENGTH
            )));
        }

        let labels: Vec<&str> = name.split('.').collect();
        if labels.len() < 2 {
            return Err(TraceError::InvalidDomainName(format!(
                "{} needs at least two labels",
                name
            )));
        }

        for label in &labels {
            validate_label(&name, label)?;
        }

        let tld = labels[labels.len() - 1];
        let tld_ok = tld.starts_with("xn--")
            || (tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
        if !tld_ok {
            return Err(TraceError::InvalidDomainName(format!(
                "{} has an invalid top-level label '{}'",
                name, tld
            )));
        }

        Ok(Self {
            zone: Zone::new(&name),
        })
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Name without the trailing dot, as users type it.
    pub fn name(&self) -> &str {
        self.zone.bare()
    }
}

fn validate_label(name: &str, label: &str) -> Result<(), TraceError> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return Err(TraceError::InvalidDomainName(format!(
            "{} has a label of invalid length",
            name
        )));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(TraceError::InvalidDomainName(format!(
            "{} has a label starting or ending with '-'",
            name
        )));
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TraceError::InvalidDomainName(format!(
            "{} contains characters outside [a-z0-9-_]",
            name
        )));
    }
    Ok(())
}

impl FromStr for Domain {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Domain {
    type Error = TraceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.name().to_string()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
