use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use super::errors::ConfigError;

/// Which recursive resolver answers address lookups for nameserver hostnames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResolverSelector {
    /// The operating system's resolver.
    #[default]
    System,
    Server(SocketAddr),
}

impl FromStr for ResolverSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("system") {
            return Ok(Self::System);
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self::Server(addr));
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Server(SocketAddr::new(ip, 53)));
        }
        Err(ConfigError::Validation(format!(
            "Invalid resolver '{}': expected 'system', IP or IP:port",
            s
        )))
    }
}

impl TryFrom<String> for ResolverSelector {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResolverSelector> for String {
    fn from(selector: ResolverSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for ResolverSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Server(addr) if addr.port() == 53 => write!(f, "{}", addr.ip()),
            Self::Server(addr) => write!(f, "{}", addr),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub default_server: ResolverSelector,
}
