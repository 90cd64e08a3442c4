use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::zone::normalize_host;

pub const DNS_PORT: u16 = 53;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    #[default]
    Unknown,
    Reachable,
    Unreachable,
}

/// A nameserver as seen from one delegation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nameserver {
    /// Lowercase, without the trailing dot.
    pub hostname: String,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub reachability: Reachability,
}

impl Nameserver {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: normalize_host(hostname),
            ipv4: None,
            ipv6: None,
            reachability: Reachability::Unknown,
        }
    }

    pub fn with_ipv4(mut self, addr: Ipv4Addr) -> Self {
        self.ipv4 = Some(addr);
        self
    }

    pub fn with_ipv6(mut self, addr: Ipv6Addr) -> Self {
        self.ipv6 = Some(addr);
        self
    }

    /// Fills the first address of each family from `addrs`, keeping any
    /// address already set.
    pub fn absorb(&mut self, addrs: &[IpAddr]) {
        for addr in addrs {
            match addr {
                IpAddr::V4(v4) if self.ipv4.is_none() => self.ipv4 = Some(*v4),
                IpAddr::V6(v6) if self.ipv6.is_none() => self.ipv6 = Some(*v6),
                _ => {}
            }
        }
    }

    pub fn has_address(&self) -> bool {
        self.ipv4.is_some() || self.ipv6.is_some()
    }

    /// Address to send queries to. IPv4 is preferred; IPv6 is only used when
    /// enabled.
    pub fn query_addr(&self, use_ipv6: bool) -> Option<SocketAddr> {
        if let Some(v4) = self.ipv4 {
            return Some(SocketAddr::new(IpAddr::V4(v4), DNS_PORT));
        }
        match self.ipv6 {
            Some(v6) if use_ipv6 => Some(SocketAddr::new(IpAddr::V6(v6), DNS_PORT)),
            _ => None,
        }
    }
}
