use dnseye_domain::{
    normalize_host, GlueRecord, Nameserver, QueryOutcome, Reachability, TraceError,
};
use futures::stream::{self, StreamExt};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::ports::AddressLookup;

/// Nameservers for the next layer plus the resolve-phase failures met while
/// addressing them.
#[derive(Debug, Clone, Default)]
pub struct ResolvedNameservers {
    pub nameservers: Vec<Nameserver>,
    pub failures: Vec<QueryOutcome>,
}

/// Turns nameserver hostnames into queryable addresses, glue first.
pub struct NameserverResolver {
    lookup: Arc<dyn AddressLookup>,
    timeout: Duration,
    concurrency: usize,
}

impl NameserverResolver {
    pub fn new(lookup: Arc<dyn AddressLookup>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            lookup,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Live addresses of `host`, sorted and deduplicated.
    pub async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, TraceError> {
        let host = normalize_host(host);
        let mut addrs = self.lookup.lookup(&host, self.timeout).await?;
        addrs.sort();
        addrs.dedup();
        if addrs.is_empty() {
            return Err(TraceError::Nxdomain);
        }
        Ok(addrs)
    }

    /// Addresses every host, preserving order. Glue is trusted when it covers
    /// a family we can query; the rest goes through the live lookup.
    pub async fn resolve_nameservers(
        &self,
        hosts: &[String],
        glue: &[GlueRecord],
        use_ipv6: bool,
    ) -> ResolvedNameservers {
        let results: Vec<(Nameserver, Option<QueryOutcome>)> = stream::iter(hosts.iter())
            .map(|host| self.address_one(host, glue, use_ipv6))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut resolved = ResolvedNameservers::default();
        for (nameserver, failure) in results {
            resolved.nameservers.push(nameserver);
            resolved.failures.extend(failure);
        }
        resolved
    }

    async fn address_one(
        &self,
        host: &str,
        glue: &[GlueRecord],
        use_ipv6: bool,
    ) -> (Nameserver, Option<QueryOutcome>) {
        let mut nameserver = Nameserver::new(host);
        let glue_addrs: Vec<IpAddr> = glue
            .iter()
            .filter(|g| g.host == nameserver.hostname)
            .map(|g| g.addr)
            .collect();
        nameserver.absorb(&glue_addrs);

        if nameserver.query_addr(use_ipv6).is_some() {
            return (nameserver, None);
        }

        match self.resolve(&nameserver.hostname).await {
            Ok(addrs) => {
                nameserver.absorb(&addrs);
                if nameserver.query_addr(use_ipv6).is_some() {
                    (nameserver, None)
                } else {
                    let error = TraceError::Network {
                        server: nameserver.hostname.clone(),
                        reason: "no address in an enabled family".to_string(),
                    };
                    nameserver.reachability = Reachability::Unreachable;
                    let outcome = QueryOutcome::resolve_failure(&nameserver.hostname, &error);
                    (nameserver, Some(outcome))
                }
            }
            Err(e) => {
                debug!(nameserver = %nameserver.hostname, error = %e, "Nameserver address lookup failed");
                nameserver.reachability = Reachability::Unreachable;
                let outcome = QueryOutcome::resolve_failure(&nameserver.hostname, &e);
                (nameserver, Some(outcome))
            }
        }
    }
}
