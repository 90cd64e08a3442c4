use dnseye_domain::{
    NameserverReferences, ReferenceReport, TraceConfig, TraceError, TraceResult, Zone,
};
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::ports::{AddressLookupProvider, NameserverQuery, NsResponse, Rcode};
use crate::services::NameserverResolver;

/// Asks each final-layer nameserver directly for the domain's NS set and
/// reports who references whom.
pub struct ProbeReferencesUseCase {
    query: Arc<dyn NameserverQuery>,
    lookups: Arc<dyn AddressLookupProvider>,
    config: Arc<TraceConfig>,
}

struct Probe {
    nameserver: String,
    result: Result<BTreeSet<String>, TraceError>,
}

impl ProbeReferencesUseCase {
    pub fn new(
        query: Arc<dyn NameserverQuery>,
        lookups: Arc<dyn AddressLookupProvider>,
        config: Arc<TraceConfig>,
    ) -> Self {
        Self {
            query,
            lookups,
            config,
        }
    }

    #[instrument(skip(self, trace), fields(domain = %trace.domain))]
    pub async fn execute(&self, trace: &TraceResult) -> ReferenceReport {
        let resolver = NameserverResolver::new(
            self.lookups.lookup_for(&trace.resolver),
            self.config.query_timeout(),
            self.config.max_concurrent_queries,
        );
        let zone = trace.domain.zone();
        let hosts: Vec<String> = trace.final_nameservers().into_iter().collect();

        let probes: Vec<Probe> = stream::iter(hosts)
            .map(|host| {
                let resolver = &resolver;
                async move {
                    let result = match self.address_of(trace, resolver, &host).await {
                        Ok(addr) => self.probe(addr, zone).await,
                        Err(e) => Err(e),
                    };
                    Probe {
                        nameserver: host,
                        result,
                    }
                }
            })
            .buffered(self.config.max_concurrent_queries.max(1))
            .collect()
            .await;

        let nameservers = probes
            .iter()
            .map(|probe| {
                let references: Vec<String> = match &probe.result {
                    Ok(refs) => refs.iter().cloned().collect(),
                    Err(_) => Vec::new(),
                };
                let mutual_references = probes
                    .iter()
                    .filter(|other| other.nameserver != probe.nameserver)
                    .filter(|other| references.contains(&other.nameserver))
                    .filter(|other| {
                        matches!(&other.result, Ok(refs) if refs.contains(&probe.nameserver))
                    })
                    .map(|other| other.nameserver.clone())
                    .collect();
                NameserverReferences {
                    self_reference: references.contains(&probe.nameserver),
                    nameserver: probe.nameserver.clone(),
                    references,
                    mutual_references,
                    error: probe.result.as_ref().err().map(|e| e.to_string()),
                }
            })
            .collect();

        ReferenceReport {
            domain: trace.domain.clone(),
            nameservers,
        }
    }

    /// Address from the trace when the last layer already knew it, else a
    /// live lookup.
    async fn address_of(
        &self,
        trace: &TraceResult,
        resolver: &NameserverResolver,
        host: &str,
    ) -> Result<SocketAddr, TraceError> {
        let known = trace
            .layers
            .last()
            .and_then(|layer| layer.nameservers.iter().find(|ns| ns.hostname == host))
            .and_then(|ns| ns.query_addr(self.config.use_ipv6));
        if let Some(addr) = known {
            return Ok(addr);
        }

        let resolved = resolver
            .resolve_nameservers(&[host.to_string()], &[], self.config.use_ipv6)
            .await;
        resolved
            .nameservers
            .first()
            .and_then(|ns| ns.query_addr(self.config.use_ipv6))
            .ok_or_else(|| TraceError::Network {
                server: host.to_string(),
                reason: "address lookup failed".to_string(),
            })
    }

    async fn probe(&self, addr: SocketAddr, zone: &Zone) -> Result<BTreeSet<String>, TraceError> {
        let budget = self.config.query_timeout();
        let response = timeout(budget, self.query.query_ns(addr, zone, budget))
            .await
            .map_err(|_| TraceError::Timeout)??;
        debug!(server = %addr, rcode = ?response.rcode, "Reference probe answered");
        rcode_error(&response)?;
        Ok(response
            .answers
            .iter()
            .chain(&response.authority)
            .map(|r| r.host.clone())
            .collect())
    }
}

fn rcode_error(response: &NsResponse) -> Result<(), TraceError> {
    match response.rcode {
        Rcode::NoError => Ok(()),
        Rcode::NxDomain => Err(TraceError::Nxdomain),
        Rcode::ServFail => Err(TraceError::Servfail),
        Rcode::Refused => Err(TraceError::Refused),
        Rcode::Other(code) => Err(TraceError::MalformedAnswer(format!(
            "unexpected response code {}",
            code
        ))),
    }
}
