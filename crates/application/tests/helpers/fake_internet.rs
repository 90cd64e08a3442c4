#![allow(dead_code)]

use async_trait::async_trait;
use dnseye_application::ports::{
    AddressLookup, AddressLookupProvider, NameserverQuery, NsResponse, Rcode,
};
use dnseye_domain::config::RootHint;
use dnseye_domain::{
    normalize_host, GlueRecord, NsRecord, ResolverSelector, TraceConfig, TraceError, Zone,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// How a fake nameserver misbehaves.
#[derive(Debug, Clone)]
pub enum ServerBehavior {
    /// Never answers.
    Timeout,
    Servfail,
    Refused,
    /// Answers normally after a pause.
    Delay(Duration),
    /// SERVFAIL for the first `n` queries, then answers normally.
    FailFirst(usize),
    /// Silent for the first `n` queries, then answers normally.
    HangFirst(usize),
    /// Always returns this response.
    Fixed(NsResponse),
    /// Returns this response after a pause.
    FixedAfter(Duration, NsResponse),
}

#[derive(Debug, Clone)]
struct FakeZone {
    ns_hosts: Vec<String>,
    /// Names inside the zone that exist but are not zone cuts.
    names: Vec<Zone>,
}

#[derive(Debug, Clone)]
struct Delegation {
    child: Zone,
    glue: Vec<GlueRecord>,
}

#[derive(Default)]
struct World {
    zones: HashMap<Zone, FakeZone>,
    /// Cuts keyed by the parent zone.
    delegations: HashMap<Zone, Vec<Delegation>>,
    /// Where each nameserver host actually listens.
    locations: HashMap<String, Vec<IpAddr>>,
    /// What a recursive resolver returns for a host.
    live: HashMap<String, Vec<IpAddr>>,
    behaviors: HashMap<IpAddr, ServerBehavior>,
    query_counts: HashMap<IpAddr, usize>,
    lookups: Vec<String>,
}

/// A deterministic, in-memory DNS hierarchy. Implements both the NS query
/// port and the address lookup port.
#[derive(Clone, Default)]
pub struct FakeInternet {
    world: Arc<RwLock<World>>,
}

impl FakeInternet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers where a nameserver listens; the live view follows unless
    /// overridden.
    pub fn nameserver(self, host: &str, ip: &str) -> Self {
        {
            let mut world = self.world.write().unwrap();
            let host = normalize_host(host);
            let ip: IpAddr = ip.parse().unwrap();
            world.locations.entry(host.clone()).or_default().push(ip);
            world.live.entry(host).or_default().push(ip);
        }
        self
    }

    /// Makes `zone` served by `hosts`.
    pub fn zone(self, zone: &str, hosts: &[&str]) -> Self {
        self.world.write().unwrap().zones.insert(
            Zone::new(zone),
            FakeZone {
                ns_hosts: hosts.iter().map(|h| normalize_host(h)).collect(),
                names: Vec::new(),
            },
        );
        self
    }

    /// An existing name inside `zone` that is not a cut.
    pub fn name(self, zone: &str, name: &str) -> Self {
        {
            let mut world = self.world.write().unwrap();
            if let Some(z) = world.zones.get_mut(&Zone::new(zone)) {
                z.names.push(Zone::new(name));
            }
        }
        self
    }

    /// Delegates `child` from `parent`, with glue for nameservers inside
    /// `child`.
    pub fn delegate(self, parent: &str, child: &str) -> Self {
        {
            let mut world = self.world.write().unwrap();
            let child = Zone::new(child);
            let hosts = world
                .zones
                .get(&child)
                .map(|z| z.ns_hosts.clone())
                .unwrap_or_default();
            let glue = hosts
                .iter()
                .filter(|h| child.contains(h))
                .flat_map(|h| {
                    world
                        .locations
                        .get(h)
                        .cloned()
                        .unwrap_or_default()
                        .into_iter()
                        .map(move |ip| GlueRecord::new(h, ip))
                })
                .collect();
            world
                .delegations
                .entry(Zone::new(parent))
                .or_default()
                .push(Delegation { child, glue });
        }
        self
    }

    /// Adds a glue record to an existing delegation of `child`.
    pub fn glue(self, child: &str, host: &str, ip: &str) -> Self {
        self.edit_delegation(child, |d| d.glue.push(GlueRecord::new(host, ip.parse().unwrap())));
        self
    }

    /// Removes all glue for `host` from the delegation of `child`.
    pub fn drop_glue(self, child: &str, host: &str) -> Self {
        let host = normalize_host(host);
        self.edit_delegation(child, |d| d.glue.retain(|g| g.host != host));
        self
    }

    fn edit_delegation(&self, child: &str, edit: impl Fn(&mut Delegation)) {
        let child = Zone::new(child);
        let mut world = self.world.write().unwrap();
        for delegations in world.delegations.values_mut() {
            for d in delegations.iter_mut().filter(|d| d.child == child) {
                edit(d);
            }
        }
    }

    /// Live resolution of `host` returns `ips` instead of where it listens.
    pub fn live_override(self, host: &str, ips: &[&str]) -> Self {
        self.world.write().unwrap().live.insert(
            normalize_host(host),
            ips.iter().map(|ip| ip.parse().unwrap()).collect(),
        );
        self
    }

    /// Live resolution of `host` fails with NXDOMAIN.
    pub fn unresolvable(self, host: &str) -> Self {
        self.world.write().unwrap().live.remove(&normalize_host(host));
        self
    }

    pub fn behavior(self, ip: &str, behavior: ServerBehavior) -> Self {
        self.set_behavior(ip, behavior);
        self
    }

    pub fn set_behavior(&self, ip: &str, behavior: ServerBehavior) {
        self.world
            .write()
            .unwrap()
            .behaviors
            .insert(ip.parse().unwrap(), behavior);
    }

    pub fn query_count(&self, ip: &str) -> usize {
        let ip: IpAddr = ip.parse().unwrap();
        self.world
            .read()
            .unwrap()
            .query_counts
            .get(&ip)
            .copied()
            .unwrap_or(0)
    }

    pub fn lookups(&self) -> Vec<String> {
        self.world.read().unwrap().lookups.clone()
    }

    /// Root hints pointing at the fake root zone's nameservers.
    pub fn root_hints(&self) -> Vec<RootHint> {
        let world = self.world.read().unwrap();
        let Some(root) = world.zones.get(&Zone::root()) else {
            return Vec::new();
        };
        root.ns_hosts
            .iter()
            .map(|host| {
                let addrs = world.locations.get(host).cloned().unwrap_or_default();
                RootHint {
                    hostname: host.clone(),
                    ipv4: addrs.iter().find_map(|a| match a {
                        IpAddr::V4(v4) => Some(*v4),
                        IpAddr::V6(_) => None,
                    }),
                    ipv6: None,
                }
            })
            .collect()
    }

    /// Trace settings with short timeouts, rooted in this hierarchy.
    pub fn trace_config(&self) -> TraceConfig {
        TraceConfig {
            query_timeout_ms: 100,
            layer_lifetime_ms: 400,
            request_timeout_ms: 5_000,
            slow_threshold_ms: 500,
            retries: 1,
            root_hints: self.root_hints(),
            ..TraceConfig::default()
        }
    }

    /// Answer `ip` would give for an NS query about `name`, as an
    /// authoritative server.
    fn answer(&self, ip: IpAddr, name: &Zone) -> NsResponse {
        let world = self.world.read().unwrap();

        let served: Vec<&Zone> = world
            .zones
            .iter()
            .filter(|(_, z)| {
                z.ns_hosts.iter().any(|h| {
                    world
                        .locations
                        .get(h)
                        .is_some_and(|addrs| addrs.contains(&ip))
                })
            })
            .map(|(zone, _)| zone)
            .filter(|zone| zone.contains(name.bare()))
            .collect();

        let Some(zone) = served.into_iter().max_by_key(|z| z.label_count()) else {
            return NsResponse::empty(Rcode::Refused);
        };
        let data = &world.zones[zone];

        let cut = world.delegations.get(zone).and_then(|cuts| {
            cuts.iter()
                .filter(|d| &d.child == name || name.is_subzone_of(&d.child))
                .max_by_key(|d| d.child.label_count())
        });

        if let Some(delegation) = cut {
            let hosts = world
                .zones
                .get(&delegation.child)
                .map(|z| z.ns_hosts.clone())
                .unwrap_or_default();
            let mut response = NsResponse::empty(Rcode::NoError);
            response.authority = hosts
                .iter()
                .map(|h| NsRecord::new(delegation.child.as_str(), h))
                .collect();
            response.additional = delegation.glue.clone();
            return response;
        }

        let mut response = NsResponse::empty(Rcode::NoError);
        response.authoritative = true;
        if name == zone {
            response.answers = data
                .ns_hosts
                .iter()
                .map(|h| NsRecord::new(zone.as_str(), h))
                .collect();
        } else if data
            .names
            .iter()
            .any(|n| n == name || n.is_subzone_of(name))
        {
            response.has_soa = true;
        } else {
            response.rcode = Rcode::NxDomain;
            response.has_soa = true;
        }
        response
    }
}

#[async_trait]
impl NameserverQuery for FakeInternet {
    async fn query_ns(
        &self,
        server: SocketAddr,
        name: &Zone,
        _timeout: Duration,
    ) -> Result<NsResponse, TraceError> {
        let ip = server.ip();
        let (behavior, count) = {
            let mut world = self.world.write().unwrap();
            let count = world.query_counts.entry(ip).or_insert(0);
            *count += 1;
            let count = *count;
            (world.behaviors.get(&ip).cloned(), count)
        };

        match behavior {
            Some(ServerBehavior::Timeout) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TraceError::Timeout)
            }
            Some(ServerBehavior::Servfail) => Ok(NsResponse::empty(Rcode::ServFail)),
            Some(ServerBehavior::Refused) => Ok(NsResponse::empty(Rcode::Refused)),
            Some(ServerBehavior::FailFirst(n)) if count <= n => {
                Ok(NsResponse::empty(Rcode::ServFail))
            }
            Some(ServerBehavior::HangFirst(n)) if count <= n => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TraceError::Timeout)
            }
            Some(ServerBehavior::Fixed(response)) => Ok(response),
            Some(ServerBehavior::FixedAfter(pause, response)) => {
                tokio::time::sleep(pause).await;
                Ok(response)
            }
            Some(ServerBehavior::Delay(pause)) => {
                tokio::time::sleep(pause).await;
                Ok(self.answer(ip, name))
            }
            _ => Ok(self.answer(ip, name)),
        }
    }
}

#[async_trait]
impl AddressLookup for FakeInternet {
    async fn lookup(&self, host: &str, _timeout: Duration) -> Result<Vec<IpAddr>, TraceError> {
        let mut world = self.world.write().unwrap();
        let host = normalize_host(host);
        world.lookups.push(host.clone());
        world.live.get(&host).cloned().ok_or(TraceError::Nxdomain)
    }
}

impl AddressLookupProvider for FakeInternet {
    fn lookup_for(&self, _selector: &ResolverSelector) -> Arc<dyn AddressLookup> {
        Arc::new(self.clone())
    }
}

/// A small hierarchy modelled on the public one:
///
/// - `.` on a/b.root-servers.net
/// - `net.` and `com.` on a/b.gtld-servers.net (glue for both, out-of-zone for `com.`)
/// - `example.com.` and `example.net.` on a/b/c.iana-servers.net, no glue
/// - `ca.` on a.ca-servers.ca with glue
/// - `apathy.ca.` on ns1/ns2.apathy.ca with glue
/// - `test.apathy.ca.` on ns1/ns2.apathy.ca and ns3.broken.example, which
///   does not resolve
pub fn standard_internet() -> FakeInternet {
    FakeInternet::new()
        .nameserver("a.root-servers.net", "192.0.2.1")
        .nameserver("b.root-servers.net", "192.0.2.2")
        .nameserver("a.gtld-servers.net", "192.0.2.11")
        .nameserver("b.gtld-servers.net", "192.0.2.12")
        .nameserver("a.iana-servers.net", "198.51.100.1")
        .nameserver("b.iana-servers.net", "198.51.100.2")
        .nameserver("c.iana-servers.net", "198.51.100.3")
        .nameserver("a.ca-servers.ca", "192.0.2.21")
        .nameserver("ns1.apathy.ca", "203.0.113.1")
        .nameserver("ns2.apathy.ca", "203.0.113.2")
        .nameserver("ns3.broken.example", "203.0.113.99")
        .unresolvable("ns3.broken.example")
        .zone(".", &["a.root-servers.net", "b.root-servers.net"])
        .zone("net", &["a.gtld-servers.net", "b.gtld-servers.net"])
        .zone("com", &["a.gtld-servers.net", "b.gtld-servers.net"])
        .zone(
            "example.com",
            &["a.iana-servers.net", "b.iana-servers.net", "c.iana-servers.net"],
        )
        .name("example.com", "www.example.com")
        .zone(
            "example.net",
            &["a.iana-servers.net", "b.iana-servers.net"],
        )
        .zone("ca", &["a.ca-servers.ca"])
        .zone("apathy.ca", &["ns1.apathy.ca", "ns2.apathy.ca"])
        .zone(
            "test.apathy.ca",
            &["ns1.apathy.ca", "ns2.apathy.ca", "ns3.broken.example"],
        )
        .delegate(".", "net")
        .delegate(".", "com")
        .glue("com", "a.gtld-servers.net", "192.0.2.11")
        .glue("com", "b.gtld-servers.net", "192.0.2.12")
        .delegate("com", "example.com")
        .delegate("net", "example.net")
        .delegate(".", "ca")
        .delegate("ca", "apathy.ca")
        .delegate("apathy.ca", "test.apathy.ca")
}
