use dnseye_domain::{
    AnswerKind, DelegationLayer, GlueFinding, GlueVerdict, TraceError, Zone,
};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

use super::nameserver_resolver::NameserverResolver;

/// Checks the glue a delegation hands out against in-zone and out-of-zone
/// rules and against live resolution.
///
/// Policy:
/// - in-zone nameserver without glue: `Missing` (error)
/// - in-zone glue that disagrees with live A or AAAA data: `AddressMismatch` (error)
/// - out-of-zone nameserver with glue: `UnnecessaryPresent` (info), even when
///   the glue is stale; the staleness goes into `detail`
/// - out-of-zone nameserver without glue: no finding
/// - glue present but the hostname does not resolve: no finding
pub struct GlueRecordValidator {
    resolver: Arc<NameserverResolver>,
}

impl GlueRecordValidator {
    pub fn new(resolver: Arc<NameserverResolver>) -> Self {
        Self { resolver }
    }

    /// Findings for one layer, in NS answer order. Layers that do not hand
    /// out a delegation produce none.
    pub async fn validate_layer(&self, layer: &DelegationLayer) -> Vec<GlueFinding> {
        let Some(delegated) = delegated_zone(layer) else {
            return Vec::new();
        };

        let hosts = layer.ns_hosts();
        let lookups = hosts.iter().map(|host| {
            let glue = layer.glue_for(host);
            async move {
                if glue.is_empty() {
                    None
                } else {
                    Some(self.resolver.resolve(host).await)
                }
            }
        });
        let resolutions = join_all(lookups).await;

        hosts
            .iter()
            .zip(resolutions)
            .filter_map(|(host, resolved)| {
                classify(
                    &layer.zone,
                    delegated,
                    host,
                    &layer.glue_for(host),
                    resolved.as_ref(),
                )
            })
            .collect()
    }
}

fn delegated_zone(layer: &DelegationLayer) -> Option<&Zone> {
    if !layer.status.is_success() {
        return None;
    }
    let delegated = layer.delegated_zone.as_ref()?;
    match layer.answer_kind {
        AnswerKind::Referral => Some(delegated),
        AnswerKind::Authoritative if delegated != &layer.zone => Some(delegated),
        _ => None,
    }
}

/// True when the nameserver lives inside the zone it serves.
pub fn is_in_zone(delegated: &Zone, host: &str) -> bool {
    !delegated.is_root() && delegated.contains(host)
}

/// Verdict for one nameserver. `resolved` is `None` when no live lookup was
/// made because there was no glue to compare.
pub fn classify(
    zone: &Zone,
    delegated: &Zone,
    host: &str,
    glue: &[IpAddr],
    resolved: Option<&Result<Vec<IpAddr>, TraceError>>,
) -> Option<GlueFinding> {
    let in_zone = is_in_zone(delegated, host);
    let finding = |verdict: GlueVerdict, resolved_addrs: Vec<IpAddr>, detail: Option<String>| {
        GlueFinding {
            zone: zone.clone(),
            delegated_zone: delegated.clone(),
            nameserver: host.to_string(),
            verdict,
            severity: verdict.severity(),
            in_zone,
            glue_addrs: glue.to_vec(),
            resolved_addrs,
            detail,
        }
    };

    if glue.is_empty() {
        return in_zone.then(|| {
            finding(
                GlueVerdict::Missing,
                Vec::new(),
                Some(format!("{} is inside {} but no glue was supplied", host, delegated)),
            )
        });
    }

    let live = match resolved {
        Some(Ok(addrs)) => addrs.clone(),
        Some(Err(e)) => {
            debug!(nameserver = %host, error = %e, "Skipping glue check for unresolvable nameserver");
            return None;
        }
        None => return None,
    };
    let mismatch = family_mismatch(glue, &live);

    if !in_zone {
        let detail = match mismatch {
            Some(family) => format!(
                "{} is outside {}; its {} glue is also stale",
                host, delegated, family
            ),
            None => format!("{} is outside {}; glue is not needed", host, delegated),
        };
        return Some(finding(GlueVerdict::UnnecessaryPresent, live, Some(detail)));
    }

    match mismatch {
        Some(family) => Some(finding(
            GlueVerdict::AddressMismatch,
            live,
            Some(format!("{} glue does not match live {} records", family, family)),
        )),
        None => Some(finding(GlueVerdict::Consistent, live, None)),
    }
}

/// First address family where glue and live data both exist but disagree.
fn family_mismatch(glue: &[IpAddr], live: &[IpAddr]) -> Option<&'static str> {
    let split = |addrs: &[IpAddr], v4: bool| -> BTreeSet<IpAddr> {
        addrs.iter().copied().filter(|a| a.is_ipv4() == v4).collect()
    };

    for (v4, family) in [(true, "A"), (false, "AAAA")] {
        let glue_set = split(glue, v4);
        let live_set = split(live, v4);
        if !glue_set.is_empty() && !live_set.is_empty() && glue_set != live_set {
            return Some(family);
        }
    }
    None
}
