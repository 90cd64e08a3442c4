use chrono::Utc;
use dnseye_domain::{
    AnswerKind, DelegationLayer, Domain, GlueFinding, GlueRecord, LayerStatus, Nameserver, QueryOutcome,
    ResolverSelector, TraceConfig, TraceError, TraceResult, TraceStatus, Zone,
};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use super::layer_query::{LayerQuery, LayerQueryExecutor, LayerResponse};
use crate::ports::{AddressLookupProvider, NameserverQuery, NsResponse};
use crate::services::{
    GlueRecordValidator, HealthScorer, NameserverResolver, ResponseTimeTracker,
};

#[derive(Debug, Clone)]
pub struct TraceRequest {
    pub domain: Domain,
    /// Falls back to the configured default resolver.
    pub resolver: Option<ResolverSelector>,
    /// Keep raw additional-section glue on each layer.
    pub verbose: bool,
    /// Falls back to `trace.check_glue`.
    pub check_glue: Option<bool>,
}

impl TraceRequest {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            resolver: None,
            verbose: false,
            check_glue: None,
        }
    }
}

/// Where the descent is.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceState {
    NotStarted,
    Descending(Hop),
    Terminated(TraceStatus),
}

/// The next question to ask: `zone`'s nameservers, about `query_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub zone: Zone,
    pub query_name: Zone,
    pub nameservers: Vec<Nameserver>,
    pub preflight: Vec<QueryOutcome>,
}

/// Everything one trace accumulates on its way down.
struct TraceProgress {
    target: Zone,
    request_deadline: Instant,
    check_glue: bool,
    resolver: Arc<NameserverResolver>,
    validator: GlueRecordValidator,
    layers: Vec<DelegationLayer>,
    glue_findings: Vec<GlueFinding>,
    termination: Option<TraceError>,
}

impl TraceProgress {
    async fn validate_glue(&mut self, layer: &DelegationLayer) {
        if self.check_glue {
            let findings = self.validator.validate_layer(layer).await;
            self.glue_findings.extend(findings);
        }
    }
}

/// What one layer's answer means for the descent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Handed over to `zone`, served by `hosts`.
    Delegated { zone: Zone, hosts: Vec<String> },
    /// The domain itself answered authoritatively.
    Authoritative,
    /// An intermediate name exists but is not a zone cut.
    NotACut,
    Failed(LayerStatus),
}

/// Classifies a finished layer. Pure: no I/O, no clock.
pub fn classify_step(
    zone: &Zone,
    query_name: &Zone,
    target: &Zone,
    response: &LayerResponse,
) -> StepOutcome {
    if !response.status.is_success() {
        return StepOutcome::Failed(response.status);
    }
    let Some(answer) = &response.answer else {
        return StepOutcome::Failed(LayerStatus::Unreachable);
    };
    let ns = &answer.response;

    if ns.is_nodata() {
        return nodata_outcome(query_name, target);
    }

    let Some(owner) = ns.ns_records().first().map(|r| r.zone.clone()) else {
        return StepOutcome::Failed(LayerStatus::Malformed);
    };
    let hosts = owner_hosts(ns, &owner);

    if ns.from_answer_section() {
        if owner != *query_name {
            return StepOutcome::Failed(LayerStatus::Malformed);
        }
        if owner == *zone {
            return if owner == *target {
                StepOutcome::Authoritative
            } else {
                StepOutcome::Failed(LayerStatus::Malformed)
            };
        }
        return StepOutcome::Delegated { zone: owner, hosts };
    }

    // Authority-section NS: a referral, or the zone's own NS set riding
    // along with an authoritative negative answer.
    if owner == *zone && ns.authoritative {
        return nodata_outcome(query_name, target);
    }
    let encloses_target = owner == *target || target.is_subzone_of(&owner);
    if owner.is_subzone_of(zone) && encloses_target {
        StepOutcome::Delegated { zone: owner, hosts }
    } else {
        StepOutcome::Failed(LayerStatus::Malformed)
    }
}

fn nodata_outcome(query_name: &Zone, target: &Zone) -> StepOutcome {
    if query_name == target {
        StepOutcome::Authoritative
    } else {
        StepOutcome::NotACut
    }
}

/// Shape of the winning answer of a successful step.
fn answer_kind(response: &LayerResponse, delegated: bool) -> AnswerKind {
    match &response.answer {
        Some(answer) if answer.response.from_answer_section() => AnswerKind::Authoritative,
        Some(_) if delegated => AnswerKind::Referral,
        Some(_) => AnswerKind::NoData,
        None => AnswerKind::None,
    }
}

fn owner_hosts(response: &NsResponse, owner: &Zone) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for record in response.ns_records().iter().filter(|r| &r.zone == owner) {
        if !hosts.contains(&record.host) {
            hosts.push(record.host.clone());
        }
    }
    hosts
}

/// The name to ask `zone` about next on the way to `target`.
pub fn next_query_name(zone: &Zone, target: &Zone) -> Zone {
    zone.child_toward(target).unwrap_or_else(|| target.clone())
}

/// Terminal state for a failed step at `zone`.
pub fn failure_status(zone: &Zone, status: LayerStatus) -> TraceStatus {
    if zone.is_root() && status != LayerStatus::Nxdomain {
        TraceStatus::Failed
    } else {
        TraceStatus::Partial
    }
}

/// Walks the delegation chain from the root hints down to the domain.
pub struct TraceDelegationUseCase {
    executor: LayerQueryExecutor,
    lookups: Arc<dyn AddressLookupProvider>,
    config: Arc<TraceConfig>,
    default_resolver: ResolverSelector,
    tracker: ResponseTimeTracker,
    scorer: HealthScorer,
}

impl TraceDelegationUseCase {
    pub fn new(
        query: Arc<dyn NameserverQuery>,
        lookups: Arc<dyn AddressLookupProvider>,
        config: Arc<TraceConfig>,
        default_resolver: ResolverSelector,
    ) -> Self {
        Self {
            executor: LayerQueryExecutor::new(query, &config),
            tracker: ResponseTimeTracker::new(config.slow_threshold_ms),
            scorer: HealthScorer::new(),
            lookups,
            config,
            default_resolver,
        }
    }

    pub fn default_resolver(&self) -> ResolverSelector {
        self.default_resolver
    }

    pub fn resolver_for(&self, selector: &ResolverSelector) -> Arc<NameserverResolver> {
        Arc::new(NameserverResolver::new(
            self.lookups.lookup_for(selector),
            self.config.query_timeout(),
            self.config.max_concurrent_queries,
        ))
    }

    #[instrument(skip(self, request), fields(domain = %request.domain))]
    pub async fn execute(&self, request: TraceRequest) -> TraceResult {
        let started = Instant::now();
        let started_at = Utc::now().to_rfc3339();
        let request_deadline = started + self.config.request_timeout();
        let selector = request.resolver.unwrap_or(self.default_resolver);
        let check_glue = request.check_glue.unwrap_or(self.config.check_glue);

        let resolver = self.resolver_for(&selector);
        let mut progress = TraceProgress {
            target: request.domain.zone().clone(),
            request_deadline,
            check_glue,
            validator: GlueRecordValidator::new(Arc::clone(&resolver)),
            resolver,
            layers: Vec::new(),
            glue_findings: Vec::new(),
            termination: None,
        };

        let mut state = TraceState::NotStarted;
        let status = loop {
            state = match state {
                TraceState::NotStarted => TraceState::Descending(self.root_hop(&progress.target)),
                TraceState::Descending(hop) => self.advance(hop, &mut progress).await,
                TraceState::Terminated(status) => break status,
            };
        };

        let TraceProgress {
            mut layers,
            glue_findings,
            termination,
            ..
        } = progress;

        if !request.verbose {
            for layer in &mut layers {
                layer.glue_records.clear();
            }
        }

        let mut result = TraceResult {
            domain: request.domain,
            resolver: selector,
            status,
            termination,
            timing: self.tracker.summarize(&layers),
            layers,
            glue_findings,
            health: Default::default(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            started_at,
        };
        result.health = self.scorer.score(&result);

        info!(
            domain = %result.domain,
            status = result.status.as_str(),
            layers = result.layers.len(),
            score = result.health.score,
            elapsed_ms = result.elapsed_ms,
            "Trace finished"
        );
        result
    }

    /// One transition out of `Descending(hop)`.
    async fn advance(&self, hop: Hop, progress: &mut TraceProgress) -> TraceState {
        if Instant::now() >= progress.request_deadline {
            debug!(zone = %hop.zone, "Request deadline reached before querying layer");
            let status = failure_status(&hop.zone, LayerStatus::Timeout);
            progress.layers.push(DelegationLayer::failed(
                hop.zone,
                hop.query_name,
                hop.nameservers,
                hop.preflight,
                LayerStatus::Timeout,
            ));
            progress.termination = Some(TraceError::DeadlineExceeded);
            return TraceState::Terminated(status);
        }

        let layer_deadline =
            (Instant::now() + self.config.layer_lifetime()).min(progress.request_deadline);
        let response = self
            .executor
            .execute(LayerQuery {
                zone: hop.zone.clone(),
                query_name: hop.query_name.clone(),
                nameservers: hop.nameservers.clone(),
                preflight: hop.preflight.clone(),
                deadline: layer_deadline,
            })
            .await;
        let step = classify_step(&hop.zone, &hop.query_name, &progress.target, &response);
        debug!(zone = %hop.zone, query_name = %hop.query_name, step = ?step, "Layer classified");

        match step {
            StepOutcome::NotACut => TraceState::Descending(Hop {
                query_name: next_query_name(&hop.query_name, &progress.target),
                ..hop
            }),
            StepOutcome::Failed(status) => {
                let layer = self.build_layer(&hop, response, None, status, AnswerKind::None);
                let error = if Instant::now() >= progress.request_deadline {
                    TraceError::DeadlineExceeded
                } else {
                    status.to_error(&hop.zone).unwrap_or(TraceError::LayerUnreachable {
                        zone: hop.zone.to_string(),
                    })
                };
                progress.termination = Some(error);
                progress.layers.push(layer);
                TraceState::Terminated(failure_status(&hop.zone, status))
            }
            StepOutcome::Authoritative => {
                let status = response.status;
                let kind = answer_kind(&response, false);
                let delegated = Some(hop.query_name.clone());
                let layer = self.build_layer(&hop, response, delegated, status, kind);
                progress.validate_glue(&layer).await;
                progress.layers.push(layer);
                TraceState::Terminated(TraceStatus::Complete)
            }
            StepOutcome::Delegated { zone, hosts } => {
                let status = response.status;
                let kind = answer_kind(&response, true);
                let layer = self.build_layer(&hop, response, Some(zone.clone()), status, kind);
                progress.validate_glue(&layer).await;
                let next = self
                    .next_hop(&progress.resolver, &layer, zone, &hosts, &progress.target)
                    .await;
                progress.layers.push(layer);
                TraceState::Descending(next)
            }
        }
    }

    fn root_hop(&self, target: &Zone) -> Hop {
        let root = Zone::root();
        let nameservers = self
            .config
            .root_hints
            .iter()
            .map(|hint| {
                let mut ns = Nameserver::new(&hint.hostname);
                ns.ipv4 = hint.ipv4;
                ns.ipv6 = hint.ipv6;
                ns
            })
            .collect();
        Hop {
            query_name: next_query_name(&root, target),
            zone: root,
            nameservers,
            preflight: Vec::new(),
        }
    }

    fn build_layer(
        &self,
        hop: &Hop,
        response: LayerResponse,
        delegated_zone: Option<Zone>,
        status: LayerStatus,
        answer_kind: AnswerKind,
    ) -> DelegationLayer {
        let mut layer = DelegationLayer::failed(
            hop.zone.clone(),
            hop.query_name.clone(),
            response.nameservers,
            response.outcomes,
            status,
        );
        layer.answered_by = response.answered_by;

        if let Some(answer) = response.answer {
            let ns = &answer.response;
            layer.authoritative = ns.authoritative;
            layer.response_ms = Some(answer.elapsed_ms);
            layer.ns_records = ns.ns_records().to_vec();
            layer.glue_records = ns.additional.clone();
            if status.is_success() {
                layer.divergent_answers = response.divergent;
            }
        }
        layer.delegated_zone = delegated_zone;
        layer.answer_kind = answer_kind;

        self.tracker.annotate(&mut layer);
        layer
    }

    async fn next_hop(
        &self,
        resolver: &NameserverResolver,
        layer: &DelegationLayer,
        zone: Zone,
        hosts: &[String],
        target: &Zone,
    ) -> Hop {
        // Only glue the answering zone is authoritative for is trusted.
        let glue: Vec<GlueRecord> = layer
            .glue_records
            .iter()
            .filter(|g| layer.zone.contains(&g.host))
            .cloned()
            .collect();
        let resolved = resolver
            .resolve_nameservers(hosts, &glue, self.config.use_ipv6)
            .await;

        Hop {
            query_name: next_query_name(&zone, target),
            zone,
            nameservers: resolved.nameservers,
            preflight: resolved.failures,
        }
    }
}
