#![allow(dead_code)]

use dnseye_application::use_cases::{TraceDelegationUseCase, TraceRequest};
use dnseye_domain::{
    AnswerKind, DelegationLayer, Domain, GlueRecord, HealthScore, LayerStatus, Nameserver,
    NsRecord, QueryOutcome, QueryPhase, QueryStatus, Reachability, ResolverSelector,
    TimingSummary, TraceConfig, TraceResult, TraceStatus, Zone,
};
use std::sync::Arc;

use super::fake_internet::FakeInternet;

pub fn tracer(net: &FakeInternet) -> TraceDelegationUseCase {
    tracer_with(net, net.trace_config())
}

pub fn tracer_with(net: &FakeInternet, config: TraceConfig) -> TraceDelegationUseCase {
    TraceDelegationUseCase::new(
        Arc::new(net.clone()),
        Arc::new(net.clone()),
        Arc::new(config),
        ResolverSelector::System,
    )
}

pub async fn trace(net: &FakeInternet, domain: &str) -> TraceResult {
    tracer(net)
        .execute(TraceRequest::new(Domain::parse(domain).unwrap()))
        .await
}

pub fn outcome(host: &str, status: QueryStatus, elapsed_ms: u64) -> QueryOutcome {
    QueryOutcome {
        nameserver: host.to_string(),
        address: None,
        status,
        phase: QueryPhase::Query,
        elapsed_ms,
        attempts: 1,
        slow: false,
        detail: None,
    }
}

/// A successful referral layer from `zone` to `child`, every nameserver
/// answering.
pub fn referral_layer(zone: &str, child: &str, asked: &[&str], answer: &[&str]) -> DelegationLayer {
    let nameservers: Vec<Nameserver> = asked
        .iter()
        .map(|h| {
            let mut ns = Nameserver::new(h);
            ns.reachability = Reachability::Reachable;
            ns
        })
        .collect();
    let outcomes = asked
        .iter()
        .map(|h| outcome(h, QueryStatus::Success, 20))
        .collect();
    let mut layer = DelegationLayer::failed(
        Zone::new(zone),
        Zone::new(child),
        nameservers,
        outcomes,
        LayerStatus::Ok,
    );
    layer.delegated_zone = Some(Zone::new(child));
    layer.answer_kind = AnswerKind::Referral;
    layer.response_ms = Some(20);
    layer.answered_by = asked.iter().map(|h| h.to_string()).collect();
    layer.ns_records = answer.iter().map(|h| NsRecord::new(child, h)).collect();
    layer
}

pub fn with_glue(mut layer: DelegationLayer, glue: &[(&str, &str)]) -> DelegationLayer {
    layer.glue_records = glue
        .iter()
        .map(|(host, ip)| GlueRecord::new(host, ip.parse().unwrap()))
        .collect();
    layer
}

pub fn trace_result(domain: &str, status: TraceStatus, layers: Vec<DelegationLayer>) -> TraceResult {
    TraceResult {
        domain: Domain::parse(domain).unwrap(),
        resolver: ResolverSelector::System,
        status,
        termination: None,
        layers,
        glue_findings: Vec::new(),
        timing: TimingSummary::default(),
        health: HealthScore::default(),
        elapsed_ms: 0,
        started_at: "2026-01-01T00:00:00+00:00".to_string(),
    }
}
