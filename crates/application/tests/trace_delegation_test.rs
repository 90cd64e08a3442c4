use dnseye_application::ports::{NsResponse, Rcode};
use dnseye_application::use_cases::TraceRequest;
use dnseye_domain::{
    AnswerKind, Domain, GlueVerdict, LayerStatus, QueryPhase, QueryStatus, Reachability,
    ResolverSelector, Severity, TraceError, TraceStatus,
};
use std::time::Duration;

mod helpers;
use helpers::{standard_internet, trace, tracer, tracer_with, ServerBehavior};

// ── healthy chain ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_example_com_resolves_completely_with_max_score() {
    let net = standard_internet();

    let result = trace(&net, "example.com").await;

    assert_eq!(result.status, TraceStatus::Complete);
    assert!(result.termination.is_none());
    assert_eq!(result.chain_display(), ". → com. → example.com.");
    assert_eq!(result.glue_error_count(), 0);
    assert_eq!(result.health.max_score, 6);
    assert_eq!(result.health.score, 6);
    assert_eq!(result.health.percentage, 100.0);
    assert!(result.layers.iter().all(|l| l.status == LayerStatus::Ok));
}

#[tokio::test]
async fn test_layers_record_referrals_and_final_answer() {
    let net = standard_internet();

    let result = trace(&net, "example.com").await;

    let root = &result.layers[0];
    assert_eq!(root.answer_kind, AnswerKind::Referral);
    assert_eq!(root.delegated_zone.as_ref().unwrap().as_str(), "com.");
    assert_eq!(root.ns_hosts(), vec!["a.gtld-servers.net", "b.gtld-servers.net"]);
    assert_eq!(root.answered_by.len(), 2);

    let apex = result.layers.last().unwrap();
    assert_eq!(apex.answer_kind, AnswerKind::Authoritative);
    assert!(apex.authoritative);
    assert_eq!(apex.nameservers.len(), 3);

    let final_ns: Vec<String> = result.final_nameservers().into_iter().collect();
    assert_eq!(
        final_ns,
        vec!["a.iana-servers.net", "b.iana-servers.net", "c.iana-servers.net"]
    );
}

#[tokio::test]
async fn test_out_of_zone_root_glue_is_informational() {
    let net = standard_internet();

    let result = trace(&net, "example.com").await;

    let info: Vec<_> = result
        .glue_findings
        .iter()
        .filter(|f| f.verdict == GlueVerdict::UnnecessaryPresent)
        .collect();
    assert_eq!(info.len(), 2);
    assert!(info.iter().all(|f| f.severity == Severity::Info && !f.in_zone));
}

#[tokio::test]
async fn test_glue_records_only_kept_when_verbose() {
    let net = standard_internet();
    let domain = Domain::parse("example.com").unwrap();

    let quiet = tracer(&net).execute(TraceRequest::new(domain.clone())).await;
    assert!(quiet.layers.iter().all(|l| l.glue_records.is_empty()));

    let verbose = tracer(&net)
        .execute(TraceRequest {
            verbose: true,
            ..TraceRequest::new(domain)
        })
        .await;
    assert_eq!(verbose.layers[0].glue_records.len(), 2);
}

#[tokio::test]
async fn test_glue_check_can_be_disabled() {
    let net = standard_internet();

    let result = tracer(&net)
        .execute(TraceRequest {
            check_glue: Some(false),
            ..TraceRequest::new(Domain::parse("example.com").unwrap())
        })
        .await;

    assert!(result.glue_findings.is_empty());
    assert_eq!(result.status, TraceStatus::Complete);
}

#[tokio::test]
async fn test_resolver_selector_is_recorded() {
    let net = standard_internet();
    let selector: ResolverSelector = "9.9.9.9".parse().unwrap();

    let result = tracer(&net)
        .execute(TraceRequest {
            resolver: Some(selector),
            ..TraceRequest::new(Domain::parse("example.com").unwrap())
        })
        .await;

    assert_eq!(result.resolver, selector);
}

// ── degraded nameservers ───────────────────────────────────────────────────

#[tokio::test]
async fn test_one_unreachable_of_three_keeps_layer_ok() {
    let net = standard_internet().behavior("198.51.100.3", ServerBehavior::Timeout);

    let result = trace(&net, "example.com").await;

    assert_eq!(result.status, TraceStatus::Complete);
    let apex = result.layers.last().unwrap();
    assert_eq!(apex.status, LayerStatus::Ok);

    let dead = apex
        .outcomes
        .iter()
        .find(|o| o.nameserver == "c.iana-servers.net")
        .unwrap();
    assert_eq!(dead.status, QueryStatus::Timeout);
    assert_eq!(dead.attempts, 2);

    let c = apex
        .nameservers
        .iter()
        .find(|ns| ns.hostname == "c.iana-servers.net")
        .unwrap();
    assert_eq!(c.reachability, Reachability::Unreachable);
    assert_eq!(result.health.score, 5);
}

#[tokio::test]
async fn test_unresolvable_nameserver_is_excluded_not_fatal() {
    let net = standard_internet();

    let result = trace(&net, "test.apathy.ca").await;

    assert_eq!(result.status, TraceStatus::Complete);
    assert_eq!(
        result.chain_display(),
        ". → ca. → apathy.ca. → test.apathy.ca."
    );

    let leaf = result.layers.last().unwrap();
    assert_eq!(leaf.status, LayerStatus::Ok);
    let ns3 = leaf
        .outcomes
        .iter()
        .find(|o| o.nameserver == "ns3.broken.example")
        .unwrap();
    assert_eq!(ns3.phase, QueryPhase::Resolve);
    assert!(matches!(
        ns3.status,
        QueryStatus::Nxdomain | QueryStatus::Timeout
    ));
    assert!(result
        .glue_findings
        .iter()
        .all(|f| f.nameserver != "ns3.broken.example"));
    assert_eq!(result.glue_error_count(), 0);

    let ns3 = leaf
        .nameservers
        .iter()
        .find(|ns| ns.hostname == "ns3.broken.example")
        .unwrap();
    assert_eq!(ns3.reachability, Reachability::Unreachable);
    assert_eq!(result.health.max_score, 7);
    assert_eq!(result.health.score, 6);
    assert!(!result
        .health
        .breakdown
        .iter()
        .any(|line| line.contains("all nameservers reachable")));
}

#[tokio::test]
async fn test_retry_recovers_from_single_servfail() {
    let net = standard_internet()
        .behavior("192.0.2.1", ServerBehavior::FailFirst(1))
        .behavior("192.0.2.2", ServerBehavior::Timeout);

    let result = trace(&net, "example.com").await;

    assert_eq!(result.status, TraceStatus::Complete);
    let a_root = result.layers[0]
        .outcomes
        .iter()
        .find(|o| o.nameserver == "a.root-servers.net")
        .unwrap();
    assert_eq!(a_root.status, QueryStatus::Success);
    assert_eq!(a_root.attempts, 2);
    assert_eq!(net.query_count("192.0.2.1"), 2);
}

#[tokio::test]
async fn test_persistent_servfail_is_reported_verbatim() {
    let net = standard_internet()
        .behavior("192.0.2.11", ServerBehavior::Servfail)
        .behavior("192.0.2.12", ServerBehavior::Servfail);

    let result = trace(&net, "example.com").await;

    assert_eq!(result.status, TraceStatus::Partial);
    assert_eq!(result.layers.len(), 2);
    assert_eq!(result.layers[1].status, LayerStatus::Servfail);
    assert_eq!(result.termination, Some(TraceError::Servfail));
    assert_eq!(net.query_count("192.0.2.11"), 2);
}

// ── terminal states ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_nxdomain_yields_partial_chain() {
    let net = standard_internet();

    let result = trace(&net, "missing.com").await;

    assert_eq!(result.status, TraceStatus::Partial);
    assert_eq!(result.termination, Some(TraceError::Nxdomain));
    assert_eq!(result.layers.len(), 2);
    assert_eq!(result.layers[1].status, LayerStatus::Nxdomain);
    assert_eq!(result.health.score, 4);
    assert_eq!(result.health.max_score, 5);
}

#[tokio::test]
async fn test_unreachable_root_fails_with_zero_score() {
    let net = standard_internet()
        .behavior("192.0.2.1", ServerBehavior::Timeout)
        .behavior("192.0.2.2", ServerBehavior::Timeout);

    let result = trace(&net, "example.com").await;

    assert_eq!(result.status, TraceStatus::Failed);
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.layers[0].status, LayerStatus::Timeout);
    assert_eq!(result.health.score, 0);
    assert_eq!(result.health.max_score, 0);
}

#[tokio::test]
async fn test_refusing_root_fails() {
    let net = standard_internet()
        .behavior("192.0.2.1", ServerBehavior::Refused)
        .behavior("192.0.2.2", ServerBehavior::Refused);

    let result = trace(&net, "example.com").await;

    assert_eq!(result.status, TraceStatus::Failed);
    assert_eq!(result.termination, Some(TraceError::Refused));
}

#[tokio::test]
async fn test_name_inside_zone_completes_without_extra_layer() {
    let net = standard_internet();

    let result = trace(&net, "www.example.com").await;

    assert_eq!(result.status, TraceStatus::Complete);
    assert_eq!(result.layers.len(), 3);
    let last = result.layers.last().unwrap();
    assert_eq!(last.answer_kind, AnswerKind::NoData);
    assert_eq!(last.query_name.as_str(), "www.example.com.");
}

#[tokio::test]
async fn test_non_cut_intermediate_name_is_skipped() {
    let net = standard_internet();

    let result = trace(&net, "a.www.example.com").await;

    assert_eq!(result.status, TraceStatus::Partial);
    assert_eq!(result.layers.len(), 3);
    let last = result.layers.last().unwrap();
    assert_eq!(last.zone.as_str(), "example.com.");
    assert_eq!(last.query_name.as_str(), "a.www.example.com.");
    assert_eq!(last.status, LayerStatus::Nxdomain);
}

#[tokio::test]
async fn test_lame_delegation_stops_descent() {
    let net = standard_internet()
        .nameserver("ns.lame.net", "198.51.100.9")
        .zone("lame.com", &["ns.lame.net"])
        .delegate("com", "lame.com")
        .behavior(
            "198.51.100.9",
            ServerBehavior::Fixed(NsResponse::empty(Rcode::NoError)),
        );

    let result = trace(&net, "lame.com").await;

    assert_eq!(result.status, TraceStatus::Partial);
    assert_eq!(result.layers.len(), 3);
    assert_eq!(result.layers[2].status, LayerStatus::Malformed);
    assert!(matches!(
        result.termination,
        Some(TraceError::MalformedAnswer(_))
    ));
    assert_eq!(net.query_count("198.51.100.9"), 1);
}

// ── deadlines ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_request_deadline_fails_at_root() {
    let net = standard_internet();
    let mut config = net.trace_config();
    config.request_timeout_ms = 0;

    let result = tracer_with(&net, config)
        .execute(TraceRequest::new(Domain::parse("example.com").unwrap()))
        .await;

    assert_eq!(result.status, TraceStatus::Failed);
    assert_eq!(result.termination, Some(TraceError::DeadlineExceeded));
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.layers[0].status, LayerStatus::Timeout);
}

#[tokio::test]
async fn test_request_deadline_mid_trace_keeps_learned_layers() {
    let net = standard_internet()
        .behavior("192.0.2.1", ServerBehavior::Delay(Duration::from_millis(100)))
        .behavior("192.0.2.2", ServerBehavior::Delay(Duration::from_millis(100)))
        .behavior("192.0.2.11", ServerBehavior::Delay(Duration::from_millis(500)))
        .behavior("192.0.2.12", ServerBehavior::Delay(Duration::from_millis(500)));
    let mut config = net.trace_config();
    config.query_timeout_ms = 1_000;
    config.layer_lifetime_ms = 1_000;
    config.request_timeout_ms = 250;

    let result = tracer_with(&net, config)
        .execute(TraceRequest::new(Domain::parse("example.com").unwrap()))
        .await;

    assert_eq!(result.status, TraceStatus::Partial);
    assert_eq!(result.termination, Some(TraceError::DeadlineExceeded));
    assert_eq!(result.layers.len(), 2);
    assert!(result.layers[0].status.is_success());
    assert_eq!(result.layers[1].status, LayerStatus::Timeout);
}

// ── determinism ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rerunning_trace_yields_same_chain() {
    let net = standard_internet();

    let first = trace(&net, "test.apathy.ca").await;
    let second = trace(&net, "test.apathy.ca").await;

    assert_eq!(first.chain(), second.chain());
    let statuses = |r: &dnseye_domain::TraceResult| {
        r.layers.iter().map(|l| l.status).collect::<Vec<_>>()
    };
    assert_eq!(statuses(&first), statuses(&second));
    assert_eq!(first.final_nameservers(), second.final_nameservers());
    assert_eq!(first.health, second.health);
}
