#![allow(dead_code)]
use dnseye_domain::{
    AnswerKind, DelegationLayer, Domain, GlueFinding, HealthScore, LayerStatus, Nameserver,
    NsRecord, ResolverSelector, TimingSummary, TraceResult, TraceStatus, Zone,
};

pub struct LayerBuilder {
    zone: Zone,
    query_name: Zone,
    nameservers: Vec<Nameserver>,
    ns_hosts: Vec<String>,
    status: LayerStatus,
    response_ms: Option<u64>,
}

impl LayerBuilder {
    pub fn new(zone: &str, query_name: &str) -> Self {
        Self {
            zone: Zone::new(zone),
            query_name: Zone::new(query_name),
            nameservers: Vec::new(),
            ns_hosts: Vec::new(),
            status: LayerStatus::Ok,
            response_ms: Some(20),
        }
    }

    pub fn asked(mut self, hosts: &[&str]) -> Self {
        self.nameservers = hosts.iter().map(|h| Nameserver::new(h)).collect();
        self
    }

    pub fn answer(mut self, hosts: &[&str]) -> Self {
        self.ns_hosts = hosts.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn status(mut self, status: LayerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn response_ms(mut self, ms: u64) -> Self {
        self.response_ms = Some(ms);
        self
    }

    pub fn build(self) -> DelegationLayer {
        let mut layer = DelegationLayer::failed(
            self.zone,
            self.query_name.clone(),
            self.nameservers,
            Vec::new(),
            self.status,
        );
        if self.status.is_success() {
            layer.answer_kind = AnswerKind::Referral;
            layer.delegated_zone = Some(self.query_name.clone());
            layer.response_ms = self.response_ms;
        }
        layer.ns_records = self
            .ns_hosts
            .iter()
            .map(|h| NsRecord::new(self.query_name.as_str(), h))
            .collect();
        layer
    }
}

pub struct TraceResultBuilder {
    domain: Domain,
    status: TraceStatus,
    layers: Vec<DelegationLayer>,
    glue_findings: Vec<GlueFinding>,
}

impl TraceResultBuilder {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: Domain::parse(domain).unwrap(),
            status: TraceStatus::Complete,
            layers: Vec::new(),
            glue_findings: Vec::new(),
        }
    }

    pub fn layer(mut self, layer: DelegationLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn status(mut self, status: TraceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn finding(mut self, finding: GlueFinding) -> Self {
        self.glue_findings.push(finding);
        self
    }

    pub fn build(self) -> TraceResult {
        TraceResult {
            domain: self.domain,
            resolver: ResolverSelector::System,
            status: self.status,
            termination: None,
            layers: self.layers,
            glue_findings: self.glue_findings,
            timing: TimingSummary::default(),
            health: HealthScore::default(),
            elapsed_ms: 0,
            started_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }
}
