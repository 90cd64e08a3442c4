use dnseye_application::services::GraphDataBuilder;
use dnseye_application::use_cases::{
    CompareTracesUseCase, ProbeReferencesUseCase, TraceDelegationUseCase,
};
use dnseye_domain::Config;
use dnseye_infrastructure::dns::{HickoryNameserverClient, ResolverRegistry};
use std::sync::Arc;

pub struct UseCases {
    pub trace: Arc<TraceDelegationUseCase>,
    pub compare: Arc<CompareTracesUseCase>,
    pub references: Arc<ProbeReferencesUseCase>,
    pub graph: GraphDataBuilder,
}

impl UseCases {
    pub fn new(config: &Config) -> Self {
        let trace_config = Arc::new(config.trace.clone());
        let client = Arc::new(HickoryNameserverClient::new());
        let registry = Arc::new(ResolverRegistry::new());

        let trace = Arc::new(TraceDelegationUseCase::new(
            client.clone(),
            registry.clone(),
            trace_config.clone(),
            config.resolver.default_server,
        ));

        Self {
            compare: Arc::new(CompareTracesUseCase::new(
                trace.clone(),
                trace_config.max_compare_subjects,
                trace_config.max_concurrent_traces,
            )),
            references: Arc::new(ProbeReferencesUseCase::new(client, registry, trace_config)),
            graph: GraphDataBuilder::new(),
            trace,
        }
    }
}
