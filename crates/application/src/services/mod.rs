pub mod cross_reference_analyzer;
pub mod glue_validator;
pub mod graph_builder;
pub mod health_scorer;
pub mod nameserver_resolver;
pub mod response_time_tracker;

pub use cross_reference_analyzer::CrossReferenceAnalyzer;
pub use glue_validator::GlueRecordValidator;
pub use graph_builder::GraphDataBuilder;
pub use health_scorer::HealthScorer;
pub use nameserver_resolver::{NameserverResolver, ResolvedNameservers};
pub use response_time_tracker::ResponseTimeTracker;
