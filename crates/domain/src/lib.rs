//! DNS By Eye Domain Layer
pub mod config;
pub mod cross_reference;
pub mod delegation_layer;
pub mod errors;
pub mod glue;
pub mod graph;
pub mod health;
pub mod nameserver;
pub mod references;
pub mod trace_result;
pub mod zone;

pub use config::{Config, ResolverSelector, TraceConfig};
pub use cross_reference::{
    CrossReferenceReport, LayerDivergence, PairDivergence, PairVerdict, ReferenceSubject,
};
pub use delegation_layer::{
    AnswerKind, DelegationLayer, DivergentAnswer, GlueRecord, LayerStatus, LayerTiming, NsRecord,
    QueryOutcome, QueryPhase, QueryStatus,
};
pub use errors::TraceError;
pub use glue::{GlueFinding, GlueVerdict, Severity};
pub use graph::{EdgeKind, GraphData, GraphEdge, GraphNode, NodeKind, NodeStatus};
pub use health::HealthScore;
pub use nameserver::{Nameserver, Reachability, DNS_PORT};
pub use references::{NameserverReferences, ReferenceReport};
pub use trace_result::{TimingSummary, TraceResult, TraceStatus, TraceSummary};
pub use zone::{normalize_host, Domain, Zone};
