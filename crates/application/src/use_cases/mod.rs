pub mod compare_traces;
pub mod layer_query;
pub mod probe_references;
pub mod trace_delegation;

pub use compare_traces::{CompareSubject, CompareTracesUseCase, ComparisonReport};
pub use layer_query::{LayerAnswer, LayerQuery, LayerQueryExecutor, LayerResponse};
pub use probe_references::ProbeReferencesUseCase;
pub use trace_delegation::{
    classify_step, StepOutcome, TraceDelegationUseCase, TraceRequest, TraceState,
};
