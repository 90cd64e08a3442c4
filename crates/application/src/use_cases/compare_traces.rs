use dnseye_domain::{
    CrossReferenceReport, Domain, ResolverSelector, TraceError, TraceResult, TraceSummary,
};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::trace_delegation::{TraceDelegationUseCase, TraceRequest};
use crate::services::CrossReferenceAnalyzer;

#[derive(Debug, Clone)]
pub struct CompareSubject {
    pub domain: Domain,
    /// Falls back to the tracer's default resolver.
    pub resolver: Option<ResolverSelector>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub summaries: Vec<TraceSummary>,
    pub cross_reference: CrossReferenceReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<TraceResult>,
}

/// Traces several domain/resolver pairs concurrently and cross-references
/// their final nameserver sets.
pub struct CompareTracesUseCase {
    tracer: Arc<TraceDelegationUseCase>,
    analyzer: CrossReferenceAnalyzer,
    max_subjects: usize,
    max_concurrent: usize,
}

impl CompareTracesUseCase {
    pub fn new(
        tracer: Arc<TraceDelegationUseCase>,
        max_subjects: usize,
        max_concurrent: usize,
    ) -> Self {
        Self {
            tracer,
            analyzer: CrossReferenceAnalyzer::new(),
            max_subjects,
            max_concurrent: max_concurrent.max(1),
        }
    }

    #[instrument(skip(self, subjects), fields(subjects = subjects.len()))]
    pub async fn execute(
        &self,
        subjects: Vec<CompareSubject>,
        include_traces: bool,
    ) -> Result<ComparisonReport, TraceError> {
        if subjects.len() < 2 {
            return Err(TraceError::InvalidComparison(format!(
                "need at least 2 subjects, got {}",
                subjects.len()
            )));
        }
        if subjects.len() > self.max_subjects {
            return Err(TraceError::InvalidComparison(format!(
                "at most {} subjects can be compared, got {}",
                self.max_subjects,
                subjects.len()
            )));
        }

        let traces: Vec<TraceResult> = stream::iter(subjects)
            .map(|subject| {
                let request = TraceRequest {
                    resolver: subject.resolver,
                    ..TraceRequest::new(subject.domain)
                };
                self.tracer.execute(request)
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let cross_reference = self.analyzer.analyze(&traces);
        let summaries = traces.iter().map(TraceSummary::from).collect();

        info!(
            subjects = traces.len(),
            consistent = cross_reference.is_consistent(),
            "Comparison finished"
        );

        Ok(ComparisonReport {
            summaries,
            cross_reference,
            traces: if include_traces { traces } else { Vec::new() },
        })
    }
}
