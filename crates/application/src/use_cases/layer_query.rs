use dnseye_domain::{
    DivergentAnswer, LayerStatus, Nameserver, QueryOutcome, QueryPhase, QueryStatus,
    Reachability, TraceConfig, TraceError, Zone,
};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, instrument, warn};

use crate::ports::{NameserverQuery, NsResponse, Rcode};

/// Slack after the layer deadline before stragglers are written off.
const CANCEL_GRACE: Duration = Duration::from_millis(50);

/// A retry runs only while at least 1/n of a query timeout is left.
const RETRY_FLOOR_DIVISOR: u32 = 4;

/// One layer's worth of work: ask every nameserver of `zone` for the NS set
/// of `query_name`.
#[derive(Debug, Clone)]
pub struct LayerQuery {
    pub zone: Zone,
    pub query_name: Zone,
    pub nameservers: Vec<Nameserver>,
    /// Resolve-phase failures for nameservers that have no address.
    pub preflight: Vec<QueryOutcome>,
    pub deadline: Instant,
}

/// The response that won the layer.
#[derive(Debug, Clone)]
pub struct LayerAnswer {
    pub nameserver: String,
    pub response: NsResponse,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
pub struct LayerResponse {
    pub status: LayerStatus,
    /// Asked nameservers with reachability filled in.
    pub nameservers: Vec<Nameserver>,
    /// One outcome per asked nameserver, in asked order.
    pub outcomes: Vec<QueryOutcome>,
    pub answer: Option<LayerAnswer>,
    pub answered_by: Vec<String>,
    pub divergent: Vec<DivergentAnswer>,
}

/// Fans NS queries out over one layer's nameservers with bounded concurrency,
/// per-query timeouts, bounded retries and a layer deadline.
pub struct LayerQueryExecutor {
    query: Arc<dyn NameserverQuery>,
    query_timeout: Duration,
    retries: u32,
    max_concurrent: usize,
    use_ipv6: bool,
}

#[derive(Debug, Clone, Copy)]
struct AttemptPlan {
    query_timeout: Duration,
    retries: u32,
    deadline: Instant,
}

#[derive(Debug)]
struct Attempt {
    address: SocketAddr,
    status: QueryStatus,
    response: Option<NsResponse>,
    elapsed_ms: u64,
    attempts: u32,
    detail: Option<String>,
}

impl LayerQueryExecutor {
    pub fn new(query: Arc<dyn NameserverQuery>, config: &TraceConfig) -> Self {
        Self {
            query,
            query_timeout: config.query_timeout(),
            retries: config.retries,
            max_concurrent: config.max_concurrent_queries.max(1),
            use_ipv6: config.use_ipv6,
        }
    }

    #[instrument(skip(self, request), fields(zone = %request.zone, query_name = %request.query_name))]
    pub async fn execute(&self, request: LayerQuery) -> LayerResponse {
        let LayerQuery {
            zone,
            query_name,
            mut nameservers,
            preflight,
            deadline,
        } = request;

        let plan = AttemptPlan {
            query_timeout: self.query_timeout,
            retries: self.retries,
            deadline,
        };
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut slots: Vec<Option<QueryOutcome>> = vec![None; nameservers.len()];
        let mut abort_handles = Vec::with_capacity(nameservers.len());
        let mut futs = FuturesUnordered::new();

        for (index, ns) in nameservers.iter().enumerate() {
            let Some(address) = ns.query_addr(self.use_ipv6) else {
                slots[index] = Some(missing_address_outcome(ns, &preflight));
                continue;
            };

            let query = Arc::clone(&self.query);
            let semaphore = Arc::clone(&semaphore);
            let name = query_name.clone();
            let handle = tokio::spawn(async move {
                let attempt = query_with_retries(query, semaphore, address, name, plan).await;
                (index, attempt)
            });
            abort_handles.push(handle.abort_handle());
            futs.push(handle);
        }

        debug!(
            nameservers = nameservers.len(),
            in_flight = futs.len(),
            "Querying layer"
        );

        // Completion order decides the winner on ties.
        let mut arrivals: Vec<(usize, NsResponse, u64)> = Vec::new();
        let collected = timeout_at(deadline + CANCEL_GRACE, async {
            while let Some(joined) = futs.next().await {
                match joined {
                    Ok((index, attempt)) => {
                        let ns = &nameservers[index];
                        if let Some(response) = attempt.response.clone() {
                            arrivals.push((index, response, attempt.elapsed_ms));
                        }
                        slots[index] = Some(QueryOutcome {
                            nameserver: ns.hostname.clone(),
                            address: Some(attempt.address.ip()),
                            status: attempt.status,
                            phase: QueryPhase::Query,
                            elapsed_ms: attempt.elapsed_ms,
                            attempts: attempt.attempts,
                            slow: false,
                            detail: attempt.detail,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Layer query task panicked");
                    }
                }
            }
        })
        .await;

        for handle in &abort_handles {
            handle.abort();
        }
        if collected.is_err() {
            debug!("Layer deadline reached with queries outstanding");
        }

        let outcomes: Vec<QueryOutcome> = slots
            .into_iter()
            .zip(&nameservers)
            .map(|(slot, ns)| slot.unwrap_or_else(|| cancelled_outcome(ns, self.use_ipv6)))
            .collect();

        for (ns, outcome) in nameservers.iter_mut().zip(&outcomes) {
            ns.reachability = match outcome.status {
                _ if outcome.phase == QueryPhase::Resolve => Reachability::Unreachable,
                QueryStatus::Cancelled => Reachability::Unknown,
                status if status.got_response() => Reachability::Reachable,
                _ => Reachability::Unreachable,
            };
        }

        let answer = pick_answer(&arrivals).map(|(index, response, elapsed_ms)| LayerAnswer {
            nameserver: nameservers[*index].hostname.clone(),
            response: response.clone(),
            elapsed_ms: *elapsed_ms,
        });

        let status = match &answer {
            Some(a) if a.response.rcode == Rcode::NxDomain => LayerStatus::Nxdomain,
            Some(_) if outcomes.iter().any(|o| o.status == QueryStatus::Cancelled) => {
                LayerStatus::Partial
            }
            Some(_) => LayerStatus::Ok,
            None => classify_failure(&outcomes),
        };

        let answered_status = match &answer {
            Some(a) if a.response.rcode == Rcode::NxDomain => Some(QueryStatus::Nxdomain),
            Some(_) => Some(QueryStatus::Success),
            None => None,
        };
        let answered_by = outcomes
            .iter()
            .filter(|o| Some(o.status) == answered_status)
            .map(|o| o.nameserver.clone())
            .collect();

        let divergent = answer
            .as_ref()
            .map(|winner| divergent_answers(winner, &arrivals, &nameservers))
            .unwrap_or_default();

        debug!(zone = %zone, status = status.as_str(), "Layer finished");

        LayerResponse {
            status,
            nameservers,
            outcomes,
            answer,
            answered_by,
            divergent,
        }
    }
}

async fn query_with_retries(
    query: Arc<dyn NameserverQuery>,
    semaphore: Arc<Semaphore>,
    address: SocketAddr,
    name: Zone,
    plan: AttemptPlan,
) -> Attempt {
    let _permit = match timeout_at(plan.deadline, semaphore.acquire_owned()).await {
        Ok(Ok(permit)) => permit,
        _ => {
            return Attempt {
                address,
                status: QueryStatus::Cancelled,
                response: None,
                elapsed_ms: 0,
                attempts: 0,
                detail: Some("layer deadline reached before the query started".to_string()),
            }
        }
    };

    let mut attempts = 0u32;
    loop {
        let remaining = plan.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Attempt {
                address,
                status: QueryStatus::Cancelled,
                response: None,
                elapsed_ms: 0,
                attempts,
                detail: Some("layer deadline reached".to_string()),
            };
        }

        attempts += 1;
        let budget = remaining.min(plan.query_timeout);
        let started = Instant::now();
        let result = match timeout(budget, query.query_ns(address, &name, budget)).await {
            Ok(result) => result,
            Err(_) => Err(TraceError::Timeout),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let error = match result {
            Ok(response) => match response_error(&response) {
                None => {
                    let status = if response.rcode == Rcode::NxDomain {
                        QueryStatus::Nxdomain
                    } else {
                        QueryStatus::Success
                    };
                    return Attempt {
                        address,
                        status,
                        response: Some(response),
                        elapsed_ms,
                        attempts,
                        detail: None,
                    };
                }
                Some(error) => error,
            },
            Err(error) => error,
        };

        // A shortened retry that runs out is still a timeout; only a first
        // attempt squeezed by the layer deadline counts as cancelled.
        let cut_by_deadline = matches!(error, TraceError::Timeout)
            && budget < plan.query_timeout
            && attempts == 1;
        let time_left = plan.deadline.saturating_duration_since(Instant::now());
        let retry = error.is_retryable()
            && !cut_by_deadline
            && attempts <= plan.retries
            && time_left >= plan.query_timeout / RETRY_FLOOR_DIVISOR;

        if retry {
            debug!(server = %address, attempt = attempts, error = %error, "Retrying nameserver");
            continue;
        }

        let status = if cut_by_deadline {
            QueryStatus::Cancelled
        } else {
            QueryStatus::from_error(&error)
        };
        return Attempt {
            address,
            status,
            response: None,
            elapsed_ms,
            attempts,
            detail: Some(error.to_string()),
        };
    }
}

/// Error carried by a response that arrived but is not usable. NXDOMAIN is
/// an answer, not an error.
fn response_error(response: &NsResponse) -> Option<TraceError> {
    match response.rcode {
        Rcode::NoError if !response.ns_records().is_empty() || response.is_nodata() => None,
        Rcode::NoError => Some(TraceError::MalformedAnswer(
            "lame response: no NS records, not authoritative".to_string(),
        )),
        Rcode::NxDomain => None,
        Rcode::ServFail => Some(TraceError::Servfail),
        Rcode::Refused => Some(TraceError::Refused),
        Rcode::Other(code) => Some(TraceError::MalformedAnswer(format!(
            "unexpected response code {}",
            code
        ))),
    }
}

/// First non-empty NS answer, else first NODATA, else first NXDOMAIN.
fn pick_answer(arrivals: &[(usize, NsResponse, u64)]) -> Option<&(usize, NsResponse, u64)> {
    arrivals
        .iter()
        .find(|(_, r, _)| r.rcode == Rcode::NoError && !r.ns_records().is_empty())
        .or_else(|| arrivals.iter().find(|(_, r, _)| r.is_nodata()))
        .or_else(|| arrivals.iter().find(|(_, r, _)| r.rcode == Rcode::NxDomain))
}

fn host_set(response: &NsResponse) -> BTreeSet<String> {
    response
        .ns_records()
        .iter()
        .map(|r| r.host.clone())
        .collect()
}

fn divergent_answers(
    winner: &LayerAnswer,
    arrivals: &[(usize, NsResponse, u64)],
    nameservers: &[Nameserver],
) -> Vec<DivergentAnswer> {
    let expected = host_set(&winner.response);
    let mut divergent: Vec<(usize, DivergentAnswer)> = arrivals
        .iter()
        .filter(|(_, r, _)| r.rcode == Rcode::NoError && !r.ns_records().is_empty())
        .filter_map(|(index, response, _)| {
            let hosts = host_set(response);
            (hosts != expected).then(|| {
                (
                    *index,
                    DivergentAnswer {
                        nameserver: nameservers[*index].hostname.clone(),
                        hosts: hosts.into_iter().collect(),
                    },
                )
            })
        })
        .collect();
    divergent.sort_by_key(|(index, _)| *index);
    divergent.into_iter().map(|(_, d)| d).collect()
}

/// Most specific failure across the query-phase outcomes.
fn classify_failure(outcomes: &[QueryOutcome]) -> LayerStatus {
    let queried: Vec<QueryStatus> = outcomes
        .iter()
        .filter(|o| o.phase == QueryPhase::Query)
        .map(|o| o.status)
        .collect();

    let any = |status: QueryStatus| queried.contains(&status);
    if any(QueryStatus::Servfail) {
        LayerStatus::Servfail
    } else if any(QueryStatus::Refused) {
        LayerStatus::Refused
    } else if any(QueryStatus::Malformed) {
        LayerStatus::Malformed
    } else if any(QueryStatus::Timeout) || any(QueryStatus::Cancelled) {
        LayerStatus::Timeout
    } else {
        LayerStatus::Unreachable
    }
}

fn missing_address_outcome(ns: &Nameserver, preflight: &[QueryOutcome]) -> QueryOutcome {
    preflight
        .iter()
        .find(|o| o.nameserver == ns.hostname)
        .cloned()
        .unwrap_or_else(|| {
            QueryOutcome::resolve_failure(
                &ns.hostname,
                &TraceError::Network {
                    server: ns.hostname.clone(),
                    reason: "no usable address".to_string(),
                },
            )
        })
}

fn cancelled_outcome(ns: &Nameserver, use_ipv6: bool) -> QueryOutcome {
    QueryOutcome {
        nameserver: ns.hostname.clone(),
        address: ns.query_addr(use_ipv6).map(|a| a.ip()),
        status: QueryStatus::Cancelled,
        phase: QueryPhase::Query,
        elapsed_ms: 0,
        attempts: 0,
        slow: false,
        detail: Some("layer deadline reached".to_string()),
    }
}
