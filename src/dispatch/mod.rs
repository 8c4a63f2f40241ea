//! Dispatcher module.
//!
//! Walks the ordered candidate list one endpoint at a time, bounded by a
//! per-attempt timeout and a maximum attempt count, reporting every outcome
//! back to the registry. Attempts within one request are sequential by
//! design: a probe-then-commit fan-out would burn the energy this system
//! exists to save. Independent requests run fully in parallel.

mod state;

pub use state::{AttemptOutcome, AttemptRecord, DispatchState};

use crate::carbon::CarbonScore;
use crate::config::DispatchConfig;
use crate::expert::{ExpertClient, ExpertError};
use crate::registry::{EndpointView, ModelClass, Registry};
use crate::selector::Candidate;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Errors that end a dispatch without a response
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Every permitted attempt failed; carries per-attempt detail
    #[error("all regions exhausted after {} attempts", attempts.len())]
    AllRegionsExhausted { attempts: Vec<AttemptRecord> },
}

/// One inbound task, ephemeral: created per call, dropped with the response.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub request_id: Uuid,
    pub text: String,
}

impl TaskRequest {
    pub fn new(text: String) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            text,
        }
    }
}

/// The recorded outcome of selection and dispatch, attached to the
/// response for transparency. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    pub model_class: ModelClass,
    /// Candidate endpoint ids in the order they were ranked
    pub candidate_ids: Vec<String>,
    pub chosen_endpoint: EndpointView,
    /// Carbon score the winning endpoint was ranked with, if measured
    pub carbon_score_used: Option<CarbonScore>,
    /// Highest measured score among the candidates, for savings estimates
    pub worst_candidate_score: Option<f64>,
    pub attempts: Vec<AttemptRecord>,
}

/// Successful dispatch: generated text plus its provenance.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub reply: String,
    pub decision: RoutingDecision,
}

/// Executes requests against ranked candidates with failover.
pub struct Dispatcher {
    registry: Arc<Registry>,
    expert: Arc<dyn ExpertClient>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        expert: Arc<dyn ExpertClient>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            expert,
            config,
        }
    }

    /// Try candidates in order until one answers or attempts run out.
    ///
    /// Every completed attempt is reported to the registry, recorded in the
    /// decision, and counted in metrics. Exhaustion returns
    /// [`DispatchError::AllRegionsExhausted`] with the full attempt trail;
    /// there is no partial success.
    pub async fn dispatch(
        &self,
        model_class: ModelClass,
        task: &TaskRequest,
        candidates: &[Candidate],
    ) -> Result<Dispatched, DispatchError> {
        let attempt_timeout = Duration::from_secs(self.config.attempt_timeout_seconds);
        let permitted = candidates.len().min(self.config.max_attempts);
        if permitted < candidates.len() {
            tracing::debug!(
                request_id = %task.request_id,
                candidates = candidates.len(),
                max_attempts = self.config.max_attempts,
                "Candidate list longer than attempt budget"
            );
        }

        let worst_candidate_score = candidates
            .iter()
            .filter_map(|c| c.score.as_ref().map(|s| s.g_co2_per_kwh))
            .fold(None, |acc: Option<f64>, s| {
                Some(acc.map_or(s, |a| a.max(s)))
            });

        let mut state = DispatchState::Pending;
        tracing::trace!(request_id = %task.request_id, state = ?state, "Dispatch started");
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(permitted);

        for (index, candidate) in candidates.iter().take(permitted).enumerate() {
            state = DispatchState::Attempting(index);
            tracing::trace!(request_id = %task.request_id, state = ?state, "Dispatch state");
            let endpoint = &candidate.endpoint;

            let _guard = self.registry.begin_attempt(&endpoint.id);
            let started = Instant::now();
            let result = tokio::time::timeout(
                attempt_timeout,
                self.expert
                    .generate(model_class, &endpoint.base_url, &task.text),
            )
            .await
            // A late result is discarded with the timed-out future.
            .unwrap_or(Err(ExpertError::Timeout(attempt_timeout.as_millis() as u64)));
            let latency_ms = started.elapsed().as_millis() as u64;

            let outcome = match &result {
                Ok(_) => AttemptOutcome::Success,
                Err(error) => AttemptOutcome::from_error(error),
            };
            self.registry.report_outcome(&endpoint.id, outcome.is_success());

            metrics::counter!(
                "verdant_dispatch_attempts_total",
                "region" => endpoint.region.clone(),
                "outcome" => outcome.label()
            )
            .increment(1);
            metrics::histogram!(
                "verdant_attempt_latency_seconds",
                "region" => endpoint.region.clone()
            )
            .record(latency_ms as f64 / 1000.0);

            attempts.push(AttemptRecord {
                endpoint_id: endpoint.id.clone(),
                region: endpoint.region.clone(),
                outcome,
                latency_ms,
            });

            match result {
                Ok(reply) => {
                    state = DispatchState::Succeeded(index);
                    debug_assert!(state.is_terminal());
                    tracing::info!(
                        request_id = %task.request_id,
                        endpoint_id = %endpoint.id,
                        region = %endpoint.region,
                        attempt = index + 1,
                        latency_ms,
                        "Dispatch succeeded"
                    );

                    let decision = RoutingDecision {
                        model_class,
                        candidate_ids: candidates
                            .iter()
                            .map(|c| c.endpoint.id.clone())
                            .collect(),
                        chosen_endpoint: endpoint.clone(),
                        carbon_score_used: candidate.score.clone(),
                        worst_candidate_score,
                        attempts,
                    };
                    return Ok(Dispatched { reply, decision });
                }
                Err(error) => {
                    tracing::warn!(
                        request_id = %task.request_id,
                        endpoint_id = %endpoint.id,
                        region = %endpoint.region,
                        attempt = index + 1,
                        error = %error,
                        "Dispatch attempt failed, trying next candidate"
                    );
                }
            }
        }

        state = DispatchState::Exhausted;
        debug_assert!(state.is_terminal());
        tracing::error!(
            request_id = %task.request_id,
            model_class = %model_class,
            attempts = attempts.len(),
            "All candidates exhausted"
        );
        metrics::counter!("verdant_dispatch_exhausted_total").increment(1);

        Err(DispatchError::AllRegionsExhausted { attempts })
    }
}
