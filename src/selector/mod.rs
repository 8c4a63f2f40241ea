//! Region Selector module.
//!
//! Given a model class, produces the full ordered candidate list the
//! dispatcher will walk: measured-green endpoints first, unknown-carbon
//! endpoints after them, overloaded endpoints last. The whole list is
//! returned (not just the top choice) so failover never recomputes the
//! ranking mid-request.

use crate::carbon::{CarbonCache, CarbonScore, ScoreLookup};
use crate::registry::{EndpointView, ModelClass, Registry};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during region selection
#[derive(Debug, Error)]
pub enum SelectError {
    /// No registered, non-unavailable endpoint serves the model class
    #[error("no capacity: no endpoint registered for model class '{model_class}'")]
    NoCapacity { model_class: ModelClass },
}

/// One ranked dispatch candidate: an endpoint snapshot plus the carbon
/// score it was ranked with (None when the score was missing or stale).
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub endpoint: EndpointView,
    pub score: Option<CarbonScore>,
}

/// Ranks eligible endpoints by carbon intensity.
pub struct Selector {
    registry: Arc<Registry>,
    carbon: Arc<CarbonCache>,
}

impl Selector {
    pub fn new(registry: Arc<Registry>, carbon: Arc<CarbonCache>) -> Self {
        Self { registry, carbon }
    }

    /// Produce the ordered candidate list for a model class, best first.
    ///
    /// Ordering within the measured partition: ascending carbon, then
    /// health (healthy before degraded), then ascending in-flight count,
    /// then endpoint id. Unknown-carbon candidates follow with the same
    /// non-carbon keys: usable, but never preferred over a measured
    /// greener endpoint. Endpoints at their advisory concurrency cap are
    /// moved to the very back rather than dropped, so a fully loaded
    /// fleet degrades instead of refusing.
    pub fn select(&self, model_class: ModelClass) -> Result<Vec<Candidate>, SelectError> {
        let views = self.registry.list_candidates(model_class);
        if views.is_empty() {
            return Err(SelectError::NoCapacity { model_class });
        }

        let mut known: Vec<Candidate> = Vec::new();
        let mut unknown: Vec<Candidate> = Vec::new();
        let mut saturated: Vec<Candidate> = Vec::new();

        for endpoint in views {
            let lookup = self.carbon.score_for(&endpoint.region);
            let score = match lookup {
                ScoreLookup::Known(score) => Some(score),
                ScoreLookup::Unknown => None,
            };
            let candidate = Candidate { endpoint, score };

            if candidate.endpoint.in_flight >= candidate.endpoint.max_concurrency {
                saturated.push(candidate);
            } else if candidate.score.is_some() {
                known.push(candidate);
            } else {
                unknown.push(candidate);
            }
        }

        known.sort_by(|a, b| {
            let a_score = a.score.as_ref().map(|s| s.g_co2_per_kwh).unwrap_or(f64::MAX);
            let b_score = b.score.as_ref().map(|s| s.g_co2_per_kwh).unwrap_or(f64::MAX);
            a_score
                .total_cmp(&b_score)
                .then_with(|| tie_break(&a.endpoint, &b.endpoint))
        });
        unknown.sort_by(|a, b| tie_break(&a.endpoint, &b.endpoint));
        saturated.sort_by(|a, b| tie_break(&a.endpoint, &b.endpoint));

        let mut ordered = known;
        ordered.extend(unknown);
        ordered.extend(saturated);

        tracing::debug!(
            model_class = %model_class,
            candidates = ordered.len(),
            best = %ordered[0].endpoint.id,
            "Candidate list ranked"
        );

        Ok(ordered)
    }
}

/// Non-carbon ordering keys: health rank, in-flight count, endpoint id.
/// The id comparison makes the full ordering deterministic and
/// reproducible under test.
fn tie_break(a: &EndpointView, b: &EndpointView) -> std::cmp::Ordering {
    a.status
        .rank()
        .cmp(&b.status.rank())
        .then_with(|| a.in_flight.cmp(&b.in_flight))
        .then_with(|| a.id.cmp(&b.id))
}
