//! Task submission handler: classify → select → dispatch.

use super::error::ApiError;
use super::types::{ProcessRequest, ProcessResponse};
use super::AppState;
use crate::dispatch::TaskRequest;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use std::time::Instant;

/// `POST /api/process`
///
/// The full routing pipeline for one task. Attempt-level failures are
/// handled inside the dispatcher; only terminal outcomes surface here.
pub async fn process_task(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let started = Instant::now();
    let task = TaskRequest::new(payload.text);

    let classification = state.classifier.classify(&task.text)?;
    if state.config.logging.enable_content_logging {
        tracing::debug!(
            request_id = %task.request_id,
            model_class = %classification.model_class,
            confidence = classification.confidence,
            text = %crate::logging::truncate_text(&task.text, 120),
            "Task classified"
        );
    } else {
        tracing::debug!(
            request_id = %task.request_id,
            model_class = %classification.model_class,
            confidence = classification.confidence,
            "Task classified"
        );
    }

    let candidates = state.selector.select(classification.model_class)?;
    let dispatched = state
        .dispatcher
        .dispatch(classification.model_class, &task, &candidates)
        .await?;

    let decision = dispatched.decision;
    let energy_kwh = decision.model_class.energy_kwh();
    let carbon_intensity = decision
        .carbon_score_used
        .as_ref()
        .map(|score| score.g_co2_per_kwh);
    let estimated_g_co2 = carbon_intensity.map(|g| g * energy_kwh);
    let carbon_saved_g = match (carbon_intensity, decision.worst_candidate_score) {
        (Some(used), Some(worst)) if worst > used => Some((worst - used) * energy_kwh),
        _ => None,
    };

    let response_time_ms = started.elapsed().as_millis() as u64;
    metrics::counter!(
        "verdant_requests_total",
        "model_class" => decision.model_class.as_str()
    )
    .increment(1);
    metrics::histogram!("verdant_request_seconds").record(response_time_ms as f64 / 1000.0);

    Ok(Json(ProcessResponse {
        result: dispatched.reply,
        request_id: task.request_id,
        model_class: decision.model_class,
        confidence: classification.confidence,
        region_used: decision.chosen_endpoint.region.clone(),
        carbon_intensity,
        estimated_g_co2,
        carbon_saved_g,
        response_time_ms,
        attempted_regions: decision.attempts,
    }))
}
