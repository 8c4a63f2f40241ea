//! Request and response types for the task API.

use crate::dispatch::AttemptRecord;
use crate::registry::ModelClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound task submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
}

/// Task result plus the transparency payload: which model class handled
/// it, where it ran, what it cost the grid, and every region attempted.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
    pub result: String,
    pub request_id: Uuid,
    pub model_class: ModelClass,
    /// Classifier confidence for the chosen class (0.0 = fallback)
    pub confidence: f32,
    pub region_used: String,
    /// Grid intensity of the winning region in gCO2/kWh, if measured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_intensity: Option<f64>,
    /// Estimated emissions for this request in grams CO2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_g_co2: Option<f64>,
    /// Estimated grams saved against the dirtiest ranked candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_saved_g: Option<f64>,
    pub response_time_ms: u64,
    pub attempted_regions: Vec<AttemptRecord>,
}

/// Structured error envelope returned by all API endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    pub code: String,
    /// Per-attempt detail, present when every region was exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<AttemptRecord>>,
}

/// Service health summary.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub endpoints: EndpointCounts,
    pub carbon_regions_tracked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointCounts {
    pub healthy: usize,
    pub degraded: usize,
    pub unavailable: usize,
}

/// One row of the carbon rankings listing, greenest first.
#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub rank: usize,
    pub region: String,
    pub g_co2_per_kwh: f64,
    pub renewable_percent: f64,
    pub observed_at: chrono::DateTime<chrono::Utc>,
    /// True when the score has outlived the staleness threshold
    pub stale: bool,
}
