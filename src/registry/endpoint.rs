use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// Model class: a tier of specialized expert model sized for a task category.
///
/// Fixed at deployment time. Every registered endpoint serves exactly one
/// model class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelClass {
    /// Grammar and typo correction (small encoder-decoder)
    #[serde(rename = "grammar-100m")]
    Grammar100m,
    /// Email drafting
    #[serde(rename = "email-7b")]
    Email7b,
    /// Summarization
    #[serde(rename = "summarize-1b")]
    Summarize1b,
    /// Question answering / lookup
    #[serde(rename = "search-7b")]
    Search7b,
    /// Text classification and labeling
    #[serde(rename = "classify-100m")]
    Classify100m,
    /// Reformatting (bullets, tables, markdown)
    #[serde(rename = "format-100m")]
    Format100m,
}

impl ModelClass {
    /// All known model classes, in canonical order.
    pub const ALL: [ModelClass; 6] = [
        ModelClass::Grammar100m,
        ModelClass::Email7b,
        ModelClass::Summarize1b,
        ModelClass::Search7b,
        ModelClass::Classify100m,
        ModelClass::Format100m,
    ];

    /// Canonical wire name (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelClass::Grammar100m => "grammar-100m",
            ModelClass::Email7b => "email-7b",
            ModelClass::Summarize1b => "summarize-1b",
            ModelClass::Search7b => "search-7b",
            ModelClass::Classify100m => "classify-100m",
            ModelClass::Format100m => "format-100m",
        }
    }

    /// Nominal energy drawn by one inference request, in kWh.
    ///
    /// Deployment-tunable estimate used only for the transparency payload
    /// (estimated gCO2 = intensity * energy). Not used for routing.
    pub fn energy_kwh(&self) -> f64 {
        match self {
            ModelClass::Grammar100m | ModelClass::Classify100m | ModelClass::Format100m => 0.0003,
            ModelClass::Summarize1b => 0.001,
            ModelClass::Email7b | ModelClass::Search7b => 0.004,
        }
    }
}

impl fmt::Display for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grammar-100m" => Ok(ModelClass::Grammar100m),
            "email-7b" => Ok(ModelClass::Email7b),
            "summarize-1b" => Ok(ModelClass::Summarize1b),
            "search-7b" => Ok(ModelClass::Search7b),
            "classify-100m" => Ok(ModelClass::Classify100m),
            "format-100m" => Ok(ModelClass::Format100m),
            _ => Err(format!("unknown model class: {}", s)),
        }
    }
}

/// Endpoint health status.
///
/// A small finite-state machine: `Healthy ⇄ Degraded ⇄ Unavailable`.
/// Demotion to `Unavailable` happens after a configured number of
/// consecutive failures; promotion moves one step per success so a flapping
/// endpoint cannot bounce straight back to the front of the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    /// Accepting requests, no recent failures
    Healthy,
    /// Usable but recovering; deprioritized against same-carbon healthy peers
    Degraded,
    /// Excluded from candidate lists until a probe succeeds
    Unavailable,
}

impl EndpointStatus {
    /// One recovery step: `Unavailable → Degraded → Healthy`.
    pub fn promoted(self) -> Self {
        match self {
            EndpointStatus::Unavailable => EndpointStatus::Degraded,
            EndpointStatus::Degraded | EndpointStatus::Healthy => EndpointStatus::Healthy,
        }
    }

    /// Sort rank for candidate ordering (healthy first).
    pub fn rank(self) -> u8 {
        match self {
            EndpointStatus::Healthy => 0,
            EndpointStatus::Degraded => 1,
            EndpointStatus::Unavailable => 2,
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndpointStatus::Healthy => "healthy",
            EndpointStatus::Degraded => "degraded",
            EndpointStatus::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// One deployed, addressable instance of a model class in a specific region.
///
/// Contains both the static descriptor and runtime health state. The
/// in-flight counter is atomic so concurrent dispatches can update it
/// without taking the registry entry lock.
#[derive(Debug)]
pub struct Endpoint {
    /// Unique identifier (stable across re-registration)
    pub id: String,
    /// Model class served by this deployment
    pub model_class: ModelClass,
    /// Grid region hosting the deployment (e.g. "us-west1")
    pub region: String,
    /// Base URL of the expert endpoint
    pub base_url: String,
    /// Advisory concurrency cap, used for admission only
    pub max_concurrency: u32,
    /// Current health status
    pub status: EndpointStatus,
    /// Consecutive failed attempts since the last success
    pub consecutive_failures: u32,
    /// Last time an outcome or probe touched this endpoint
    pub last_checked_at: DateTime<Utc>,
    /// Requests currently in flight (atomic)
    pub in_flight: AtomicU32,
}

impl Endpoint {
    /// Create a new endpoint. Starts `Healthy` with no history: the status
    /// set has no "unknown" state and every request must be routable.
    pub fn new(
        id: String,
        model_class: ModelClass,
        region: String,
        base_url: String,
        max_concurrency: u32,
    ) -> Self {
        Self {
            id,
            model_class,
            region,
            base_url,
            max_concurrency,
            status: EndpointStatus::Healthy,
            consecutive_failures: 0,
            last_checked_at: Utc::now(),
            in_flight: AtomicU32::new(0),
        }
    }
}

/// Serializable snapshot of an [`Endpoint`] (atomic fields flattened).
///
/// The registry hands out views, never references into its own storage, so
/// callers can hold them across awaits without pinning an entry lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointView {
    pub id: String,
    pub model_class: ModelClass,
    pub region: String,
    pub base_url: String,
    pub max_concurrency: u32,
    pub status: EndpointStatus,
    pub consecutive_failures: u32,
    pub last_checked_at: DateTime<Utc>,
    pub in_flight: u32,
}

impl From<&Endpoint> for EndpointView {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            id: endpoint.id.clone(),
            model_class: endpoint.model_class,
            region: endpoint.region.clone(),
            base_url: endpoint.base_url.clone(),
            max_concurrency: endpoint.max_concurrency,
            status: endpoint.status,
            consecutive_failures: endpoint.consecutive_failures,
            last_checked_at: endpoint.last_checked_at,
            in_flight: endpoint.in_flight.load(Ordering::SeqCst),
        }
    }
}
