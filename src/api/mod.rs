//! # Task routing API
//!
//! HTTP surface for the carbon-aware router.
//!
//! ## Endpoints
//!
//! - `POST /api/process` - Submit a task; returns the result plus the
//!   transparency payload (model class, region used, estimated gCO2,
//!   attempted regions)
//! - `GET /api/health` - Service status with endpoint counts
//! - `GET /api/carbon/rankings` - Cached regions ranked greenest-first
//! - `GET /api/endpoints` - Registry listing for operators
//! - `GET /metrics` - Prometheus exposition
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use verdant::api::{create_router, AppState};
//! use verdant::carbon::{CarbonCache, EiaGridFeed};
//! use verdant::config::VerdantConfig;
//! use verdant::registry::Registry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(VerdantConfig::default());
//! let registry = Arc::new(Registry::new());
//! let feed = Arc::new(EiaGridFeed::new(
//!     config.carbon.feed_url.clone(),
//!     String::new(),
//!     config.carbon.region_map(),
//!     config.carbon.feed_timeout_seconds,
//! ));
//! let carbon = Arc::new(CarbonCache::new(
//!     feed,
//!     config.carbon.region_names(),
//!     config.carbon.staleness_seconds,
//!     config.carbon.refresh_interval_seconds,
//! ));
//!
//! let state = Arc::new(AppState::new(registry, carbon, config, None));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod process;
pub mod types;

pub use error::ApiError;
pub use types::*;

use crate::carbon::CarbonCache;
use crate::classifier::Classifier;
use crate::config::VerdantConfig;
use crate::dispatch::Dispatcher;
use crate::expert::HttpExpertClient;
use crate::registry::Registry;
use crate::selector::Selector;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (1 MB). Task text is short by definition.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub registry: Arc<Registry>,
    pub carbon: Arc<CarbonCache>,
    pub classifier: Classifier,
    pub selector: Selector,
    pub dispatcher: Dispatcher,
    pub config: Arc<VerdantConfig>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    /// Prometheus handle; None when metrics export is not installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the routing pipeline from its shared parts.
    pub fn new(
        registry: Arc<Registry>,
        carbon: Arc<CarbonCache>,
        config: Arc<VerdantConfig>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        let classifier = Classifier::new(&config.classifier);
        let selector = Selector::new(Arc::clone(&registry), Arc::clone(&carbon));
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::new(HttpExpertClient::new()),
            config.dispatch,
        );

        Self {
            registry,
            carbon,
            classifier,
            selector,
            dispatcher,
            config,
            start_time: Instant::now(),
            metrics_handle,
        }
    }
}

/// Create the router with all endpoints and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .route("/api/process", post(process::process_task))
        .route("/api/health", get(health))
        .route("/api/carbon/rankings", get(carbon_rankings))
        .route("/api/endpoints", get(list_endpoints))
        .route("/metrics", get(metrics_exposition))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

/// `GET /api/health`
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (healthy, degraded, unavailable) = state.registry.counts_by_status();
    let status = if healthy + degraded > 0 { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        endpoints: EndpointCounts {
            healthy,
            degraded,
            unavailable,
        },
        carbon_regions_tracked: state.carbon.tracked_regions(),
    })
}

/// `GET /api/carbon/rankings`
async fn carbon_rankings(State(state): State<Arc<AppState>>) -> Json<Vec<RankingEntry>> {
    let rankings = state
        .carbon
        .rankings()
        .into_iter()
        .enumerate()
        .map(|(i, score)| RankingEntry {
            rank: i + 1,
            stale: state.carbon.is_stale(&score),
            region: score.region,
            g_co2_per_kwh: score.g_co2_per_kwh,
            renewable_percent: score.renewable_percent,
            observed_at: score.observed_at,
        })
        .collect();
    Json(rankings)
}

/// `GET /api/endpoints`
async fn list_endpoints(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<crate::registry::EndpointView>> {
    let mut endpoints = state.registry.list_all();
    endpoints.sort_by(|a, b| a.id.cmp(&b.id));
    Json(endpoints)
}

/// `GET /metrics`
async fn metrics_exposition(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
