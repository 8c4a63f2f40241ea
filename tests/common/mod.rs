//! Shared helpers for integration tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use verdant::carbon::{CarbonCache, CarbonFeed, FeedError, FeedReading};
use verdant::registry::{Endpoint, ModelClass, Registry};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Carbon feed double with fixed per-region intensities.
pub struct StaticFeed {
    scores: Mutex<HashMap<String, f64>>,
}

impl StaticFeed {
    pub fn new(scores: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            scores: Mutex::new(
                scores
                    .iter()
                    .map(|(region, score)| (region.to_string(), *score))
                    .collect(),
            ),
        })
    }
}

#[async_trait]
impl CarbonFeed for StaticFeed {
    async fn fetch(&self, region: &str) -> Result<FeedReading, FeedError> {
        self.scores
            .lock()
            .unwrap()
            .get(region)
            .map(|&g_co2_per_kwh| {
                Ok(FeedReading {
                    g_co2_per_kwh,
                    renewable_percent: 50.0,
                })
            })
            .unwrap_or(Err(FeedError::UnmappedRegion(region.to_string())))
    }
}

/// Build a refreshed carbon cache over fixed scores.
pub async fn carbon_cache(scores: &[(&str, f64)]) -> Arc<CarbonCache> {
    let regions = scores.iter().map(|(r, _)| r.to_string()).collect();
    let cache = Arc::new(CarbonCache::new(StaticFeed::new(scores), regions, 900, 300));
    cache.refresh().await;
    cache
}

/// Registry pre-loaded with grammar endpoints pointed at the given URLs.
pub fn grammar_registry(endpoints: &[(&str, &str, &str)]) -> Arc<Registry> {
    let registry = Arc::new(Registry::new());
    for (id, region, url) in endpoints {
        registry.register(Endpoint::new(
            id.to_string(),
            ModelClass::Grammar100m,
            region.to_string(),
            url.to_string(),
            4,
        ));
    }
    registry
}

/// Mount a succeeding expert on a mock server, returning `generated`.
pub async fn mount_expert_ok(server: &MockServer, generated: &str) {
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"generated_text": generated}
        ])))
        .mount(server)
        .await;
}

/// Mount a failing expert (HTTP 500) on a mock server.
pub async fn mount_expert_failure(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}
