//! Carbon signal configuration

use serde::{Deserialize, Serialize};

/// Maps one grid region to the balancing authority reporting its fuel mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub region: String,
    pub balancing_authority: String,
}

/// Carbon Signal Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonConfig {
    /// Base URL of the grid data API
    pub feed_url: String,
    /// Environment variable holding the feed API key
    pub api_key_env: String,
    /// Seconds between background refresh cycles
    pub refresh_interval_seconds: u64,
    /// Scores older than this read as unknown
    pub staleness_seconds: u64,
    /// Per-fetch feed timeout
    pub feed_timeout_seconds: u64,
    /// Region → balancing-authority mapping
    pub regions: Vec<RegionConfig>,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://api.eia.gov".to_string(),
            api_key_env: "EIA_API_KEY".to_string(),
            refresh_interval_seconds: 300,
            staleness_seconds: 900,
            feed_timeout_seconds: 15,
            regions: default_region_map(),
        }
    }
}

impl CarbonConfig {
    /// All configured region names.
    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.region.clone()).collect()
    }

    /// region → balancing authority, as the feed client consumes it.
    pub fn region_map(&self) -> std::collections::HashMap<String, String> {
        self.regions
            .iter()
            .map(|r| (r.region.clone(), r.balancing_authority.clone()))
            .collect()
    }
}

/// Default mapping of datacenter regions to US balancing authorities.
fn default_region_map() -> Vec<RegionConfig> {
    [
        ("us-west1", "BPAT"),
        ("us-west2", "CISO"),
        ("us-west3", "PACE"),
        ("us-west4", "NEVP"),
        ("us-central1", "MISO"),
        ("us-south1", "ERCO"),
        ("us-east1", "SCEG"),
        ("us-east4", "PJM"),
        ("us-east5", "PJM"),
    ]
    .into_iter()
    .map(|(region, authority)| RegionConfig {
        region: region.to_string(),
        balancing_authority: authority.to_string(),
    })
    .collect()
}
