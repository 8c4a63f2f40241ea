//! Health and recovery-probe configuration

use serde::{Deserialize, Serialize};

/// Endpoint health configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Whether the background recovery prober runs
    pub enabled: bool,
    /// Seconds between probe cycles over unavailable endpoints
    pub probe_interval_seconds: u64,
    /// Timeout for each probe request
    pub probe_timeout_seconds: u64,
    /// Consecutive dispatch failures before an endpoint goes unavailable
    pub failure_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_interval_seconds: 30,
            probe_timeout_seconds: 5,
            failure_threshold: 3,
        }
    }
}
