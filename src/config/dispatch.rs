//! Dispatcher configuration

use serde::{Deserialize, Serialize};

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline for a single attempt against one endpoint
    pub attempt_timeout_seconds: u64,
    /// Cap on attempts per request, independent of candidate count, so
    /// worst-case latency stays bounded even with a long candidate list
    pub max_attempts: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_seconds: 6,
            max_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_config_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.attempt_timeout_seconds, 6);
        assert_eq!(config.max_attempts, 3);
    }
}
