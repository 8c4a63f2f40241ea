//! Recovery prober module.
//!
//! The dispatcher demotes endpoints; this background task gives them a way
//! back. It periodically issues a cheap liveness check against every
//! `Unavailable` endpoint and reports a success to the registry, which
//! promotes the endpoint to `Degraded` — one step, not straight to
//! `Healthy`, so a flapping endpoint has to earn its way back.

use crate::config::HealthConfig;
use crate::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background service that probes unavailable endpoints for recovery.
pub struct RecoveryProber {
    registry: Arc<Registry>,
    client: reqwest::Client,
    config: HealthConfig,
}

impl RecoveryProber {
    /// Create a new prober with its own HTTP client.
    pub fn new(registry: Arc<Registry>, config: HealthConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            registry,
            client,
            config,
        }
    }

    /// Probe every unavailable endpoint once. Returns how many recovered.
    ///
    /// The expert surface is opaque, so the probe is a plain
    /// `GET {base_url}/health`; any 2xx counts as alive. Failed probes are
    /// not reported as failures — the endpoint is already unavailable and
    /// hammering the counter would add nothing.
    pub async fn probe_unavailable(&self) -> usize {
        let targets = self.registry.list_unavailable();
        let mut recovered = 0;

        for endpoint in targets {
            let url = format!("{}/health", endpoint.base_url.trim_end_matches('/'));
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(
                        endpoint_id = %endpoint.id,
                        region = %endpoint.region,
                        "Recovery probe succeeded"
                    );
                    self.registry.report_outcome(&endpoint.id, true);
                    metrics::counter!("verdant_probe_recoveries_total").increment(1);
                    recovered += 1;
                }
                Ok(response) => {
                    tracing::debug!(
                        endpoint_id = %endpoint.id,
                        status = response.status().as_u16(),
                        "Recovery probe returned non-success status"
                    );
                }
                Err(error) => {
                    tracing::debug!(
                        endpoint_id = %endpoint.id,
                        error = %error,
                        "Recovery probe failed"
                    );
                }
            }
        }

        recovered
    }

    /// Start the prober background task.
    /// Returns a JoinHandle that resolves when the prober stops.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.probe_interval_seconds));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.config.probe_interval_seconds,
                "Recovery prober started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Recovery prober shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let recovered = self.probe_unavailable().await;
                        if recovered > 0 {
                            tracing::debug!(recovered, "Probe cycle completed");
                        }
                    }
                }
            }
        })
    }
}
