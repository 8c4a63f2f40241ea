//! Carbon Signal Cache module.
//!
//! Periodically refreshes per-region grid carbon-intensity scores from the
//! external feed and serves them to the Region Selector without ever
//! blocking on network I/O. Refresh builds a complete new snapshot and
//! swaps it atomically, so concurrent readers see either the old or the
//! fully updated map, never a torn one.

mod error;
mod feed;

pub use error::*;
pub use feed::*;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Carbon-intensity observation for one region.
///
/// Exactly one current score exists per region. Scores past the staleness
/// threshold are reported as [`ScoreLookup::Unknown`], never treated as
/// zero or assumed-best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonScore {
    pub region: String,
    pub g_co2_per_kwh: f64,
    pub renewable_percent: f64,
    pub observed_at: DateTime<Utc>,
}

/// Result of a cache read for one region.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreLookup {
    /// A fresh score exists for the region
    Known(CarbonScore),
    /// No score, or the freshest score is older than the staleness threshold
    Unknown,
}

type Snapshot = Arc<HashMap<String, CarbonScore>>;

/// Snapshot cache of per-region carbon scores.
pub struct CarbonCache {
    feed: Arc<dyn CarbonFeed>,
    regions: Vec<String>,
    staleness: ChronoDuration,
    refresh_interval: Duration,
    snapshot: RwLock<Snapshot>,
}

impl CarbonCache {
    pub fn new(
        feed: Arc<dyn CarbonFeed>,
        regions: Vec<String>,
        staleness_seconds: u64,
        refresh_interval_seconds: u64,
    ) -> Self {
        Self {
            feed,
            regions,
            staleness: ChronoDuration::seconds(staleness_seconds as i64),
            refresh_interval: Duration::from_secs(refresh_interval_seconds.max(1)),
            snapshot: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Latest score for a region, or `Unknown` when missing or stale.
    ///
    /// Never blocks on network I/O: reads the last published snapshot.
    pub fn score_for(&self, region: &str) -> ScoreLookup {
        let snapshot = self.current();
        match snapshot.get(region) {
            Some(score) if !self.is_stale(score) => ScoreLookup::Known(score.clone()),
            Some(score) => {
                tracing::debug!(
                    region = %region,
                    observed_at = %score.observed_at,
                    "Carbon score is stale, treating as unknown"
                );
                ScoreLookup::Unknown
            }
            None => ScoreLookup::Unknown,
        }
    }

    /// All cached scores, greenest first. Stale scores are included so
    /// operators can see aging data; use [`CarbonCache::is_stale`] to flag
    /// them.
    pub fn rankings(&self) -> Vec<CarbonScore> {
        let snapshot = self.current();
        let mut scores: Vec<CarbonScore> = snapshot.values().cloned().collect();
        scores.sort_by(|a, b| {
            a.g_co2_per_kwh
                .total_cmp(&b.g_co2_per_kwh)
                .then_with(|| a.region.cmp(&b.region))
        });
        scores
    }

    /// Whether a score has outlived the staleness threshold.
    pub fn is_stale(&self, score: &CarbonScore) -> bool {
        Utc::now() - score.observed_at > self.staleness
    }

    /// Number of regions with any cached score (fresh or aging).
    pub fn tracked_regions(&self) -> usize {
        self.current().len()
    }

    /// Pull current scores for all configured regions.
    ///
    /// Regions are fetched concurrently. On partial failure the prior score
    /// for each failed region is retained with its original `observed_at`,
    /// so staleness keeps accruing; a complete feed outage never wipes the
    /// snapshot. Returns the number of regions refreshed this cycle.
    pub async fn refresh(&self) -> usize {
        let fetches = self.regions.iter().map(|region| {
            let feed = Arc::clone(&self.feed);
            let region = region.clone();
            async move {
                let result = feed.fetch(&region).await;
                (region, result)
            }
        });
        let results = futures::future::join_all(fetches).await;

        let previous = self.current();
        let mut next: HashMap<String, CarbonScore> = HashMap::with_capacity(self.regions.len());
        let mut refreshed = 0;

        for (region, result) in results {
            match result {
                Ok(reading) => {
                    metrics::gauge!("verdant_region_carbon_intensity", "region" => region.clone())
                        .set(reading.g_co2_per_kwh);
                    next.insert(
                        region.clone(),
                        CarbonScore {
                            region,
                            g_co2_per_kwh: reading.g_co2_per_kwh,
                            renewable_percent: reading.renewable_percent,
                            observed_at: Utc::now(),
                        },
                    );
                    refreshed += 1;
                }
                Err(error) => {
                    tracing::warn!(region = %region, error = %error, "Carbon feed fetch failed");
                    // Retain the prior score with its original timestamp.
                    if let Some(old) = previous.get(&region) {
                        next.insert(region, old.clone());
                    }
                }
            }
        }

        // Publish the fully built snapshot in one swap.
        *self.snapshot.write().expect("carbon snapshot lock poisoned") = Arc::new(next);

        tracing::debug!(
            refreshed,
            total_regions = self.regions.len(),
            "Carbon refresh cycle completed"
        );
        refreshed
    }

    /// Start the background refresh loop. Refreshes immediately, then on
    /// the configured interval, until the token is cancelled.
    pub fn start(self: Arc<Self>, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.refresh_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.refresh_interval.as_secs(),
                regions = self.regions.len(),
                "Carbon refresh loop started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Carbon refresh loop shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.refresh().await;
                    }
                }
            }
        })
    }

    fn current(&self) -> Snapshot {
        Arc::clone(&self.snapshot.read().expect("carbon snapshot lock poisoned"))
    }
}
