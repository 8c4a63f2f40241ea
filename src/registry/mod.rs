//! Region Registry module.
//!
//! Thread-safe in-memory store of (model-class, region) endpoint pairs and
//! their health state. The registry is the single writer for per-endpoint
//! health: outcome reports and recovery probes both funnel through
//! [`Registry::report_outcome`], and updates take only the one endpoint's
//! entry lock, never a global lock.

mod endpoint;

pub use endpoint::*;

use dashmap::DashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// The Region Registry stores all known expert endpoints.
///
/// # Examples
///
/// ```
/// use verdant::registry::{Endpoint, ModelClass, Registry};
///
/// let registry = Registry::new();
/// registry.register(Endpoint::new(
///     "grammar-us-west1".to_string(),
///     ModelClass::Grammar100m,
///     "us-west1".to_string(),
///     "http://localhost:9001".to_string(),
///     4,
/// ));
/// assert_eq!(registry.endpoint_count(), 1);
/// ```
pub struct Registry {
    endpoints: DashMap<String, Endpoint>,
    class_index: DashMap<ModelClass, Vec<String>>,
    failure_threshold: u32,
}

impl Registry {
    /// Create a new empty registry with the default failure threshold (3).
    pub fn new() -> Self {
        Self::with_failure_threshold(3)
    }

    /// Create a registry that demotes an endpoint to `Unavailable` after
    /// `failure_threshold` consecutive failures.
    pub fn with_failure_threshold(failure_threshold: u32) -> Self {
        Self {
            endpoints: DashMap::new(),
            class_index: DashMap::new(),
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Register an endpoint. Idempotent: re-registering an existing id
    /// replaces the descriptor fields (region, URL, capacity) but preserves
    /// accumulated health state, so a config reload cannot reset
    /// circuit-breaking history.
    pub fn register(&self, endpoint: Endpoint) {
        if let Some(mut existing) = self.endpoints.get_mut(&endpoint.id) {
            let reindex = (existing.model_class != endpoint.model_class)
                .then_some(existing.model_class);
            existing.model_class = endpoint.model_class;
            existing.region = endpoint.region;
            existing.base_url = endpoint.base_url;
            existing.max_concurrency = endpoint.max_concurrency;
            drop(existing); // Release the entry lock before touching the index
            if let Some(old_class) = reindex {
                self.unindex(&endpoint.id, old_class);
                self.index(&endpoint.id, endpoint.model_class);
            }
            tracing::debug!(endpoint_id = %endpoint.id, "Endpoint re-registered, descriptor updated");
            return;
        }

        self.index(&endpoint.id, endpoint.model_class);
        tracing::info!(
            endpoint_id = %endpoint.id,
            model_class = %endpoint.model_class,
            region = %endpoint.region,
            "Endpoint registered"
        );
        self.endpoints.insert(endpoint.id.clone(), endpoint);
    }

    /// Deregister an endpoint. Unknown ids are a no-op, not an error.
    pub fn deregister(&self, id: &str) -> Option<EndpointView> {
        let (_, endpoint) = self.endpoints.remove(id)?;
        self.unindex(id, endpoint.model_class);
        tracing::info!(endpoint_id = %id, "Endpoint deregistered");
        Some(EndpointView::from(&endpoint))
    }

    /// Get a snapshot of a single endpoint.
    pub fn get(&self, id: &str) -> Option<EndpointView> {
        self.endpoints.get(id).map(|e| EndpointView::from(e.value()))
    }

    /// Snapshots of all registered endpoints.
    pub fn list_all(&self) -> Vec<EndpointView> {
        self.endpoints
            .iter()
            .map(|e| EndpointView::from(e.value()))
            .collect()
    }

    /// Candidate endpoints for a model class, excluding `Unavailable` ones.
    ///
    /// Order is unspecified; the Region Selector imposes the carbon-aware
    /// ordering.
    pub fn list_candidates(&self, model_class: ModelClass) -> Vec<EndpointView> {
        let Some(ids) = self.class_index.get(&model_class) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| self.get(id))
            .filter(|view| view.status != EndpointStatus::Unavailable)
            .collect()
    }

    /// Snapshots of all `Unavailable` endpoints (recovery probe targets).
    pub fn list_unavailable(&self) -> Vec<EndpointView> {
        self.endpoints
            .iter()
            .filter(|e| e.value().status == EndpointStatus::Unavailable)
            .map(|e| EndpointView::from(e.value()))
            .collect()
    }

    /// Number of registered endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Endpoint counts by status: (healthy, degraded, unavailable).
    pub fn counts_by_status(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for entry in self.endpoints.iter() {
            match entry.value().status {
                EndpointStatus::Healthy => counts.0 += 1,
                EndpointStatus::Degraded => counts.1 += 1,
                EndpointStatus::Unavailable => counts.2 += 1,
            }
        }
        counts
    }

    /// Apply a dispatch or probe outcome to an endpoint's health state.
    ///
    /// A success resets the consecutive-failure count and promotes the
    /// status one step (`Unavailable → Degraded → Healthy`). A failure
    /// increments the count and demotes to `Unavailable` once the threshold
    /// is reached. Unknown ids are a no-op: the endpoint may have been
    /// deregistered while an attempt was in flight.
    pub fn report_outcome(&self, id: &str, success: bool) {
        let Some(mut endpoint) = self.endpoints.get_mut(id) else {
            tracing::debug!(endpoint_id = %id, "Outcome for unknown endpoint ignored");
            return;
        };

        let old_status = endpoint.status;
        if success {
            endpoint.consecutive_failures = 0;
            endpoint.status = endpoint.status.promoted();
        } else {
            endpoint.consecutive_failures += 1;
            if endpoint.consecutive_failures >= self.failure_threshold {
                endpoint.status = EndpointStatus::Unavailable;
            }
        }
        endpoint.last_checked_at = chrono::Utc::now();

        if endpoint.status != old_status {
            tracing::info!(
                endpoint_id = %id,
                old_status = %old_status,
                new_status = %endpoint.status,
                consecutive_failures = endpoint.consecutive_failures,
                "Endpoint status changed"
            );
        }
    }

    /// Start tracking an in-flight attempt against an endpoint.
    ///
    /// Returns a guard that decrements the counter on drop, so a cancelled
    /// request still releases its slot. Unknown ids yield a no-op guard.
    pub fn begin_attempt(self: &Arc<Self>, id: &str) -> InFlightGuard {
        if let Some(endpoint) = self.endpoints.get(id) {
            endpoint.in_flight.fetch_add(1, Ordering::SeqCst);
        }
        InFlightGuard {
            registry: Arc::clone(self),
            id: id.to_string(),
        }
    }

    fn end_attempt(&self, id: &str) {
        let Some(endpoint) = self.endpoints.get(id) else {
            return;
        };
        // Saturating decrement: never wrap below zero.
        loop {
            let current = endpoint.in_flight.load(Ordering::SeqCst);
            if current == 0 {
                tracing::warn!(
                    endpoint_id = %id,
                    "Attempted to decrement in_flight when already at 0"
                );
                return;
            }
            if endpoint
                .in_flight
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return;
            }
        }
    }

    fn index(&self, id: &str, model_class: ModelClass) {
        self.class_index
            .entry(model_class)
            .or_default()
            .push(id.to_string());
    }

    fn unindex(&self, id: &str, model_class: ModelClass) {
        if let Some(mut ids) = self.class_index.get_mut(&model_class) {
            ids.retain(|existing| existing != id);
            if ids.is_empty() {
                drop(ids); // Release the lock before removing
                self.class_index.remove(&model_class);
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for in-flight accounting. Dropping it releases the slot,
/// including on request cancellation.
pub struct InFlightGuard {
    registry: Arc<Registry>,
    id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.end_attempt(&self.id);
    }
}
