//! Attempt state machine and outcome records.

use crate::expert::ExpertError;
use serde::Serialize;

/// Dispatch progress over the ordered candidate list.
///
/// Kept explicit rather than implicit in control flow so the failover
/// policy is testable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No attempt started yet
    Pending,
    /// Attempting candidate at this index
    Attempting(usize),
    /// A candidate answered; index of the winning attempt
    Succeeded(usize),
    /// Every permitted attempt failed
    Exhausted,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Succeeded(_) | DispatchState::Exhausted)
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AttemptOutcome {
    Success,
    Timeout,
    Upstream { status: u16 },
    Network,
    InvalidResponse,
}

impl AttemptOutcome {
    pub fn from_error(error: &ExpertError) -> Self {
        match error {
            ExpertError::Timeout(_) => AttemptOutcome::Timeout,
            ExpertError::Upstream { status, .. } => AttemptOutcome::Upstream { status: *status },
            ExpertError::Network(_) => AttemptOutcome::Network,
            ExpertError::InvalidResponse(_) => AttemptOutcome::InvalidResponse,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }

    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Timeout => "timeout",
            AttemptOutcome::Upstream { .. } => "upstream",
            AttemptOutcome::Network => "network",
            AttemptOutcome::InvalidResponse => "invalid_response",
        }
    }
}

/// One attempt as recorded in the routing decision and error detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub endpoint_id: String,
    pub region: String,
    pub outcome: AttemptOutcome,
    pub latency_ms: u64,
}
