use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

pub const LEAD_SUBMITTED: &str = "lead_submitted";
pub const LEAD_SUBMISSION_FAILED: &str = "lead_submission_failed";

pub type EventParams = BTreeMap<String, Value>;

/// Outbound analytics hook. Callers treat delivery as fire-and-forget.
pub trait EventTracker: Send + Sync {
    fn track(&self, event: &str, params: EventParams) -> Result<(), TrackingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("tracking transport unavailable: {0}")]
    Transport(String),
}

/// Writes every event to the log instead of an analytics backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracker;

impl EventTracker for LogTracker {
    fn track(&self, event: &str, params: EventParams) -> Result<(), TrackingError> {
        let params = serde_json::to_string(&params)
            .map_err(|err| TrackingError::Transport(err.to_string()))?;
        info!(event_name = event, %params, "analytics event");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

impl EventTracker for NoopTracker {
    fn track(&self, _event: &str, _params: EventParams) -> Result<(), TrackingError> {
        Ok(())
    }
}
