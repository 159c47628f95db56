use chrono::NaiveDateTime;
use metrics_exporter_prometheus::PrometheusHandle;
use siteline::availability::{AvailabilityMonitor, WeeklySchedule};
use siteline::config::LeadConfig;
use siteline::error::AppError;
use siteline::leads::{HttpLeadSubmitter, LogTracker, SubmissionController};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) availability: Arc<AvailabilityMonitor>,
    pub(crate) schedule: Arc<WeeklySchedule>,
}

pub(crate) type LeadController = SubmissionController<HttpLeadSubmitter, LogTracker>;

pub(crate) fn build_lead_controller(config: &LeadConfig) -> Result<LeadController, AppError> {
    let submitter = HttpLeadSubmitter::from_config(config)?;
    Ok(SubmissionController::new(Arc::new(submitter), Arc::new(LogTracker))
        .with_reset_delay(config.reset_delay))
}

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub(crate) fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| format!("failed to parse '{raw}' as YYYY-MM-DDTHH:MM"))
}
