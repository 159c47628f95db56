use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::domain::{ContactFormData, FormField};
use super::tracking::{EventParams, EventTracker, LEAD_SUBMISSION_FAILED, LEAD_SUBMITTED};
use super::transport::{LeadReceipt, LeadSubmitter, TransportError};
use super::validation;

/// Delay between a successful submission and the automatic form reset.
pub const AUTO_RESET_DELAY: Duration = Duration::from_millis(5_000);

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again or call us directly.";
const SERVER_FALLBACK_MESSAGE: &str = "Submission failed";
const INVALID_FORM_MESSAGE: &str = "Please correct the highlighted fields.";

/// An error shown to the user, optionally tied to the field it complains about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    pub field: Option<FormField>,
    pub message: String,
}

impl FormError {
    fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    fn for_field(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            message: message.into(),
        }
    }
}

/// Why a call to [`SubmissionController::submit_form`] did not deliver the lead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("form is incomplete: {0:?}")]
    Invalid(Vec<FormField>),
    #[error("a submission is already in flight")]
    InFlight,
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },
    #[error("lead rejected: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("submission cancelled")]
    Cancelled,
}

impl SubmissionError {
    /// Text placed in the visible error list.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Invalid(_) => INVALID_FORM_MESSAGE.to_string(),
            SubmissionError::InFlight => "Your request is already being sent.".to_string(),
            SubmissionError::Http {
                status,
                status_text,
            } => format!("HTTP {status}: {status_text}"),
            SubmissionError::Server(message) => message.clone(),
            SubmissionError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            SubmissionError::Cancelled => "Submission cancelled.".to_string(),
        }
    }

    /// Failures that happened after the lead left the browser.
    pub fn is_transmitted(&self) -> bool {
        matches!(
            self,
            SubmissionError::Http { .. } | SubmissionError::Server(_) | SubmissionError::Network(_)
        )
    }
}

impl From<TransportError> for SubmissionError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Http {
                status,
                status_text,
            } => SubmissionError::Http {
                status,
                status_text,
            },
            TransportError::Network(detail) => SubmissionError::Network(detail),
        }
    }
}

#[derive(Debug, Default)]
struct SubmissionState {
    form_data: ContactFormData,
    is_submitting: bool,
    errors: Vec<FormError>,
    submit_count: u64,
    show_success: bool,
    reset_generation: u64,
    submission_generation: u64,
}

impl SubmissionState {
    fn clear(&mut self) {
        self.form_data = ContactFormData::default();
        self.errors.clear();
        self.is_submitting = false;
        self.show_success = false;
    }
}

/// Read-only view of the controller for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSnapshot {
    pub form_data: ContactFormData,
    pub is_submitting: bool,
    pub errors: Vec<String>,
    pub submit_count: u64,
    pub show_success: bool,
    pub is_valid: bool,
    pub can_submit: bool,
    pub field_messages: BTreeMap<FormField, String>,
}

/// Owns the contact form and drives it through validation, delivery and the
/// post-success reset.
pub struct SubmissionController<S: ?Sized, T: ?Sized> {
    state: Arc<Mutex<SubmissionState>>,
    submitter: Arc<S>,
    tracker: Arc<T>,
    reset_delay: Duration,
    reset_timer: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    shutdown: watch::Sender<bool>,
    /// Mirrors `submission_generation`; a bump interrupts the delivery in flight.
    interrupt: watch::Sender<u64>,
}

/// Releases the in-flight flag if the submitting future is dropped early.
struct InFlightGuard<'a> {
    state: &'a Mutex<SubmissionState>,
    ticket: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_submitting && state.submission_generation == self.ticket {
            state.is_submitting = false;
            debug!(ticket = self.ticket, "abandoned submission released");
        }
    }
}

impl<S, T> SubmissionController<S, T>
where
    S: LeadSubmitter + ?Sized,
    T: EventTracker + ?Sized,
{
    pub fn new(submitter: Arc<S>, tracker: Arc<T>) -> Self {
        let (shutdown, _) = watch::channel(false);
        let (interrupt, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(SubmissionState::default())),
            submitter,
            tracker,
            reset_delay: AUTO_RESET_DELAY,
            reset_timer: Mutex::new(None),
            closed: AtomicBool::new(false),
            shutdown,
            interrupt,
        }
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn snapshot(&self) -> SubmissionSnapshot {
        let state = self.lock_state();
        let field_messages: BTreeMap<FormField, String> =
            validation::field_messages(&state.form_data)
                .into_iter()
                .map(|(field, message)| (field, message.to_string()))
                .collect();
        let is_valid = field_messages.is_empty();

        SubmissionSnapshot {
            form_data: state.form_data.clone(),
            is_submitting: state.is_submitting,
            errors: state.errors.iter().map(|error| error.message.clone()).collect(),
            submit_count: state.submit_count,
            show_success: state.show_success,
            is_valid,
            can_submit: is_valid && !state.is_submitting,
            field_messages,
        }
    }

    pub fn form_data(&self) -> ContactFormData {
        self.lock_state().form_data.clone()
    }

    pub fn errors(&self) -> Vec<FormError> {
        self.lock_state().errors.clone()
    }

    pub fn validate(&self) -> bool {
        validation::is_valid(&self.lock_state().form_data)
    }

    pub fn can_submit(&self) -> bool {
        let state = self.lock_state();
        !state.is_submitting && validation::is_valid(&state.form_data)
    }

    /// Set one field and drop any error raised against it.
    pub fn update_field(&self, field: FormField, value: impl Into<String>) {
        let mut state = self.lock_state();
        state.form_data.set(field, value.into());
        state.errors.retain(|error| error.field != Some(field));
    }

    /// Validate and deliver the current form.
    ///
    /// Transport and server failures leave the form untouched and populate the
    /// error list; a success shows the confirmation and schedules the reset.
    /// A [`reset_form`](Self::reset_form) or [`shutdown`](Self::shutdown)
    /// while the delivery is pending abandons it with
    /// [`SubmissionError::Cancelled`].
    pub async fn submit_form(&self) -> Result<(), SubmissionError> {
        let (ticket, form_data, interrupted) = {
            let mut state = self.lock_state();
            if self.closed.load(Ordering::Acquire) {
                return Err(SubmissionError::Cancelled);
            }
            if state.is_submitting {
                warn!("submission requested while another is in flight");
                return Err(SubmissionError::InFlight);
            }
            self.cancel_auto_reset(&mut state);

            let failures = validation::field_messages(&state.form_data);
            if !failures.is_empty() {
                state.errors = failures
                    .iter()
                    .map(|(field, message)| FormError::for_field(*field, *message))
                    .collect();
                return Err(SubmissionError::Invalid(failures.into_keys().collect()));
            }

            state.errors.clear();
            state.is_submitting = true;
            state.submission_generation += 1;
            let ticket = state.submission_generation;
            self.interrupt.send_replace(ticket);
            (ticket, state.form_data.clone(), self.interrupt.subscribe())
        };
        let _guard = InFlightGuard {
            state: &self.state,
            ticket,
        };

        debug!(ticket, service = %form_data.service, urgency = %form_data.urgency, "submitting lead");
        let shutdown = self.shutdown.subscribe();
        let delivery = tokio::select! {
            outcome = self.submitter.submit(&form_data) => Some(outcome),
            _ = wait_for_shutdown(shutdown) => None,
            _ = wait_for_interrupt(interrupted, ticket) => None,
        };

        let Some(outcome) = delivery else {
            info!(ticket, "in-flight submission abandoned");
            return Err(SubmissionError::Cancelled);
        };

        match interpret(outcome) {
            Ok(()) => {
                let attempt = {
                    let mut state = self.lock_state();
                    if state.submission_generation != ticket {
                        return Err(SubmissionError::Cancelled);
                    }
                    state.submit_count += 1;
                    state.is_submitting = false;
                    state.show_success = true;
                    self.schedule_auto_reset(&mut state);
                    state.submit_count
                };
                info!(attempt, service = %form_data.service, "lead submitted");
                self.emit(
                    LEAD_SUBMITTED,
                    BTreeMap::from([
                        ("service".to_string(), json!(form_data.service)),
                        ("urgency".to_string(), json!(form_data.urgency)),
                        ("attempt".to_string(), json!(attempt)),
                    ]),
                );
                Ok(())
            }
            Err(error) => {
                let attempt = {
                    let mut state = self.lock_state();
                    if state.submission_generation != ticket {
                        return Err(SubmissionError::Cancelled);
                    }
                    state.is_submitting = false;
                    state.errors = vec![FormError::general(error.user_message())];
                    state.submit_count + 1
                };
                warn!(attempt, %error, "lead submission failed");
                self.emit(
                    LEAD_SUBMISSION_FAILED,
                    BTreeMap::from([
                        ("error".to_string(), json!(error.to_string())),
                        ("attempt".to_string(), json!(attempt)),
                    ]),
                );
                Err(error)
            }
        }
    }

    /// Return to an empty form. The lifetime submission count is kept and a
    /// pending delivery is abandoned without touching the new state.
    pub fn reset_form(&self) {
        let mut state = self.lock_state();
        self.cancel_auto_reset(&mut state);
        if state.is_submitting {
            state.submission_generation += 1;
            self.interrupt.send_replace(state.submission_generation);
        }
        state.clear();
    }

    /// Hide the confirmation banner without discarding what was typed.
    pub fn dismiss_success(&self) {
        let mut state = self.lock_state();
        self.cancel_auto_reset(&mut state);
        state.show_success = false;
    }

    /// Tear down: cancel the pending reset and abort any in-flight delivery.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        self.shutdown.send_replace(true);
        let mut state = self.lock_state();
        self.cancel_auto_reset(&mut state);
    }

    pub fn is_reset_pending(&self) -> bool {
        self.reset_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn lock_state(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_auto_reset(&self, state: &mut SubmissionState) {
        state.reset_generation += 1;
        let pending = self
            .reset_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = pending {
            task.abort();
            debug!("pending auto-reset cancelled");
        }
    }

    fn schedule_auto_reset(&self, state: &mut SubmissionState) {
        self.cancel_auto_reset(state);
        let generation = state.reset_generation;
        let shared = Arc::clone(&self.state);
        let delay = self.reset_delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.reset_generation == generation {
                state.clear();
                debug!("form auto-reset after successful submission");
            }
        });

        *self
            .reset_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    fn emit(&self, event: &str, params: EventParams) {
        if let Err(err) = self.tracker.track(event, params) {
            warn!(event_name = event, error = %err, "dropping analytics event");
        }
    }
}

impl<S: ?Sized, T: ?Sized> Drop for SubmissionController<S, T> {
    fn drop(&mut self) {
        let pending = self
            .reset_timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = pending {
            task.abort();
        }
    }
}

fn interpret(outcome: Result<LeadReceipt, TransportError>) -> Result<(), SubmissionError> {
    let receipt = outcome?;
    if receipt.success {
        return Ok(());
    }
    let message = receipt
        .message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| SERVER_FALLBACK_MESSAGE.to_string());
    Err(SubmissionError::Server(message))
}

async fn wait_for_interrupt(mut interrupt: watch::Receiver<u64>, ticket: u64) {
    loop {
        let current = *interrupt.borrow_and_update();
        if current != ticket || interrupt.changed().await.is_err() {
            return;
        }
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    loop {
        let closed = *shutdown.borrow_and_update();
        if closed || shutdown.changed().await.is_err() {
            return;
        }
    }
}
