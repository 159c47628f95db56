use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::leads::{
    ContactFormData, EventParams, EventTracker, FormField, LeadReceipt, LeadSubmitter,
    SubmissionController, TrackingError, TransportError,
};

pub(super) type Controller = SubmissionController<ScriptedSubmitter, MemoryTracker>;

pub(super) fn accepted() -> Result<LeadReceipt, TransportError> {
    Ok(LeadReceipt {
        success: true,
        message: None,
    })
}

pub(super) fn rejected(message: Option<&str>) -> Result<LeadReceipt, TransportError> {
    Ok(LeadReceipt {
        success: false,
        message: message.map(str::to_string),
    })
}

pub(super) fn server_error() -> Result<LeadReceipt, TransportError> {
    Err(TransportError::Http {
        status: 500,
        status_text: "Internal Server Error".to_string(),
    })
}

pub(super) fn connection_refused() -> Result<LeadReceipt, TransportError> {
    Err(TransportError::Network("connection refused".to_string()))
}

/// Replays canned responses in order, accepting once the script runs out.
#[derive(Default)]
pub(super) struct ScriptedSubmitter {
    script: Mutex<VecDeque<Result<LeadReceipt, TransportError>>>,
    received: Mutex<Vec<ContactFormData>>,
    gate: Option<Gate>,
}

pub(super) struct Gate {
    pub(super) started: Notify,
    pub(super) release: Notify,
}

impl ScriptedSubmitter {
    pub(super) fn replying(
        responses: impl IntoIterator<Item = Result<LeadReceipt, TransportError>>,
    ) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Blocks every delivery until the test releases it.
    pub(super) fn gated() -> Self {
        Self {
            gate: Some(Gate {
                started: Notify::new(),
                release: Notify::new(),
            }),
            ..Self::default()
        }
    }

    pub(super) fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("submitter built with gated()")
    }

    pub(super) fn received(&self) -> Vec<ContactFormData> {
        self.received.lock().expect("received mutex").clone()
    }
}

#[async_trait]
impl LeadSubmitter for ScriptedSubmitter {
    async fn submit(&self, form: &ContactFormData) -> Result<LeadReceipt, TransportError> {
        self.received
            .lock()
            .expect("received mutex")
            .push(form.clone());
        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        self.script
            .lock()
            .expect("script mutex")
            .pop_front()
            .unwrap_or_else(accepted)
    }
}

#[derive(Default)]
pub(super) struct MemoryTracker {
    events: Mutex<Vec<(String, EventParams)>>,
    fail: bool,
}

impl MemoryTracker {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn events(&self) -> Vec<(String, EventParams)> {
        self.events.lock().expect("events mutex").clone()
    }
}

impl EventTracker for MemoryTracker {
    fn track(&self, event: &str, params: EventParams) -> Result<(), TrackingError> {
        self.events
            .lock()
            .expect("events mutex")
            .push((event.to_string(), params));
        if self.fail {
            return Err(TrackingError::Transport("collector offline".to_string()));
        }
        Ok(())
    }
}

pub(super) fn controller(submitter: ScriptedSubmitter) -> (Controller, Arc<ScriptedSubmitter>, Arc<MemoryTracker>) {
    let submitter = Arc::new(submitter);
    let tracker = Arc::new(MemoryTracker::default());
    let controller = SubmissionController::new(submitter.clone(), tracker.clone());
    (controller, submitter, tracker)
}

pub(super) fn fill_valid_form(controller: &Controller) {
    controller.update_field(FormField::Name, "Jo");
    controller.update_field(FormField::Phone, "5551234567");
    controller.update_field(FormField::Email, "a@b.com");
    controller.update_field(FormField::Service, "pumping");
    controller.update_field(FormField::Urgency, "routine");
}

pub(super) fn valid_form() -> ContactFormData {
    ContactFormData {
        name: "Jo".to_string(),
        phone: "5551234567".to_string(),
        email: "a@b.com".to_string(),
        service: "pumping".to_string(),
        urgency: "routine".to_string(),
        ..ContactFormData::default()
    }
}
