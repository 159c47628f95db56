//! Contact-form lead intake: field state, validation, delivery to the intake
//! endpoint and the confirmation/reset cycle.

mod controller;
pub mod domain;
mod tracking;
mod transport;
pub mod validation;

#[cfg(test)]
mod tests;

pub use controller::{
    FormError, SubmissionController, SubmissionError, SubmissionSnapshot, AUTO_RESET_DELAY,
    NETWORK_ERROR_MESSAGE,
};
pub use domain::{ContactFormData, FormField, UnknownField};
pub use tracking::{
    EventParams, EventTracker, LogTracker, NoopTracker, TrackingError, LEAD_SUBMISSION_FAILED,
    LEAD_SUBMITTED,
};
pub use transport::{HttpLeadSubmitter, LeadReceipt, LeadSubmitter, TransportError};
