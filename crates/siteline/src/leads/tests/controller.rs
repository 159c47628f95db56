use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::common::*;
use crate::leads::{
    ContactFormData, FormField, SubmissionController, SubmissionError, AUTO_RESET_DELAY,
    LEAD_SUBMISSION_FAILED, LEAD_SUBMITTED, NETWORK_ERROR_MESSAGE,
};

#[tokio::test]
async fn valid_lead_is_delivered_and_confirmed() {
    let (controller, submitter, tracker) = controller(ScriptedSubmitter::replying([accepted()]));
    fill_valid_form(&controller);
    assert!(controller.validate());
    assert!(controller.can_submit());

    controller.submit_form().await.expect("lead accepted");

    let snapshot = controller.snapshot();
    assert!(snapshot.show_success);
    assert_eq!(snapshot.submit_count, 1);
    assert!(!snapshot.is_submitting);
    assert!(snapshot.errors.is_empty());
    assert_eq!(submitter.received(), vec![valid_form()]);

    let events = tracker.events();
    assert_eq!(events.len(), 1);
    let (name, params) = &events[0];
    assert_eq!(name, LEAD_SUBMITTED);
    assert_eq!(params["service"], json!("pumping"));
    assert_eq!(params["urgency"], json!("routine"));
    assert_eq!(params["attempt"], json!(1));
}

#[tokio::test(start_paused = true)]
async fn form_resets_after_the_confirmation_delay() {
    let (controller, _, _) = controller(ScriptedSubmitter::default());
    fill_valid_form(&controller);
    controller.submit_form().await.expect("lead accepted");
    assert!(controller.is_reset_pending());

    tokio::time::sleep(AUTO_RESET_DELAY - Duration::from_millis(1)).await;
    assert_eq!(controller.form_data(), valid_form());
    assert!(controller.snapshot().show_success);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.form_data, ContactFormData::default());
    assert!(!snapshot.show_success);
    assert_eq!(snapshot.submit_count, 1, "lifetime count survives the reset");
    assert!(!controller.is_reset_pending());
}

#[tokio::test(start_paused = true)]
async fn custom_reset_delay_is_honored() {
    let submitter = Arc::new(ScriptedSubmitter::default());
    let tracker = Arc::new(MemoryTracker::default());
    let controller = SubmissionController::new(submitter, tracker)
        .with_reset_delay(Duration::from_millis(250));
    fill_valid_form(&controller);
    controller.submit_form().await.expect("lead accepted");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(controller.form_data(), ContactFormData::default());
}

#[tokio::test]
async fn http_failure_keeps_the_form_and_reports_status() {
    let (controller, _, tracker) = controller(ScriptedSubmitter::replying([server_error()]));
    fill_valid_form(&controller);

    let err = controller.submit_form().await.expect_err("500 is a failure");
    assert_eq!(
        err,
        SubmissionError::Http {
            status: 500,
            status_text: "Internal Server Error".to_string()
        }
    );

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_submitting);
    assert!(!snapshot.show_success);
    assert_eq!(snapshot.errors, vec!["HTTP 500: Internal Server Error".to_string()]);
    assert_eq!(snapshot.form_data, valid_form());
    assert_eq!(snapshot.submit_count, 0);
    assert!(!controller.is_reset_pending());

    let events = tracker.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, LEAD_SUBMISSION_FAILED);
    assert_eq!(events[0].1["attempt"], json!(1));
    assert_eq!(events[0].1["error"], json!("HTTP 500: Internal Server Error"));
}

#[tokio::test]
async fn server_rejection_uses_its_message_or_a_fallback() {
    let (controller, _, _) = controller(ScriptedSubmitter::replying([
        rejected(Some("We do not serve that area yet")),
        rejected(None),
        rejected(Some("")),
    ]));
    fill_valid_form(&controller);

    let err = controller.submit_form().await.expect_err("rejected");
    assert_eq!(err, SubmissionError::Server("We do not serve that area yet".to_string()));
    assert_eq!(controller.snapshot().errors, vec!["We do not serve that area yet"]);

    controller.submit_form().await.expect_err("rejected");
    assert_eq!(controller.snapshot().errors, vec!["Submission failed"]);

    controller.submit_form().await.expect_err("rejected");
    assert_eq!(controller.snapshot().errors, vec!["Submission failed"]);
    assert_eq!(controller.form_data(), valid_form());
}

#[tokio::test]
async fn network_failure_shows_the_generic_message() {
    let (controller, _, tracker) = controller(ScriptedSubmitter::replying([connection_refused()]));
    fill_valid_form(&controller);

    let err = controller.submit_form().await.expect_err("network failure");
    assert!(matches!(err, SubmissionError::Network(ref detail) if detail == "connection refused"));
    assert!(err.is_transmitted());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.errors, vec![NETWORK_ERROR_MESSAGE.to_string()]);
    assert!(!snapshot.is_submitting);
    assert_eq!(snapshot.form_data, valid_form());
    assert_eq!(tracker.events()[0].0, LEAD_SUBMISSION_FAILED);
}

#[tokio::test]
async fn retry_after_failure_succeeds_and_counts_once() {
    let (controller, submitter, tracker) =
        controller(ScriptedSubmitter::replying([server_error(), accepted()]));
    fill_valid_form(&controller);

    controller.submit_form().await.expect_err("first attempt fails");
    controller.submit_form().await.expect("second attempt succeeds");

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.submit_count, 1);
    assert!(snapshot.errors.is_empty());
    assert_eq!(submitter.received().len(), 2);

    let events = tracker.events();
    assert_eq!(events[1].0, LEAD_SUBMITTED);
    assert_eq!(events[1].1["attempt"], json!(1));
}

#[tokio::test]
async fn invalid_form_is_not_sent_and_errors_clear_per_field() {
    let (controller, submitter, tracker) = controller(ScriptedSubmitter::default());
    controller.update_field(FormField::Name, "Jo");
    controller.update_field(FormField::Phone, "555");
    controller.update_field(FormField::Service, "pumping");

    let err = controller.submit_form().await.expect_err("incomplete form");
    assert_eq!(
        err,
        SubmissionError::Invalid(vec![FormField::Phone, FormField::Email])
    );
    assert!(submitter.received().is_empty());
    assert!(tracker.events().is_empty());

    let fields: Vec<_> = controller.errors().into_iter().map(|e| e.field).collect();
    assert_eq!(fields, vec![Some(FormField::Phone), Some(FormField::Email)]);

    controller.update_field(FormField::Phone, "5551234567");
    let remaining: Vec<_> = controller.errors().into_iter().map(|e| e.field).collect();
    assert_eq!(remaining, vec![Some(FormField::Email)]);

    controller.update_field(FormField::Email, "a@b.com");
    assert!(controller.errors().is_empty());
    controller.submit_form().await.expect("now valid");
}

#[tokio::test]
async fn editing_a_field_leaves_unrelated_errors_alone() {
    let (controller, _, _) =
        controller(ScriptedSubmitter::replying([rejected(Some("Invalid email or phone"))]));
    fill_valid_form(&controller);
    controller.submit_form().await.expect_err("rejected");

    controller.update_field(FormField::Email, "jo@example.com");
    controller.update_field(FormField::Phone, "5559876543");
    assert_eq!(controller.snapshot().errors, vec!["Invalid email or phone"]);
}

#[tokio::test]
async fn phone_rule_counts_characters_not_digits() {
    let (controller, _, _) = controller(ScriptedSubmitter::default());
    fill_valid_form(&controller);

    for value in [
        "5551234567",
        "(555) 123-",
        "aaaaaaaaaa",
        "555123456",
        "   555123456   ",
        "  5551234567 ",
        "",
    ] {
        controller.update_field(FormField::Phone, value);
        let expected = value.trim().chars().count() >= 10;
        assert_eq!(controller.validate(), expected, "phone {value:?}");
        assert_eq!(controller.snapshot().is_valid, expected, "phone {value:?}");
    }
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let (controller, submitter, _) = controller(ScriptedSubmitter::gated());
    fill_valid_form(&controller);

    let (first, second) = tokio::join!(controller.submit_form(), async {
        submitter.gate().started.notified().await;
        let snapshot = controller.snapshot();
        assert!(snapshot.is_submitting);
        assert!(!snapshot.can_submit);
        let second = controller.submit_form().await;
        submitter.gate().release.notify_one();
        second
    });

    assert_eq!(first, Ok(()));
    assert_eq!(second, Err(SubmissionError::InFlight));
    assert_eq!(submitter.received().len(), 1);
    assert_eq!(controller.snapshot().submit_count, 1);
}

#[tokio::test(start_paused = true)]
async fn reset_during_delivery_abandons_it_and_keeps_new_input() {
    let (controller, submitter, tracker) = controller(ScriptedSubmitter::gated());
    fill_valid_form(&controller);

    let (first, _) = tokio::join!(controller.submit_form(), async {
        submitter.gate().started.notified().await;
        controller.reset_form();
    });
    assert_eq!(first, Err(SubmissionError::Cancelled));

    fill_valid_form(&controller);
    controller.update_field(FormField::Name, "Sam");
    let snapshot = controller.snapshot();
    assert!(!snapshot.is_submitting);
    assert!(!snapshot.show_success);
    assert_eq!(snapshot.submit_count, 0);
    assert!(!controller.is_reset_pending());

    tokio::time::sleep(AUTO_RESET_DELAY * 2).await;
    assert_eq!(controller.form_data().name, "Sam");
    assert!(tracker.events().is_empty());

    submitter.gate().release.notify_one();
    controller.submit_form().await.expect("second lead accepted");

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.submit_count, 1);
    assert!(snapshot.show_success);
    assert_eq!(snapshot.form_data.name, "Sam");
    let received = submitter.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1].name, "Sam");
    assert_eq!(tracker.events().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_submission_releases_the_form() {
    let (controller, submitter, tracker) = controller(ScriptedSubmitter::gated());
    fill_valid_form(&controller);

    let timed_out = tokio::time::timeout(Duration::from_secs(1), controller.submit_form()).await;
    assert!(timed_out.is_err());

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_submitting);
    assert!(snapshot.can_submit);
    assert_eq!(snapshot.form_data, valid_form());
    assert!(tracker.events().is_empty());

    submitter.gate().release.notify_one();
    assert_eq!(controller.submit_form().await, Ok(()));
    assert_eq!(controller.snapshot().submit_count, 1);
}

#[tokio::test]
async fn shutdown_aborts_the_in_flight_delivery() {
    let (controller, submitter, tracker) = controller(ScriptedSubmitter::gated());
    fill_valid_form(&controller);

    let (outcome, _) = tokio::join!(controller.submit_form(), async {
        submitter.gate().started.notified().await;
        controller.shutdown();
    });

    assert_eq!(outcome, Err(SubmissionError::Cancelled));
    let snapshot = controller.snapshot();
    assert!(!snapshot.is_submitting);
    assert_eq!(snapshot.form_data, valid_form());
    assert!(tracker.events().is_empty());

    assert_eq!(
        controller.submit_form().await,
        Err(SubmissionError::Cancelled)
    );
}

#[tokio::test(start_paused = true)]
async fn dismissing_the_banner_keeps_the_form_and_cancels_the_reset() {
    let (controller, _, _) = controller(ScriptedSubmitter::default());
    fill_valid_form(&controller);
    controller.submit_form().await.expect("accepted");

    controller.dismiss_success();
    assert!(!controller.snapshot().show_success);
    assert!(!controller.is_reset_pending());

    tokio::time::sleep(AUTO_RESET_DELAY * 2).await;
    assert_eq!(controller.form_data(), valid_form());
}

#[tokio::test(start_paused = true)]
async fn explicit_reset_cancels_the_pending_timer() {
    let (controller, _, _) = controller(ScriptedSubmitter::default());
    fill_valid_form(&controller);
    controller.submit_form().await.expect("accepted");

    controller.reset_form();
    assert!(!controller.is_reset_pending());
    controller.update_field(FormField::Name, "Sam");

    tokio::time::sleep(AUTO_RESET_DELAY * 2).await;
    assert_eq!(controller.form_data().name, "Sam");
}

#[tokio::test(start_paused = true)]
async fn new_submission_replaces_the_pending_reset() {
    let (controller, _, _) = controller(ScriptedSubmitter::default());
    fill_valid_form(&controller);
    controller.submit_form().await.expect("first accepted");

    tokio::time::sleep(Duration::from_secs(3)).await;
    controller.submit_form().await.expect("second accepted");

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(controller.form_data(), valid_form(), "first timer was cancelled");

    tokio::time::sleep(Duration::from_secs(3)).await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.form_data, ContactFormData::default());
    assert_eq!(snapshot.submit_count, 2);
}

#[tokio::test]
async fn reset_is_idempotent() {
    let (controller, _, _) = controller(ScriptedSubmitter::replying([server_error()]));
    fill_valid_form(&controller);
    controller.update_field(FormField::Address, "12 Lakeview Rd");
    controller.submit_form().await.expect_err("fails");

    controller.reset_form();
    let once = controller.snapshot();
    controller.reset_form();
    let twice = controller.snapshot();

    assert_eq!(once, twice);
    assert_eq!(once.form_data, ContactFormData::default());
    assert!(once.errors.is_empty());
    assert!(!once.is_submitting);
    assert!(!once.show_success);
}

#[tokio::test]
async fn tracking_failures_do_not_affect_the_outcome() {
    let submitter = Arc::new(ScriptedSubmitter::default());
    let tracker = Arc::new(MemoryTracker::failing());
    let controller = SubmissionController::new(submitter, tracker.clone());
    fill_valid_form(&controller);

    controller.submit_form().await.expect("tracking is fire-and-forget");
    assert!(controller.snapshot().show_success);
    assert_eq!(tracker.events().len(), 1);
}

#[test]
fn snapshot_serializes_for_the_front_end() {
    let (controller, _, _) = controller(ScriptedSubmitter::default());
    controller.update_field(FormField::Name, "Jo");
    let json = serde_json::to_value(controller.snapshot()).expect("serializes");
    assert_eq!(json["formData"]["name"], "Jo");
    assert_eq!(json["canSubmit"], false);
    assert_eq!(json["submitCount"], 0);
    assert!(json["formData"].get("address").is_none());
    assert_eq!(
        json["fieldMessages"]["phone"],
        "Please enter a phone number we can reach you at"
    );
}
