//! Fan-out engine behaviour against in-memory ports.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{engine, FakeDirectory, RecordingGateway};
use masjid_core::categories::PreferenceCategory;
use masjid_core::preferences::PreferenceSet;
use masjid_core::recipient::Recipient;
use masjid_events::push::{ERROR_INVALID_REGISTRATION_TOKEN, ERROR_TOKEN_NOT_REGISTERED};
use masjid_events::{FanoutConfig, FanoutError, FanoutMessage, FanoutReport};

const MASJID: i64 = 10;
const OTHER_MASJID: i64 = 20;

fn device(id: &str) -> Recipient {
    Recipient::Device(id.to_string())
}

fn general() -> FanoutMessage {
    FanoutMessage::new(MASJID, PreferenceCategory::General, "Notice", "Car park closed")
}

fn general_off() -> PreferenceSet {
    PreferenceSet {
        general: false,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Candidate selection and preferences
// ---------------------------------------------------------------------------

#[tokio::test]
async fn general_notification_reaches_only_default_enabled_device() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, Recipient::User(1), "tok-a");
    directory.subscribe(MASJID, device("d1"), "tok-d1");
    directory.subscribe(MASJID, device("d2"), "tok-d2");
    directory.set_user_prefs(1, general_off());
    directory.set_device_prefs("d2", general_off());

    let gateway = Arc::new(RecordingGateway::new());
    let report = engine(&directory, &gateway, FanoutConfig::default())
        .broadcast(&general())
        .await
        .unwrap();

    assert_eq!(gateway.sent_tokens(), vec!["tok-d1"]);
    assert_eq!(
        report,
        FanoutReport {
            total: 1,
            sent: 1,
            failed: 0,
            deactivated: 0
        }
    );
}

#[tokio::test]
async fn opt_out_only_affects_that_category() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, Recipient::User(1), "tok-a");
    directory.set_user_prefs(1, general_off());

    let gateway = Arc::new(RecordingGateway::new());
    let engine = engine(&directory, &gateway, FanoutConfig::default());

    let events = FanoutMessage::new(MASJID, PreferenceCategory::Events, "Iftar", "Friday");
    engine.broadcast(&events).await.unwrap();
    engine.broadcast(&general()).await.unwrap();

    assert_eq!(gateway.sent_tokens(), vec!["tok-a"]);
    assert_eq!(gateway.batches()[0].title, "Iftar");
}

#[tokio::test]
async fn other_masjids_and_inactive_rows_are_ignored() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, device("d1"), "tok-1");
    directory.subscribe(OTHER_MASJID, device("d2"), "tok-2");
    directory.subscribe(MASJID, device("d3"), "   ");

    let gateway = Arc::new(RecordingGateway::new());
    engine(&directory, &gateway, FanoutConfig::default())
        .broadcast(&general())
        .await
        .unwrap();

    assert_eq!(gateway.sent_tokens(), vec!["tok-1"]);
}

#[tokio::test]
async fn shared_tokens_are_sent_once() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, Recipient::User(1), "shared");
    directory.subscribe(MASJID, device("d1"), " shared ");

    let gateway = Arc::new(RecordingGateway::new());
    let report = engine(&directory, &gateway, FanoutConfig::default())
        .broadcast(&general())
        .await
        .unwrap();

    assert_eq!(gateway.sent_tokens(), vec!["shared"]);
    assert_eq!(report.total, 1);
}

#[tokio::test]
async fn no_candidates_means_no_gateway_call() {
    let directory = Arc::new(FakeDirectory::new());
    let gateway = Arc::new(RecordingGateway::new());

    let report = engine(&directory, &gateway, FanoutConfig::default())
        .broadcast(&general())
        .await
        .unwrap();

    assert_eq!(report, FanoutReport::default());
    assert!(gateway.batches().is_empty());
}

// ---------------------------------------------------------------------------
// Batching and limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tokens_are_sent_in_batches_of_at_most_500() {
    let directory = Arc::new(FakeDirectory::new());
    for i in 0..1200 {
        directory.subscribe(MASJID, device(&format!("d{i}")), &format!("tok-{i}"));
    }

    let gateway = Arc::new(RecordingGateway::new());
    let config = FanoutConfig {
        candidate_limit: 5000,
        batch_size: 10_000,
        ..FanoutConfig::default()
    };
    let report = engine(&directory, &gateway, config)
        .broadcast(&general())
        .await
        .unwrap();

    let sizes: Vec<usize> = gateway.batches().iter().map(|b| b.tokens.len()).collect();
    assert_eq!(sizes, vec![500, 500, 200]);
    assert_eq!(report.sent, 1200);
}

#[tokio::test]
async fn candidate_set_is_capped() {
    let directory = Arc::new(FakeDirectory::new());
    for i in 0..1500 {
        directory.subscribe(MASJID, device(&format!("d{i}")), &format!("tok-{i}"));
    }

    let gateway = Arc::new(RecordingGateway::new());
    let report = engine(&directory, &gateway, FanoutConfig::default())
        .broadcast(&general())
        .await
        .unwrap();

    assert_eq!(report.total, 1000);
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_tokens_are_deactivated_and_transient_ones_kept() {
    let directory = Arc::new(FakeDirectory::new());
    let dead = directory.subscribe(MASJID, device("d1"), "tok-dead");
    let malformed = directory.subscribe(MASJID, device("d2"), "tok-bad");
    let flaky = directory.subscribe(MASJID, device("d3"), "tok-flaky");
    let ok = directory.subscribe(MASJID, device("d4"), "tok-ok");

    let gateway = Arc::new(
        RecordingGateway::new()
            .failing_token("tok-dead", ERROR_TOKEN_NOT_REGISTERED)
            .failing_token("tok-bad", ERROR_INVALID_REGISTRATION_TOKEN)
            .failing_token("tok-flaky", "quota-exceeded"),
    );
    let report = engine(&directory, &gateway, FanoutConfig::default())
        .broadcast(&general())
        .await
        .unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 3);
    assert_eq!(report.deactivated, 2);
    assert!(!directory.is_active(dead));
    assert!(!directory.is_active(malformed));
    assert!(directory.is_active(flaky));
    assert!(directory.is_active(ok));
}

#[tokio::test]
async fn reconciliation_is_idempotent_across_runs() {
    let directory = Arc::new(FakeDirectory::new());
    let dead = directory.subscribe(MASJID, device("d1"), "tok-dead");
    // The same token registered on another masjid is deactivated too.
    let elsewhere = directory.subscribe(OTHER_MASJID, device("d1"), "tok-dead");
    directory.subscribe(MASJID, device("d2"), "tok-ok");

    let gateway =
        Arc::new(RecordingGateway::new().failing_token("tok-dead", ERROR_TOKEN_NOT_REGISTERED));
    let engine = engine(&directory, &gateway, FanoutConfig::default());

    let first = engine.broadcast(&general()).await.unwrap();
    assert_eq!(first.deactivated, 2);
    assert!(!directory.is_active(dead));
    assert!(!directory.is_active(elsewhere));

    let second = engine.broadcast(&general()).await.unwrap();
    assert_eq!(second.deactivated, 0);
    assert_eq!(second.total, 1, "dead token is no longer a candidate");
    assert_eq!(directory.deactivate_calls(), 1);
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gateway_outage_is_reported_not_raised() {
    let directory = Arc::new(FakeDirectory::new());
    let sub = directory.subscribe(MASJID, device("d1"), "tok-1");
    directory.subscribe(MASJID, device("d2"), "tok-2");

    let gateway = Arc::new(RecordingGateway::unavailable());
    let report = engine(&directory, &gateway, FanoutConfig::default())
        .broadcast(&general())
        .await
        .unwrap();

    assert_eq!(report.sent, 0);
    assert_eq!(report.failed, 2);
    assert_eq!(report.deactivated, 0);
    assert!(directory.is_active(sub));
}

#[tokio::test(start_paused = true)]
async fn slow_candidate_query_times_out() {
    let directory = Arc::new(FakeDirectory::new().with_query_delay(Duration::from_secs(30)));
    directory.subscribe(MASJID, device("d1"), "tok-1");

    let gateway = Arc::new(RecordingGateway::new());
    let config = FanoutConfig {
        query_timeout: Duration::from_secs(5),
        ..FanoutConfig::default()
    };
    let err = engine(&directory, &gateway, config)
        .broadcast(&general())
        .await
        .unwrap_err();

    assert_matches!(err, FanoutError::Timeout { stage: "candidates", .. });
    assert!(gateway.batches().is_empty());
}

#[tokio::test]
async fn preference_failure_aborts_before_delivery() {
    let directory = Arc::new(FakeDirectory::new().failing_preferences());
    directory.subscribe(MASJID, device("d1"), "tok-1");

    let gateway = Arc::new(RecordingGateway::new());
    let err = engine(&directory, &gateway, FanoutConfig::default())
        .broadcast(&general())
        .await
        .unwrap_err();

    assert_matches!(err, FanoutError::Database(_));
    assert!(gateway.batches().is_empty());
}

// ---------------------------------------------------------------------------
// Reply to question author
// ---------------------------------------------------------------------------

fn reply() -> FanoutMessage {
    FanoutMessage::new(
        MASJID,
        PreferenceCategory::Questions,
        "Your question was answered",
        "Zakat",
    )
}

#[tokio::test]
async fn reply_to_user_matches_by_user_id() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, Recipient::User(1), "tok-author");
    directory.subscribe(MASJID, Recipient::User(2), "tok-other");
    directory.subscribe(MASJID, device("d1"), "tok-device");

    let gateway = Arc::new(RecordingGateway::new());
    engine(&directory, &gateway, FanoutConfig::default())
        .notify_question_author(&Recipient::User(1), &reply())
        .await
        .unwrap();

    assert_eq!(gateway.sent_tokens(), vec!["tok-author"]);
}

#[tokio::test]
async fn reply_to_user_without_subscription_sends_nothing() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, device("d1"), "tok-device");

    let gateway = Arc::new(RecordingGateway::new());
    let report = engine(&directory, &gateway, FanoutConfig::default())
        .notify_question_author(&Recipient::User(1), &reply())
        .await
        .unwrap();

    assert_eq!(report.total, 0);
    assert!(gateway.batches().is_empty());
}

#[tokio::test]
async fn reply_to_device_prefers_exact_match() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, device("d1"), "tok-d1");
    directory.subscribe(MASJID, device("d2"), "tok-d2");

    let gateway = Arc::new(RecordingGateway::new());
    engine(&directory, &gateway, FanoutConfig::default())
        .notify_question_author(&device("d1"), &reply())
        .await
        .unwrap();

    assert_eq!(gateway.sent_tokens(), vec!["tok-d1"]);
}

#[tokio::test]
async fn reply_to_unmatched_device_falls_back_to_all_anonymous() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, device("d1"), "tok-d1");
    directory.subscribe(MASJID, device("d2"), "tok-d2");
    directory.subscribe(MASJID, Recipient::User(1), "tok-user");

    let gateway = Arc::new(RecordingGateway::new());
    engine(&directory, &gateway, FanoutConfig::default())
        .notify_question_author(&device("drifted"), &reply())
        .await
        .unwrap();

    let mut sent = gateway.sent_tokens();
    sent.sort();
    assert_eq!(sent, vec!["tok-d1", "tok-d2"]);
}

#[tokio::test]
async fn reply_fallback_can_be_disabled() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, device("d1"), "tok-d1");

    let gateway = Arc::new(RecordingGateway::new());
    let config = FanoutConfig {
        reply_anonymous_fallback: false,
        ..FanoutConfig::default()
    };
    engine(&directory, &gateway, config)
        .notify_question_author(&device("drifted"), &reply())
        .await
        .unwrap();

    assert!(gateway.batches().is_empty());
}

#[tokio::test]
async fn reply_respects_questions_preference() {
    let directory = Arc::new(FakeDirectory::new());
    directory.subscribe(MASJID, device("d1"), "tok-d1");
    directory.set_device_prefs(
        "d1",
        PreferenceSet {
            questions: false,
            ..Default::default()
        },
    );

    let gateway = Arc::new(RecordingGateway::new());
    engine(&directory, &gateway, FanoutConfig::default())
        .notify_question_author(&device("d1"), &reply())
        .await
        .unwrap();

    assert!(gateway.batches().is_empty());
}
