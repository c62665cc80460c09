mod common;

use common::{input, ScriptedSink};
use kneadback_client::{ApiClient, ClientError, OfflineQueue, QueueState, SubmitOutcome, Submitter};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

fn queue_in(temp: &TempDir) -> OfflineQueue {
    OfflineQueue::new(temp.path().join("queue.jsonl")).with_backoff(Duration::ZERO)
}

#[test]
fn contact_precondition_rejects_before_delivery() {
    let temp = TempDir::new().expect("temp dir");
    let sink = ScriptedSink::default();
    let submitter = Submitter::new(&sink, queue_in(&temp));

    let mut record = input("call me");
    record.contact.allowed = true;
    record.contact.email = "a@example.com".to_string();

    let err = submitter.submit(&record).unwrap_err();
    assert!(matches!(err, ClientError::Precondition(_)));
    assert_eq!(sink.attempts(), 0);
    assert_eq!(
        submitter.queue().status().expect("status"),
        QueueState::Empty
    );
}

#[test]
fn delivered_submission_is_not_queued() {
    let temp = TempDir::new().expect("temp dir");
    let sink = ScriptedSink::default();
    let submitter = Submitter::new(&sink, queue_in(&temp));

    match submitter.submit(&input("great")).expect("submit") {
        SubmitOutcome::Delivered(record) => assert_eq!(record.feedback.notes, "great"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!submitter.queue().path().exists());
}

#[test]
fn failed_delivery_is_queued_then_synced() {
    let temp = TempDir::new().expect("temp dir");
    let failing = ScriptedSink::failing(&["later"]);
    let submitter = Submitter::new(&failing, queue_in(&temp));

    let outcome = submitter.submit(&input("later")).expect("submit");
    match outcome {
        SubmitOutcome::Queued { reason } => assert!(reason.contains("503")),
        other => panic!("unexpected outcome: {other:?}"),
    }

    let healthy = ScriptedSink::default();
    let report = Submitter::new(&healthy, queue_in(&temp))
        .sync()
        .expect("sync");
    assert_eq!(report.succeeded, 1);
    assert_eq!(healthy.delivered(), vec!["later"]);
}

#[test]
fn unreachable_server_queues_submission() {
    let temp = TempDir::new().expect("temp dir");
    let api = ApiClient::new(
        Url::parse("http://127.0.0.1:1").expect("url"),
        Duration::from_secs(1),
    )
    .expect("client");
    let submitter = Submitter::new(api, queue_in(&temp));

    let outcome = submitter.submit(&input("offline")).expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Queued { .. }));
    assert_eq!(
        submitter.queue().status().expect("status"),
        QueueState::Pending { entries: 1 }
    );
}
