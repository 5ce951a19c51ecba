// tests/engine_tests.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mockall::{mock, predicate::eq, Sequence};

use couponbot_common::models::{RewardItem, RewardResponse};
use couponbot_common::traits::api::RewardClient;
use couponbot_core::services::redemption::{AccountBatch, RedemptionEngine, Severity};
use couponbot_core::test_utils::{journal_entries, push_journal, registration, FixedClock, RecordingPacer};
use couponbot_core::Error;

mock! {
    pub Rewards {}

    #[async_trait]
    impl RewardClient for Rewards {
        async fn redeem(&self, account_id: &str, code: &str) -> Result<RewardResponse, Error>;
    }
}

fn three_accounts() -> AccountBatch {
    AccountBatch::new(vec![
        registration("PID-A", "Alpha", "1"),
        registration("PID-B", "Bravo", "2"),
        registration("PID-C", "Charlie", "3"),
    ])
    .expect("non-empty")
}

fn engine_with(client: MockRewards, journal: Arc<Mutex<Vec<String>>>) -> RedemptionEngine {
    RedemptionEngine::new(Arc::new(client), Duration::from_millis(2000))
        .with_pacer(Arc::new(RecordingPacer::new(journal)))
}

#[test]
fn empty_account_list_cannot_form_a_batch() {
    assert!(AccountBatch::new(Vec::new()).is_none());
}

#[tokio::test]
async fn partial_success_keeps_input_order() {
    let mut client = MockRewards::new();
    let mut seq = Sequence::new();
    client
        .expect_redeem()
        .with(eq("PID-A"), eq("SPRING"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| {
            Ok(RewardResponse::success(
                "Reward sent",
                Some(vec![RewardItem::new("Diamond", "30")]),
            ))
        });
    client
        .expect_redeem()
        .with(eq("PID-B"), eq("SPRING"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(RewardResponse::failure("Already redeemed")));
    client
        .expect_redeem()
        .with(eq("PID-C"), eq("SPRING"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(RewardResponse::success("Reward sent", None)));

    let engine = engine_with(client, Arc::new(Mutex::new(Vec::new())));
    let result = engine.redeem_all(&three_accounts(), "SPRING").await;

    let summary: Vec<_> = result
        .outcomes
        .iter()
        .map(|o| (o.account_label.as_str(), o.succeeded, o.message.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Alpha", true, "Reward sent"),
            ("Bravo", false, "Already redeemed"),
            ("Charlie", true, "Reward sent"),
        ]
    );
    assert_eq!(result.outcomes[0].owner_id, "1");
    assert_eq!(result.outcomes[0].reward_items.as_ref().map(Vec::len), Some(1));
    assert!(result.outcomes.iter().all(|o| o.code == "SPRING"));
    assert_eq!(result.success_count(), 2);
    assert_eq!(result.total_count(), 3);
    assert_eq!(result.severity(), Severity::PartialSuccess);
}

#[tokio::test]
async fn transport_error_is_isolated_to_one_account() {
    let mut client = MockRewards::new();
    client.expect_redeem().returning(|pid, _| match pid {
        "PID-B" => Err(Error::RewardRequest("connection reset by peer".into())),
        _ => Ok(RewardResponse::success("Reward sent", None)),
    });

    let engine = engine_with(client, Arc::new(Mutex::new(Vec::new())));
    let result = engine.redeem_all(&three_accounts(), "CODE").await;

    assert_eq!(result.total_count(), 3);
    assert!(result.outcomes[0].succeeded);
    assert!(!result.outcomes[1].succeeded);
    assert!(result.outcomes[1].message.starts_with("Error:"), "{}", result.outcomes[1].message);
    assert!(result.outcomes[1].message.contains("connection reset by peer"));
    assert!(result.outcomes[1].reward_items.is_none());
    assert!(result.outcomes[2].succeeded);
    assert_eq!(result.severity(), Severity::PartialSuccess);
}

#[tokio::test]
async fn all_failures_still_produce_a_full_report() {
    let mut client = MockRewards::new();
    client
        .expect_redeem()
        .times(3)
        .returning(|_, _| Err(Error::RewardRequest("timed out".into())));

    let engine = engine_with(client, Arc::new(Mutex::new(Vec::new())));
    let result = engine.redeem_all(&three_accounts(), "CODE").await;

    assert_eq!(result.total_count(), 3);
    assert_eq!(result.success_count(), 0);
    assert_eq!(result.severity(), Severity::AllFailure);
}

#[tokio::test]
async fn every_request_is_preceded_by_a_pause() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let client_journal = journal.clone();

    let mut client = MockRewards::new();
    client.expect_redeem().times(3).returning(move |pid, _| {
        push_journal(&client_journal, format!("redeem:{pid}"));
        Ok(RewardResponse::success("ok", None))
    });

    let engine = engine_with(client, journal.clone());
    let result = engine.redeem_all(&three_accounts(), "CODE").await;

    assert_eq!(result.severity(), Severity::AllSuccess);
    assert_eq!(
        journal_entries(&journal),
        vec![
            "pause:2000",
            "redeem:PID-A",
            "pause:2000",
            "redeem:PID-B",
            "pause:2000",
            "redeem:PID-C",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn batch_takes_at_least_one_delay_per_account() {
    let mut client = MockRewards::new();
    client
        .expect_redeem()
        .times(3)
        .returning(|_, _| Ok(RewardResponse::success("ok", None)));

    let delay = Duration::from_millis(2000);
    // Default pacer: real tokio sleeps, on tokio's paused test clock.
    let engine = RedemptionEngine::new(Arc::new(client), delay);

    let start = tokio::time::Instant::now();
    let result = engine.redeem_all(&three_accounts(), "CODE").await;

    assert_eq!(result.total_count(), 3);
    assert!(start.elapsed() >= delay * 3, "elapsed {:?}", start.elapsed());
}

#[tokio::test]
async fn batch_timestamps_come_from_the_clock() {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let mut client = MockRewards::new();
    client
        .expect_redeem()
        .returning(|_, _| Ok(RewardResponse::success("ok", None)));

    let engine = engine_with(client, Arc::new(Mutex::new(Vec::new())))
        .with_clock(Arc::new(FixedClock(at)));
    let batch = AccountBatch::new(vec![registration("X", "Solo", "9")]).unwrap();
    let result = engine.redeem_all(&batch, "CODE").await;

    assert_eq!(result.started_at, at);
    assert_eq!(result.finished_at, at);
    assert_eq!(result.code, "CODE");
}
