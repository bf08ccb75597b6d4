/*!
 * Integration tests for sync runs against the mock collaborators
 */

use std::time::Duration;
use tokio::time::Instant;

use synsync::errors::SyncError;
use synsync::providers::mock::{MockBehavior, MockStudyService, MockTranslator, WriteCall};
use synsync::sync::{Item, Outcome, Policy, RunState, SchedulerConfig, SyncOptions};

use crate::common::{self, engine_with, fast_options, items, synonyms};

/// The four reference scenarios, run as one batch
#[tokio::test]
async fn test_run_referenceScenarios_shouldProduceExpectedOutcomes() {
    common::init_logging();
    let study = MockStudyService::new()
        .with_record(1, &["Herkunft"])
        .with_record(4, &["Feuer"]);
    let translator = MockTranslator::working()
        .with_translation("origin", "herkunft")
        .with_translation("fire", "Feuer");
    let engine = engine_with(&study, &translator, fast_options());

    let merge_report = engine
        .run(vec![Item::new(1, "origin", synonyms(&["Herkunft"]), 1)], Policy::SmartMerge)
        .await
        .unwrap();
    let replace_report = engine
        .run(vec![Item::new(1, "origin", synonyms(&["Herkunft"]), 1)], Policy::Replace)
        .await
        .unwrap();
    let delete_report = engine
        .run(
            vec![
                Item::new(3, "ground", vec![], 1),
                Item::new(4, "fire", synonyms(&["Feuer"]), 1),
            ],
            Policy::Delete,
        )
        .await
        .unwrap();

    assert_eq!(merge_report.items[0].outcome, Outcome::Skipped);
    assert_eq!(replace_report.items[0].outcome, Outcome::Skipped);
    assert_eq!(delete_report.items[0].outcome, Outcome::Skipped);
    assert_eq!(delete_report.items[1].outcome, Outcome::Updated);

    let record_id = study.record_for(4).unwrap().id;
    assert_eq!(study.writes(), vec![WriteCall::Update { record_id, synonyms: vec![] }]);
}

#[tokio::test]
async fn test_run_mixedItems_shouldConserveStats() {
    let study = MockStudyService::new()
        .with_record(2, &["Baum"])
        .with_record(3, &["Wasser"])
        .failing_writes_for(5);
    let translator = MockTranslator::working()
        .with_translation("tree", "Baum")
        .with_translation("water", "Fluss")
        .failing_for("fire");
    let run_items = vec![
        Item::new(1, "mouth", vec![], 1),
        Item::new(2, "tree", synonyms(&["Baum"]), 1),
        Item::new(3, "water", synonyms(&["Wasser"]), 1),
        Item::new(4, "fire", vec![], 1),
        Item::new(5, "rice", vec![], 2),
    ];

    let engine = engine_with(&study, &translator, fast_options());
    let report = engine.run(run_items, Policy::SmartMerge).await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.stats.created, 1);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.failed, 2);
    assert_eq!(report.stats.total(), report.attempted);
    assert_eq!(engine.stats(report.session_id), Some(report.stats));
    assert_eq!(study.record_for(3).unwrap().synonyms, synonyms(&["Wasser", "Fluss"]));
}

/// A failing item never stops the items after it
#[tokio::test]
async fn test_run_withQuotaExceeded_shouldFailEveryItemButComplete() {
    let study = MockStudyService::new();
    let translator = MockTranslator::new(MockBehavior::QuotaExceeded);
    let engine = engine_with(&study, &translator, fast_options());

    let report = engine.run(items(1, 4), Policy::Replace).await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.stats.failed, 4);
    assert_eq!(translator.request_count(), 4);
    assert!(study.writes().is_empty());
    assert!(report.items.iter().all(|item| matches!(&item.outcome, Outcome::Failed(reason) if reason.contains("Quota"))));
}

/// A key rejected mid-run is an item failure, not an abort
#[tokio::test]
async fn test_run_withRejectedTranslationKey_shouldFailEveryItemButComplete() {
    let study = MockStudyService::new().with_record(2, &["Baum"]);
    let translator = MockTranslator::new(MockBehavior::Unauthorized);
    let engine = engine_with(&study, &translator, fast_options());

    let report = engine.run(items(1, 5), Policy::SmartMerge).await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.attempted, 5);
    assert_eq!(report.stats.failed, 5);
    assert_eq!(report.stats.successful(), 0);
    assert_eq!(translator.request_count(), 5);
    assert!(study.writes().is_empty());
    assert_eq!(engine.stats(report.session_id), Some(report.stats));
}

#[tokio::test]
async fn test_run_withUnreachableTranslator_shouldStillApplyDeletes() {
    let study = MockStudyService::new().with_record(1, &["Mund"]);
    let translator = MockTranslator::failing();
    let engine = engine_with(&study, &translator, fast_options());

    let merge_report = engine.run(items(1, 3), Policy::Replace).await.unwrap();
    let delete_report = engine
        .run(vec![Item::new(1, "mouth", synonyms(&["Mund"]), 1)], Policy::Delete)
        .await
        .unwrap();

    assert_eq!(merge_report.stats.failed, 3);
    assert_eq!(delete_report.stats.updated, 1);
    assert_eq!(translator.request_count(), 3);
    assert_eq!(study.record_for(1).unwrap().synonyms, Vec::<String>::new());
}

#[tokio::test]
async fn test_run_withIntermittentTranslator_shouldIsolateFailures() {
    let study = MockStudyService::new();
    let translator = MockTranslator::new(MockBehavior::Intermittent { fail_every: 3 });
    let engine = engine_with(&study, &translator, fast_options());

    let report = engine.run(items(1, 9), Policy::SmartMerge).await.unwrap();

    assert_eq!(report.stats.failed, 3);
    assert_eq!(report.stats.created, 6);
    assert_eq!(study.writes().len(), 6);
}

#[tokio::test]
async fn test_run_existingRecordsLookup_shouldHappenOncePerSession() {
    let study = MockStudyService::new();
    let translator = MockTranslator::working();
    let engine = engine_with(&study, &translator, fast_options());

    engine.run(items(1, 45), Policy::SmartMerge).await.unwrap();

    assert_eq!(study.lookup_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_duringItemPause_shouldStopAndKeepCommittedStats() {
    let study = MockStudyService::new();
    let translator = MockTranslator::working();
    let options = SyncOptions {
        scheduler: SchedulerConfig::default(),
        ..fast_options()
    };
    let engine = engine_with(&study, &translator, options);

    let handle = engine.start_run(items(1, 10), Policy::SmartMerge).await.unwrap();
    let session_id = handle.session_id;
    // Items start at 0ms, 1200ms and 2400ms
    tokio::time::sleep(Duration::from_millis(3000)).await;
    engine.cancel(session_id).unwrap();
    let cancelled_at = Instant::now();
    let report = handle.wait().await.unwrap();

    assert!(cancelled_at.elapsed() < Duration::from_millis(100));
    assert_eq!(report.state, RunState::Cancelled);
    assert_eq!(report.attempted, 3);
    assert!(!report.is_complete());
    assert_eq!(engine.state(session_id), Some(RunState::Cancelled));
    assert_eq!(engine.stats(session_id).map(|s| s.created), Some(3));
    assert_eq!(engine.progress_percent(session_id), Some(30));
    assert_eq!(study.writes().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_withDefaultPacing_shouldTakeScheduledTime() {
    let study = MockStudyService::new();
    let translator = MockTranslator::working();
    let options = SyncOptions {
        scheduler: SchedulerConfig::default(),
        ..fast_options()
    };
    let engine = engine_with(&study, &translator, options);
    let start = Instant::now();

    let report = engine.run(items(1, 21), Policy::SmartMerge).await.unwrap();

    assert_eq!(report.attempted, 21);
    assert!(start.elapsed() >= Duration::from_millis(20 * 1200 + 2000));
    assert_eq!(engine.progress_percent(report.session_id), Some(100));
}

#[tokio::test]
async fn test_startRun_withoutStudyCredentials_shouldBeRejected() {
    let study = MockStudyService::new().without_credentials();
    let translator = MockTranslator::working();
    let engine = engine_with(&study, &translator, fast_options());

    let error = engine.start_run(items(1, 3), Policy::Delete).await.unwrap_err();

    assert!(matches!(error, SyncError::MissingCredentials(_)));
    assert!(error.is_fatal());
    let session_id = engine.current_session().unwrap();
    assert_eq!(engine.state(session_id), Some(RunState::Failed));
    assert_eq!(study.lookup_count(), 0);
}

#[tokio::test]
async fn test_run_overSynonymLimit_shouldFailWithoutWrite() {
    let current = synonyms(&["a", "b", "c"]);
    let study = MockStudyService::new().with_record(1, &["a", "b", "c"]);
    let translator = MockTranslator::working().with_translation("letters", "d");
    let options = SyncOptions {
        max_synonyms: 3,
        ..fast_options()
    };
    let engine = engine_with(&study, &translator, options);

    let report = engine
        .run(vec![Item::new(1, "letters", current, 1)], Policy::SmartMerge)
        .await
        .unwrap();

    assert!(matches!(&report.items[0].outcome, Outcome::Failed(reason) if reason.contains("limit")));
    assert!(study.writes().is_empty());
}
