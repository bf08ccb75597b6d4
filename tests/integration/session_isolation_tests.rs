/*!
 * Integration tests for overlapping sessions
 */

use std::time::Duration;

use synsync::providers::mock::{MockStudyService, MockTranslator};
use synsync::sync::{Policy, RunState};

use crate::common::{self, engine_with, fast_options, items};

/// Run A (36 items) is superseded by run B (5 items) while A is in flight.
/// Each translation takes 100ms, so A has finished two items and is halfway
/// through its third when B starts.
#[tokio::test(start_paused = true)]
async fn test_newSession_whileRunInFlight_shouldIsolateStats() {
    common::init_logging();
    let study = MockStudyService::new();
    let translator = MockTranslator::slow(100);
    let engine = engine_with(&study, &translator, fast_options());

    let run_a = engine.start_run(items(1, 36), Policy::SmartMerge).await.unwrap();
    let session_a = run_a.session_id;
    tokio::time::sleep(Duration::from_millis(250)).await;

    let run_b = engine.start_run(items(1001, 5), Policy::SmartMerge).await.unwrap();
    let session_b = run_b.session_id;
    let report_a = run_a.wait().await.unwrap();
    let report_b = run_b.wait().await.unwrap();

    assert!(session_b > session_a);
    assert_eq!(engine.current_session(), Some(session_b));

    // A stopped at the item boundary after its in-flight item
    assert_eq!(report_a.state, RunState::Cancelled);
    assert_eq!(report_a.attempted, 3);
    assert_eq!(report_a.stats.created, 3);

    // Only the two items A finished before B started were committed
    let stats_a = engine.stats(session_a).unwrap();
    assert_eq!(stats_a.created, 2);
    assert_eq!(stats_a.total(), 2);

    // B's counters hold nothing but B's own items
    let stats_b = engine.stats(session_b).unwrap();
    assert_eq!(report_b.state, RunState::Completed);
    assert_eq!(report_b.attempted, 5);
    assert_eq!(stats_b.successful(), report_b.attempted);
    assert_eq!(stats_b.total(), 5);
    assert_eq!(engine.progress_percent(session_b), Some(100));
}

#[tokio::test(start_paused = true)]
async fn test_newSession_afterCompletedRun_shouldStartFromZero() {
    let study = MockStudyService::new();
    let translator = MockTranslator::working();
    let engine = engine_with(&study, &translator, fast_options());

    let first = engine.run(items(1, 4), Policy::SmartMerge).await.unwrap();
    let second = engine.run(items(1, 4), Policy::SmartMerge).await.unwrap();

    assert_eq!(first.stats.created, 4);
    // The records now exist, and the items still carry no synonyms
    assert_eq!(second.stats.updated, 4);
    assert_eq!(engine.stats(first.session_id).map(|s| s.total()), Some(4));
    assert_eq!(engine.stats(second.session_id).map(|s| s.created), Some(0));
    assert_eq!(engine.state(first.session_id), Some(RunState::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_ofSupersededSession_shouldNotAffectCurrentRun() {
    let study = MockStudyService::new();
    let translator = MockTranslator::slow(50);
    let engine = engine_with(&study, &translator, fast_options());

    let old = engine.start_run(items(1, 10), Policy::SmartMerge).await.unwrap();
    let old_id = old.session_id;
    let current = engine.start_run(items(100, 3), Policy::SmartMerge).await.unwrap();

    engine.cancel(old_id).unwrap();
    let old_report = old.wait().await.unwrap();
    let report = current.wait().await.unwrap();

    assert_eq!(old_report.state, RunState::Cancelled);
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.stats.created, 3);
}
