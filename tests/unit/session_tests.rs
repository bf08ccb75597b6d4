/*!
 * Tests for session bookkeeping
 */

use std::sync::Arc;

use synsync::sync::{Outcome, RunState, SessionController, Stats};

#[test]
fn test_commit_sequence_shouldConserveStats() {
    let controller = SessionController::new();
    let id = controller.start_session();
    let outcomes = [
        Outcome::Created,
        Outcome::Skipped,
        Outcome::Failed("quota".to_string()),
        Outcome::Updated,
        Outcome::Skipped,
    ];

    for outcome in &outcomes {
        assert!(controller.commit(id, outcome));
    }

    let stats = controller.finalize(id).unwrap();
    assert_eq!(stats.created + stats.updated + stats.failed + stats.skipped, outcomes.len());
    assert_eq!(stats.successful(), 4);
}

#[test]
fn test_reads_ofSupersededSession_shouldReturnSnapshot() {
    let controller = SessionController::new();
    let old = controller.start_session();
    controller.commit(old, &Outcome::Created);
    controller.record_progress(old, 50);

    let _new = controller.start_session();

    assert_eq!(controller.stats(old).map(|s| s.created), Some(1));
    assert_eq!(controller.progress_percent(old), Some(50));
    assert!(controller.is_cancelled(old));
}

#[test]
fn test_startSession_afterTerminalSession_shouldNotCancelIt() {
    let controller = SessionController::new();
    let old = controller.start_session();
    controller.set_state(old, RunState::Completed);

    controller.start_session();

    assert!(!controller.is_cancelled(old));
}

#[test]
fn test_commit_fromManyThreads_shouldOnlyCountCurrentSession() {
    let controller = Arc::new(SessionController::new());
    let old = controller.start_session();
    let new = controller.start_session();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let controller = Arc::clone(&controller);
            std::thread::spawn(move || {
                let id = if i % 2 == 0 { old } else { new };
                for _ in 0..100 {
                    controller.commit(id, &Outcome::Skipped);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(controller.stats(old), Some(Stats::default()));
    assert_eq!(controller.stats(new).map(|s| s.skipped), Some(400));
}
