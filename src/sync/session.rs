/*!
 * Session bookkeeping for sync runs.
 *
 * Every run gets a fresh session id from a monotonically increasing counter.
 * Shared statistics are only ever written through [`SessionController::commit`],
 * which drops outcomes from sessions that are no longer current or have been
 * finalized. This keeps a superseded run from adding its late results to the
 * totals of the run that replaced it.
 */

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

use crate::errors::SyncError;

use super::models::{Outcome, RunState, SessionId, Stats};

/// Finalized sessions kept queryable after newer sessions start
pub const RETAINED_SESSIONS: usize = 32;

/// Per-session state kept by the controller
#[derive(Debug)]
struct SessionEntry {
    stats: Stats,
    state: RunState,
    percent: u8,
    finalized: bool,
    cancel: CancellationToken,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            stats: Stats::new(),
            state: RunState::Idle,
            percent: 0,
            finalized: false,
            cancel: CancellationToken::new(),
        }
    }
}

/// Issues session ids and guards all writes to session statistics
#[derive(Debug, Default)]
pub struct SessionController {
    /// Id of the most recently started session; 0 before the first one
    counter: AtomicU64,
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl SessionController {
    /// Create a controller with no sessions
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session, superseding the current one
    ///
    /// The superseded session's cancel token fires so its run stops at the
    /// next item boundary. Only the newest [`RETAINED_SESSIONS`] finalized
    /// sessions are kept; older finalized ones are evicted.
    pub fn start_session(&self) -> SessionId {
        let mut sessions = self.sessions.lock();
        let previous = SessionId(self.counter.load(Ordering::SeqCst));
        let id = SessionId(self.counter.fetch_add(1, Ordering::SeqCst) + 1);

        if let Some(entry) = sessions.get_mut(&previous) {
            if !entry.state.is_terminal() {
                info!("Session {} superseded by session {}", previous, id);
                entry.cancel.cancel();
            }
        }

        sessions.insert(id, SessionEntry::new());
        evict_finalized(&mut sessions);
        debug!("Started session {}", id);
        id
    }

    /// The current session, if any was started
    pub fn current(&self) -> Option<SessionId> {
        match self.counter.load(Ordering::SeqCst) {
            0 => None,
            id => Some(SessionId(id)),
        }
    }

    /// Whether `id` is the most recently started session
    pub fn is_current(&self, id: SessionId) -> bool {
        self.counter.load(Ordering::SeqCst) == id.0
    }

    /// Fold `outcome` into the session's stats
    ///
    /// Returns false, leaving all stats untouched, when the session is not
    /// current or already finalized.
    pub fn commit(&self, id: SessionId, outcome: &Outcome) -> bool {
        let mut sessions = self.sessions.lock();
        if !self.is_current(id) {
            debug!("Dropping outcome of superseded session {}", id);
            return false;
        }
        match sessions.get_mut(&id) {
            Some(entry) if !entry.finalized => {
                entry.stats.record(outcome);
                true
            }
            _ => false,
        }
    }

    /// Publish the progress of the session; ignored unless it is current
    pub fn record_progress(&self, id: SessionId, percent: u8) -> bool {
        let mut sessions = self.sessions.lock();
        if !self.is_current(id) {
            return false;
        }
        match sessions.get_mut(&id) {
            Some(entry) if !entry.finalized => {
                entry.percent = entry.percent.max(percent.min(100));
                true
            }
            _ => false,
        }
    }

    /// Mark the session terminal and return its final stats
    pub fn finalize(&self, id: SessionId) -> Option<Stats> {
        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(&id)?;
        entry.finalized = true;
        Some(entry.stats)
    }

    /// Request cancellation of a session
    pub fn cancel(&self, id: SessionId) -> Result<(), SyncError> {
        let sessions = self.sessions.lock();
        let entry = sessions.get(&id).ok_or(SyncError::SessionNotFound(id.0))?;
        entry.cancel.cancel();
        Ok(())
    }

    /// Cancel token of a session
    pub fn cancel_token(&self, id: SessionId) -> Option<CancellationToken> {
        self.sessions.lock().get(&id).map(|entry| entry.cancel.clone())
    }

    /// Whether cancellation of a session was requested
    pub fn is_cancelled(&self, id: SessionId) -> bool {
        self.sessions
            .lock()
            .get(&id)
            .is_some_and(|entry| entry.cancel.is_cancelled())
    }

    /// Snapshot of a session's stats
    pub fn stats(&self, id: SessionId) -> Option<Stats> {
        self.sessions.lock().get(&id).map(|entry| entry.stats)
    }

    /// Last published progress of a session
    pub fn progress_percent(&self, id: SessionId) -> Option<u8> {
        self.sessions.lock().get(&id).map(|entry| entry.percent)
    }

    /// Lifecycle state of a session
    pub fn state(&self, id: SessionId) -> Option<RunState> {
        self.sessions.lock().get(&id).map(|entry| entry.state)
    }

    /// Move a session to `state`; terminal states are never left
    pub fn set_state(&self, id: SessionId, state: RunState) {
        if let Some(entry) = self.sessions.lock().get_mut(&id) {
            if !entry.state.is_terminal() {
                entry.state = state;
            }
        }
    }
}

/// Drop the oldest finalized sessions beyond the retention limit
fn evict_finalized(sessions: &mut HashMap<SessionId, SessionEntry>) {
    let mut finalized: Vec<SessionId> = sessions
        .iter()
        .filter(|(_, entry)| entry.finalized)
        .map(|(id, _)| *id)
        .collect();
    if finalized.len() <= RETAINED_SESSIONS {
        return;
    }
    finalized.sort_unstable();
    let excess = finalized.len() - RETAINED_SESSIONS;
    for id in &finalized[..excess] {
        sessions.remove(id);
    }
    debug!("Evicted {} finalized sessions", excess);
}
