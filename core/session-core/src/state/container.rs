//! Observable holder of the current session state.
//!
//! Every write takes the container's write lock, computes the next state with
//! [`next_state`] and publishes it to both streams before the lock is
//! released. Readers never see a half-applied transition and never observe
//! states out of transition order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;
use ulid::Ulid;

use super::stream::Subscription;
use super::transition::{next_state, Transition};
use super::types::{PendingSearch, SearchId, SessionState};

/// Updates a subscriber may fall behind before it starts skipping.
const STREAM_CAPACITY: usize = 1024;

pub struct SessionStateContainer {
    current: Mutex<SessionState>,
    states: broadcast::Sender<SessionState>,
    session_ids: broadcast::Sender<Option<String>>,
}

impl Default for SessionStateContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateContainer {
    pub fn new() -> Self {
        let (states, _) = broadcast::channel(STREAM_CAPACITY);
        let (session_ids, _) = broadcast::channel(STREAM_CAPACITY);
        SessionStateContainer {
            current: Mutex::new(SessionState::default()),
            states,
            session_ids,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `transition` and publishes the result to every subscriber.
    pub fn apply(&self, transition: Transition) -> SessionState {
        let mut current = self.lock();
        self.publish(&mut current, transition)
    }

    // Runs under the state lock, so publications leave in transition order.
    fn publish(&self, current: &mut SessionState, transition: Transition) -> SessionState {
        let name = transition.name();
        let from = current.phase();
        let previous_id = current.session_id.clone();

        *current = next_state(current, transition);
        debug!(
            transition = name,
            from = from.as_str(),
            to = current.phase().as_str(),
            session_id = ?current.session_id,
            pending = current.pending_count(),
            "Session transition"
        );

        // A send error only means nobody is subscribed.
        let _ = self.states.send(current.clone());
        if current.session_id != previous_id {
            let _ = self.session_ids.send(current.session_id.clone());
        }
        current.clone()
    }

    /// Starts a new session under a freshly generated id and returns that id.
    pub fn start(&self) -> String {
        let session_id = Ulid::new().to_string();
        self.apply(Transition::Start {
            session_id: session_id.clone(),
        });
        session_id
    }

    pub fn restore(&self, session_id: &str) {
        self.apply(Transition::Restore {
            session_id: session_id.to_string(),
        });
    }

    pub fn track_search(&self, search: PendingSearch) {
        let mut current = self.lock();
        if !current.is_active() {
            debug!(search = %search.id(), "Search issued without an active session; not tracked");
        }
        self.publish(&mut current, Transition::TrackSearch(search));
    }

    pub fn untrack_search(&self, id: SearchId) {
        self.apply(Transition::UntrackSearch(id));
    }

    /// Marks `session_id` as stored. Returns false when that session is no
    /// longer current and the result was discarded.
    pub fn store(&self, session_id: &str) -> bool {
        self.apply(Transition::Store {
            session_id: session_id.to_string(),
        })
        .session_id
        .as_deref()
            == Some(session_id)
    }

    /// Resets the state and returns the state it replaced, so the caller
    /// can abort exactly the searches that were pending.
    pub fn cancel(&self) -> SessionState {
        let mut current = self.lock();
        let previous = current.clone();
        self.publish(&mut current, Transition::Cancel);
        previous
    }

    /// Clears the state only if `session_id` is still the current session.
    pub fn clear_if_current(&self, session_id: &str) -> bool {
        let mut current = self.lock();
        if current.session_id.as_deref() != Some(session_id) {
            return false;
        }
        self.publish(&mut current, Transition::Clear);
        true
    }

    pub fn clear(&self) {
        self.apply(Transition::Clear);
    }

    pub fn get(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.lock().session_id.clone()
    }

    pub fn is_stored(&self) -> bool {
        self.lock().is_stored
    }

    pub fn is_restore(&self) -> bool {
        self.lock().is_restore
    }

    /// Stream of states: the current state first, then every published
    /// state in order.
    pub fn subscribe(&self) -> Subscription<SessionState> {
        let current = self.lock();
        Subscription::new(current.clone(), self.states.subscribe())
    }

    /// Stream of session ids: the current id first, then each change. Two
    /// consecutive values are never equal.
    pub fn subscribe_session_id(&self) -> Subscription<Option<String>> {
        let current = self.lock();
        Subscription::new(current.session_id.clone(), self.session_ids.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_container_is_idle() {
        let container = SessionStateContainer::new();
        assert_eq!(container.get(), SessionState::default());
        assert!(container.session_id().is_none());
    }

    #[test]
    fn test_start_generates_distinct_ids() {
        let container = SessionStateContainer::new();
        let first = container.start();
        let second = container.start();
        assert_ne!(first, second);
        assert_eq!(container.session_id().as_deref(), Some(second.as_str()));
    }

    #[test]
    fn test_store_reports_stale_result() {
        let container = SessionStateContainer::new();
        let first = container.start();
        assert!(container.store(&first));
        assert!(container.is_stored());

        container.start();
        assert!(!container.store(&first));
        assert!(!container.is_stored());
    }

    #[test]
    fn test_cancel_returns_replaced_state() {
        let container = SessionStateContainer::new();
        let id = container.start();
        let search = PendingSearch::new(|| {});
        container.track_search(search.clone());

        let previous = container.cancel();
        assert_eq!(previous.session_id.as_deref(), Some(id.as_str()));
        assert!(previous.pending_searches.contains_key(&search.id()));
        assert_eq!(container.get(), SessionState::default());
    }

    #[test]
    fn test_clear_if_current_skips_newer_session() {
        let container = SessionStateContainer::new();
        let old = container.start();
        let new = container.start();

        assert!(!container.clear_if_current(&old));
        assert_eq!(container.session_id().as_deref(), Some(new.as_str()));
        assert!(container.clear_if_current(&new));
        assert!(container.session_id().is_none());
    }

    #[test]
    fn test_late_subscriber_sees_current_state() {
        let container = SessionStateContainer::new();
        container.restore("restored");

        let mut rx = container.subscribe();
        let seen = rx.try_recv().expect("current state");
        assert_eq!(seen.session_id.as_deref(), Some("restored"));
        assert!(seen.is_restore);
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_every_transition_reaches_state_subscribers_in_order() {
        let container = SessionStateContainer::new();
        let mut rx = container.subscribe();

        let first = container.start();
        let second = container.start();
        container.track_search(PendingSearch::new(|| {}));
        container.clear();

        let seen: Vec<_> = rx
            .drain()
            .into_iter()
            .map(|state| (state.session_id.clone(), state.pending_count()))
            .collect();
        assert_eq!(
            seen,
            vec![
                (None, 0),
                (Some(first), 0),
                (Some(second.clone()), 0),
                (Some(second), 1),
                (None, 0),
            ]
        );
    }

    #[test]
    fn test_session_id_stream_ignores_same_id_transitions() {
        let container = SessionStateContainer::new();
        let mut ids = container.subscribe_session_id();
        assert_eq!(ids.try_recv(), Some(None));

        let id = container.start();
        let search = PendingSearch::new(|| {});
        container.track_search(search.clone());
        container.untrack_search(search.id());
        container.store(&id);
        container.clear();
        // Clearing an idle container does not re-emit `None`.
        container.clear();

        assert_eq!(ids.drain(), vec![Some(id), None]);
    }

    #[test]
    fn test_session_id_stream_keeps_return_to_same_id() {
        let container = SessionStateContainer::new();
        container.restore("x");
        let mut ids = container.subscribe_session_id();

        container.clear();
        container.restore("x");
        container.restore("x");

        assert_eq!(
            ids.drain(),
            vec![Some("x".to_string()), None, Some("x".to_string())]
        );
    }
}
