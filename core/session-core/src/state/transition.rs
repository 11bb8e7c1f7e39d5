//! Maps session transitions to the next state.
//! Every function here is pure; id generation and publication live in the container.

use super::types::{PendingSearch, SearchId, SessionState};

#[derive(Debug, Clone)]
pub enum Transition {
    Start { session_id: String },
    Restore { session_id: String },
    TrackSearch(PendingSearch),
    UntrackSearch(SearchId),
    /// Marks `session_id` as stored, provided it is still the current session.
    Store { session_id: String },
    Cancel,
    Clear,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Start { .. } => "start",
            Transition::Restore { .. } => "restore",
            Transition::TrackSearch(_) => "track_search",
            Transition::UntrackSearch(_) => "untrack_search",
            Transition::Store { .. } => "store",
            Transition::Cancel => "cancel",
            Transition::Clear => "clear",
        }
    }
}

pub fn next_state(current: &SessionState, transition: Transition) -> SessionState {
    match transition {
        Transition::Start { session_id } => SessionState {
            session_id: Some(session_id),
            ..SessionState::default()
        },
        Transition::Restore { session_id } => SessionState {
            session_id: Some(session_id),
            is_restore: true,
            ..SessionState::default()
        },
        // Searches issued outside a session are not tracked.
        Transition::TrackSearch(_) if !current.is_active() => current.clone(),
        Transition::TrackSearch(search) => {
            let mut next = current.clone();
            next.pending_searches.insert(search.id(), search);
            next
        }
        Transition::UntrackSearch(id) => {
            let mut next = current.clone();
            next.pending_searches.remove(&id);
            next
        }
        Transition::Store { ref session_id }
            if current.session_id.as_deref() == Some(session_id.as_str()) =>
        {
            SessionState {
                is_stored: true,
                ..current.clone()
            }
        }
        Transition::Store { .. } => current.clone(),
        Transition::Cancel | Transition::Clear => SessionState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(session_id: &str) -> SessionState {
        next_state(
            &SessionState::default(),
            Transition::Start {
                session_id: session_id.to_string(),
            },
        )
    }

    #[test]
    fn test_start_yields_fresh_active_state() {
        let mut current = active("s0");
        current.is_stored = true;
        current.is_restore = true;
        let search = PendingSearch::new(|| {});
        current.pending_searches.insert(search.id(), search);

        let next = next_state(
            &current,
            Transition::Start {
                session_id: "s1".to_string(),
            },
        );
        assert_eq!(next.session_id.as_deref(), Some("s1"));
        assert!(!next.is_stored);
        assert!(!next.is_restore);
        assert!(next.pending_searches.is_empty());
    }

    #[test]
    fn test_restore_marks_restore() {
        let next = next_state(
            &SessionState::default(),
            Transition::Restore {
                session_id: "restored".to_string(),
            },
        );
        assert_eq!(next.session_id.as_deref(), Some("restored"));
        assert!(next.is_restore);
        assert!(!next.is_stored);
    }

    #[test]
    fn test_track_search_adds_descriptor() {
        let search = PendingSearch::new(|| {});
        let next = next_state(&active("s1"), Transition::TrackSearch(search.clone()));
        assert_eq!(next.pending_searches.get(&search.id()), Some(&search));
    }

    #[test]
    fn test_track_search_without_session_is_ignored() {
        let next = next_state(
            &SessionState::default(),
            Transition::TrackSearch(PendingSearch::new(|| {})),
        );
        assert_eq!(next, SessionState::default());
    }

    #[test]
    fn test_track_same_descriptor_twice_keeps_one_entry() {
        let search = PendingSearch::new(|| {});
        let once = next_state(&active("s1"), Transition::TrackSearch(search.clone()));
        let twice = next_state(&once, Transition::TrackSearch(search));
        assert_eq!(twice.pending_count(), 1);
    }

    #[test]
    fn test_untrack_removes_descriptor() {
        let search = PendingSearch::new(|| {});
        let tracked = next_state(&active("s1"), Transition::TrackSearch(search.clone()));
        let next = next_state(&tracked, Transition::UntrackSearch(search.id()));
        assert!(next.pending_searches.is_empty());
        assert_eq!(next.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_untrack_absent_descriptor_is_noop() {
        let kept = PendingSearch::new(|| {});
        let absent = PendingSearch::new(|| {});
        let tracked = next_state(&active("s1"), Transition::TrackSearch(kept));
        let next = next_state(&tracked, Transition::UntrackSearch(absent.id()));
        assert_eq!(next, tracked);
    }

    #[test]
    fn test_store_current_session() {
        let next = next_state(
            &active("s1"),
            Transition::Store {
                session_id: "s1".to_string(),
            },
        );
        assert!(next.is_stored);
    }

    #[test]
    fn test_store_stale_session_is_discarded() {
        let current = active("s2");
        let next = next_state(
            &current,
            Transition::Store {
                session_id: "s1".to_string(),
            },
        );
        assert_eq!(next, current);
    }

    #[test]
    fn test_store_without_session_is_noop() {
        let next = next_state(
            &SessionState::default(),
            Transition::Store {
                session_id: "s1".to_string(),
            },
        );
        assert!(!next.is_stored);
        assert!(next.session_id.is_none());
    }

    #[test]
    fn test_cancel_and_clear_reset_everything() {
        let mut current = active("s1");
        current.is_stored = true;
        let search = PendingSearch::new(|| {});
        current.pending_searches.insert(search.id(), search);

        assert_eq!(
            next_state(&current, Transition::Cancel),
            SessionState::default()
        );
        assert_eq!(
            next_state(&current, Transition::Clear),
            SessionState::default()
        );
    }
}
