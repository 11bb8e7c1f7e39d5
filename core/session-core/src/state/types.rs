//! State types held by the session state container.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SEARCH_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a tracked search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchId(u64);

impl SearchId {
    fn next() -> Self {
        SearchId(NEXT_SEARCH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "search-{}", self.0)
    }
}

/// Handle to an in-flight search request.
///
/// Clones share identity and abort capability. Aborting is fire-and-forget:
/// the callback must not block, and nothing waits for the search to stop.
#[derive(Clone)]
pub struct PendingSearch {
    id: SearchId,
    abort: Arc<dyn Fn() + Send + Sync>,
}

impl PendingSearch {
    pub fn new(abort: impl Fn() + Send + Sync + 'static) -> Self {
        PendingSearch {
            id: SearchId::next(),
            abort: Arc::new(abort),
        }
    }

    pub fn id(&self) -> SearchId {
        self.id
    }

    pub fn abort(&self) {
        (self.abort)();
    }
}

impl PartialEq for PendingSearch {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PendingSearch {}

impl fmt::Debug for PendingSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSearch").field("id", &self.id).finish()
    }
}

/// Coarse position in the session lifecycle.
///
/// ```text
/// Idle ──start/restore──▶ Active ──store──▶ ActiveStored
///   ▲                        │                   │
///   └──── clear / cancel / navigation violation ─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Active,
    ActiveStored,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Active => "active",
            SessionPhase::ActiveStored => "active_stored",
        }
    }
}

/// The singleton state owned by a tracker instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub session_id: Option<String>,
    pub is_stored: bool,
    pub is_restore: bool,
    pub pending_searches: BTreeMap<SearchId, PendingSearch>,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.session_id, self.is_stored) {
            (None, _) => SessionPhase::Idle,
            (Some(_), false) => SessionPhase::Active,
            (Some(_), true) => SessionPhase::ActiveStored,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending_searches.len()
    }
}
