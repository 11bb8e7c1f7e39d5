//! Search session service.
//!
//! Wraps the [`SessionStateContainer`] with the collaborators a session needs:
//! the persistence client for save/cancel, the info provider registered by
//! the UI that owns the session, and the host's stream of application changes.
//!
//! ## Lifecycle
//!
//! ```text
//! let service = SessionService::new(client, policy);   // construct
//! service.attach(app_changes)?;                        // wire the navigation watcher
//! ...
//! service.destroy();                                   // terminal
//! ```
//!
//! Transitions are synchronous. `save` and `cancel` suspend only at
//! collaborator calls, and no lock is held across those suspensions; `save`
//! re-checks the session id once its collaborator work is done.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use search_session_protocol::SearchSessionSavedObject;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::SessionsClient;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::navigation::{policy_from_config, NavigationPolicy, OpenSessionViolation};
use crate::provider::SearchSessionInfoProvider;
use crate::state::{PendingSearch, SearchId, SessionState, SessionStateContainer, Subscription};

const REFRESH_CHANNEL_CAPACITY: usize = 16;

/// Result of a [`SessionService::save`] that got past its preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The session was persisted and is now marked stored.
    Stored,
    /// The session was persisted, but it was cleared or replaced while the
    /// save was in flight, so the stored flag was not applied.
    Stale,
}

#[derive(Clone)]
pub struct SessionService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    state: SessionStateContainer,
    sessions_client: Arc<dyn SessionsClient>,
    navigation_policy: Arc<dyn NavigationPolicy>,
    info_provider: Mutex<Option<Arc<dyn SearchSessionInfoProvider>>>,
    current_app: Mutex<Option<String>>,
    refresh: broadcast::Sender<()>,
    app_watcher: Mutex<Option<JoinHandle<()>>>,
    destroyed: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionService {
    pub fn new(
        sessions_client: Arc<dyn SessionsClient>,
        navigation_policy: Arc<dyn NavigationPolicy>,
    ) -> Self {
        let (refresh, _) = broadcast::channel(REFRESH_CHANNEL_CAPACITY);
        SessionService {
            inner: Arc::new(ServiceInner {
                state: SessionStateContainer::new(),
                sessions_client,
                navigation_policy,
                info_provider: Mutex::new(None),
                current_app: Mutex::new(None),
                refresh,
                app_watcher: Mutex::new(None),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_config(config: &SessionConfig, sessions_client: Arc<dyn SessionsClient>) -> Self {
        Self::new(sessions_client, policy_from_config(&config.navigation))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Wiring
    // ─────────────────────────────────────────────────────────────────────

    /// Starts watching `app_changes` for navigation between applications.
    ///
    /// The current value is handled first, then every change. Attaching
    /// again replaces the previous watcher. Must be called within a Tokio
    /// runtime.
    pub fn attach(&self, mut app_changes: watch::Receiver<Option<String>>) -> Result<()> {
        if self.inner.destroyed.load(Ordering::SeqCst) {
            return Err(SessionError::Destroyed);
        }

        let service = Arc::downgrade(&self.inner);
        let watcher = tokio::spawn(async move {
            let initial = app_changes.borrow_and_update().clone();
            if !dispatch_app_change(&service, initial) {
                return;
            }
            while app_changes.changed().await.is_ok() {
                let app_id = app_changes.borrow_and_update().clone();
                if !dispatch_app_change(&service, app_id) {
                    return;
                }
            }
            debug!("Application lifecycle source closed; navigation watcher stopped");
        });

        if let Some(previous) = lock(&self.inner.app_watcher).replace(watcher) {
            previous.abort();
        }
        Ok(())
    }

    /// Records a switch to `app_id`; an active session at that moment is a
    /// protocol violation handed to the navigation policy. Ignored once the
    /// service is destroyed.
    pub fn handle_app_change(&self, app_id: Option<String>) {
        if self.is_destroyed() {
            debug!(to = ?app_id, "Application change after destroy; ignored");
            return;
        }
        let previous = {
            let mut current_app = lock(&self.inner.current_app);
            if *current_app == app_id {
                return;
            }
            std::mem::replace(&mut *current_app, app_id.clone())
        };
        debug!(from = ?previous, to = ?app_id, "Current application changed");

        let Some(session_id) = self.inner.state.session_id() else {
            return;
        };

        let violation = OpenSessionViolation {
            app_id: previous,
            session_id: session_id.clone(),
            next_app_id: app_id,
        };
        let service = Arc::downgrade(&self.inner);
        self.inner.navigation_policy.on_violation(
            violation,
            Box::new(move || {
                if let Some(inner) = service.upgrade() {
                    SessionService { inner }.clear_session(&session_id);
                }
            }),
        );
    }

    /// Stops the navigation watcher and clears all state. The service cannot
    /// be attached again afterwards.
    pub fn destroy(&self) {
        self.inner.destroyed.store(true, Ordering::SeqCst);
        if let Some(watcher) = lock(&self.inner.app_watcher).take() {
            watcher.abort();
        }
        self.clear();
        debug!("Session service destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    pub fn get_session_id(&self) -> Option<String> {
        self.inner.state.session_id()
    }

    /// Session id stream: the current id, then each distinct change.
    pub fn session_id_changes(&self) -> Subscription<Option<String>> {
        self.inner.state.subscribe_session_id()
    }

    /// The current session state, then every published state in order.
    pub fn state_changes(&self) -> Subscription<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.get()
    }

    pub fn is_stored(&self) -> bool {
        self.inner.state.is_stored()
    }

    pub fn is_restore(&self) -> bool {
        self.inner.state.is_restore()
    }

    pub fn current_app(&self) -> Option<String> {
        lock(&self.inner.current_app).clone()
    }

    pub fn has_info_provider(&self) -> bool {
        lock(&self.inner.info_provider).is_some()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session transitions
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_search_session_info_provider(
        &self,
        provider: Option<Arc<dyn SearchSessionInfoProvider>>,
    ) {
        *lock(&self.inner.info_provider) = provider;
    }

    pub fn start(&self) -> String {
        let session_id = self.inner.state.start();
        info!(session_id = %session_id, app_id = ?self.current_app(), "Search session started");
        session_id
    }

    pub fn restore(&self, session_id: &str) {
        self.inner.state.restore(session_id);
        info!(session_id = %session_id, app_id = ?self.current_app(), "Search session restored");
    }

    /// Tracks `search` for the active session. Searches issued while no
    /// session is active are not tracked; the returned handle is then inert.
    pub fn track_search(&self, search: PendingSearch) -> TrackedSearch {
        let search_id = search.id();
        self.inner.state.track_search(search);
        TrackedSearch {
            search_id,
            service: Arc::downgrade(&self.inner),
            untracked: AtomicBool::new(false),
        }
    }

    /// Clears the session and releases its info provider.
    pub fn clear(&self) {
        self.inner.state.clear();
        self.set_search_session_info_provider(None);
    }

    fn clear_session(&self, session_id: &str) {
        if self.inner.state.clear_if_current(session_id) {
            self.set_search_session_info_provider(None);
            info!(session_id = %session_id, "Search session cleared after navigation");
        } else {
            debug!(session_id = %session_id, "Session already replaced; nothing to clear");
        }
    }

    /// Re-run signal for whatever is showing the current results.
    pub fn refresh(&self) {
        let receivers = self.inner.refresh.send(()).unwrap_or(0);
        debug!(receivers, "Refresh requested");
    }

    /// Subscribes to refresh requests made after this call.
    pub fn on_refresh(&self) -> broadcast::Receiver<()> {
        self.inner.refresh.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Collaborator operations
    // ─────────────────────────────────────────────────────────────────────

    /// Aborts every pending search, clears the session and, if it had been
    /// stored, deletes it from the persistence collaborator.
    pub async fn cancel(&self) -> Result<()> {
        let previous = self.inner.state.cancel();
        self.set_search_session_info_provider(None);

        for search in previous.pending_searches.values() {
            search.abort();
        }

        let Some(session_id) = previous.session_id else {
            return Ok(());
        };
        info!(
            session_id = %session_id,
            aborted = previous.pending_searches.len(),
            stored = previous.is_stored,
            "Search session cancelled"
        );

        if previous.is_stored {
            self.inner.sessions_client.delete(&session_id).await?;
            debug!(session_id = %session_id, "Stored search session deleted");
        }
        Ok(())
    }

    /// Persists the active session.
    ///
    /// Fails with `NoActiveSession`, `NoCurrentApp` or `NoInfoProvider`
    /// before any collaborator is called. Collaborator failures propagate.
    pub async fn save(&self) -> Result<SaveOutcome> {
        let session_id = self.get_session_id().ok_or(SessionError::NoActiveSession)?;
        let app_id = self.current_app().ok_or(SessionError::NoCurrentApp)?;
        let provider = lock(&self.inner.info_provider)
            .clone()
            .ok_or(SessionError::NoInfoProvider)?;

        let (name, data) =
            tokio::try_join!(provider.get_name(), provider.get_url_generator_data())?;

        let session = SearchSessionSavedObject {
            session_id: session_id.clone(),
            name,
            app_id,
            url_generator_id: data.url_generator_id,
            initial_state: data.initial_state,
            restore_state: data.restore_state,
            created: Utc::now().to_rfc3339(),
        };
        self.inner.sessions_client.create(&session).await?;

        if self.inner.state.store(&session_id) {
            info!(session_id = %session_id, name = %session.name, "Search session saved");
            Ok(SaveOutcome::Stored)
        } else {
            debug!(
                session_id = %session_id,
                current = ?self.get_session_id(),
                "Session changed during save; discarding stored flag"
            );
            Ok(SaveOutcome::Stale)
        }
    }
}

fn dispatch_app_change(service: &Weak<ServiceInner>, app_id: Option<String>) -> bool {
    match service.upgrade() {
        Some(inner) => {
            SessionService { inner }.handle_app_change(app_id);
            true
        }
        None => false,
    }
}

/// Handle returned by [`SessionService::track_search`].
///
/// `untrack` removes the search from the session; only the first call has
/// any effect. Dropping the handle does not untrack.
#[must_use = "untrack the search once it resolves"]
pub struct TrackedSearch {
    search_id: SearchId,
    service: Weak<ServiceInner>,
    untracked: AtomicBool,
}

impl TrackedSearch {
    pub fn search_id(&self) -> SearchId {
        self.search_id
    }

    pub fn untrack(&self) {
        if self.untracked.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(inner) = self.service.upgrade() {
            inner.state.untrack_search(self.search_id);
        }
    }
}
