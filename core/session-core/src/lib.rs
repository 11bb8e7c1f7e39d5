//! # search-session-core
//!
//! Tracks the user's current search session: the set of searches in flight
//! for it, whether it has been persisted ("sent to background"), and whether
//! it was restored from a persisted one.
//!
//! ## Design Principles
//!
//! - **One session at a time**: a tracker owns zero or one current session.
//! - **Synchronous transitions**: every state change is applied atomically
//!   and published to subscribers in order.
//! - **Injected collaborators**: persistence, the session info provider and
//!   the application-lifecycle stream are passed in, never looked up globally.
//! - **Stale results are discarded**: asynchronous work re-checks the
//!   session id before touching state.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use search_session::{FileSessionsClient, ImmediateRecovery, SessionService};
//!
//! let client = Arc::new(FileSessionsClient::new("/tmp/sessions.json"));
//! let service = SessionService::new(client, Arc::new(ImmediateRecovery));
//! service.attach(app_changes)?;
//!
//! let session_id = service.start();
//! let tracked = service.track_search(PendingSearch::new(move || abort.cancel()));
//! service.set_search_session_info_provider(Some(provider));
//! service.save().await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod navigation;
pub mod provider;
pub mod service;
pub mod state;

pub use client::{ClientCall, FileSessionsClient, InMemorySessionsClient, SessionsClient};
pub use config::{load_config, NavigationConfig, NavigationMode, SessionConfig, StoreConfig};
pub use error::{Result, SessionError};
pub use navigation::{
    policy_from_config, DeferredRecovery, ImmediateRecovery, NavigationPolicy,
    OpenSessionViolation,
};
pub use provider::{SearchSessionInfoProvider, StaticInfoProvider, UrlGeneratorData};
pub use service::{SaveOutcome, SessionService, TrackedSearch};
pub use state::{
    PendingSearch, SearchId, SessionPhase, SessionState, SessionStateContainer, Subscription,
};

pub use search_session_protocol::{ErrorInfo, SearchSessionSavedObject};
