//! Persistence collaborators for search sessions.
//!
//! The session service only ever calls `create` (when saving) and `delete`
//! (when cancelling a stored session). `get` and `list` exist for operators
//! and tooling. Implementations never retry; failures go back to the caller.

use async_trait::async_trait;
use search_session_protocol::SearchSessionSavedObject;

use crate::error::Result;

mod file;
mod memory;

pub use file::FileSessionsClient;
pub use memory::{ClientCall, InMemorySessionsClient};

#[async_trait]
pub trait SessionsClient: Send + Sync {
    /// Persists `session`, replacing any earlier save under the same id.
    async fn create(&self, session: &SearchSessionSavedObject) -> Result<()>;

    /// Removes a persisted session. Unknown ids fail with `SessionNotFound`.
    async fn delete(&self, session_id: &str) -> Result<()>;

    async fn get(&self, session_id: &str) -> Result<Option<SearchSessionSavedObject>>;

    /// All persisted sessions, oldest first.
    async fn list(&self) -> Result<Vec<SearchSessionSavedObject>>;
}
