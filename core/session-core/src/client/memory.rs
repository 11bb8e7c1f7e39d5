use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use search_session_protocol::SearchSessionSavedObject;

use super::SessionsClient;
use crate::error::{Result, SessionError};

/// A call observed by [`InMemorySessionsClient`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    Create(SearchSessionSavedObject),
    Delete(String),
}

/// Map-backed sessions client that also keeps a log of every call.
#[derive(Default)]
pub struct InMemorySessionsClient {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    sessions: HashMap<String, SearchSessionSavedObject>,
    calls: Vec<ClientCall>,
}

impl InMemorySessionsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.lock().calls.clone()
    }

    pub fn created(&self) -> Vec<SearchSessionSavedObject> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ClientCall::Create(session) => Some(session.clone()),
                ClientCall::Delete(_) => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ClientCall::Delete(session_id) => Some(session_id.clone()),
                ClientCall::Create(_) => None,
            })
            .collect()
    }

    /// Drops a stored session without logging a call, as another client would.
    pub fn evict(&self, session_id: &str) -> bool {
        self.lock().sessions.remove(session_id).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionsClient for InMemorySessionsClient {
    async fn create(&self, session: &SearchSessionSavedObject) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(ClientCall::Create(session.clone()));
        session.validate()?;
        inner
            .sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(ClientCall::Delete(session_id.to_string()));
        match inner.sessions.remove(session_id) {
            Some(_) => Ok(()),
            None => Err(SessionError::SessionNotFound(session_id.to_string())),
        }
    }

    async fn get(&self, session_id: &str) -> Result<Option<SearchSessionSavedObject>> {
        Ok(self.lock().sessions.get(session_id).cloned())
    }

    async fn list(&self) -> Result<Vec<SearchSessionSavedObject>> {
        let mut sessions: Vec<_> = self.lock().sessions.values().cloned().collect();
        sessions.sort_by(|a, b| {
            a.created
                .cmp(&b.created)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn saved(session_id: &str, created: &str) -> SearchSessionSavedObject {
        SearchSessionSavedObject {
            session_id: session_id.to_string(),
            name: "name".to_string(),
            app_id: "discover".to_string(),
            url_generator_id: "discover-app-url".to_string(),
            initial_state: json!({}),
            restore_state: json!({}),
            created: created.to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_delete_logs_both_calls() {
        let client = InMemorySessionsClient::new();
        client
            .create(&saved("s1", "2026-01-30T12:00:00Z"))
            .await
            .expect("create");
        client.delete("s1").await.expect("delete");

        assert_eq!(client.created().len(), 1);
        assert_eq!(client.deleted(), vec!["s1".to_string()]);
        assert!(client.get("s1").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn delete_unknown_session_fails() {
        let client = InMemorySessionsClient::new();
        let err = client.delete("missing").await.expect_err("missing");
        assert!(matches!(err, SessionError::SessionNotFound(id) if id == "missing"));
        assert_eq!(client.calls(), vec![ClientCall::Delete("missing".to_string())]);
    }

    #[tokio::test]
    async fn create_rejects_invalid_object() {
        let client = InMemorySessionsClient::new();
        let mut session = saved("s1", "2026-01-30T12:00:00Z");
        session.name = String::new();

        let err = client.create(&session).await.expect_err("invalid");
        assert!(matches!(err, SessionError::InvalidSession(_)));
        assert!(client.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn list_orders_by_creation_time() {
        let client = InMemorySessionsClient::new();
        client
            .create(&saved("late", "2026-01-30T13:00:00Z"))
            .await
            .expect("create");
        client
            .create(&saved("early", "2026-01-30T12:00:00Z"))
            .await
            .expect("create");

        let ids: Vec<_> = client
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|session| session.session_id)
            .collect();
        assert_eq!(ids, vec!["early".to_string(), "late".to_string()]);
    }
}
