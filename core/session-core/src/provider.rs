//! Session info providers.
//!
//! The UI layer that owns the active session registers a provider describing
//! it. The service asks the provider for a display name and for the state
//! needed to rebuild the view when the session is persisted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Restoration target plus the two state blobs it understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlGeneratorData {
    pub url_generator_id: String,
    pub initial_state: Value,
    pub restore_state: Value,
}

/// Implementations report their own failures as [`SessionError::Provider`];
/// `save` passes them through without calling the persistence client.
///
/// [`SessionError::Provider`]: crate::error::SessionError::Provider
#[async_trait]
pub trait SearchSessionInfoProvider: Send + Sync {
    /// User-facing name for the session.
    async fn get_name(&self) -> Result<String>;

    async fn get_url_generator_data(&self) -> Result<UrlGeneratorData>;
}

/// Provider that answers with fixed values.
#[derive(Debug, Clone)]
pub struct StaticInfoProvider {
    name: String,
    data: UrlGeneratorData,
}

impl StaticInfoProvider {
    pub fn new(name: impl Into<String>, data: UrlGeneratorData) -> Self {
        StaticInfoProvider {
            name: name.into(),
            data,
        }
    }
}

#[async_trait]
impl SearchSessionInfoProvider for StaticInfoProvider {
    async fn get_name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    async fn get_url_generator_data(&self) -> Result<UrlGeneratorData> {
        Ok(self.data.clone())
    }
}
