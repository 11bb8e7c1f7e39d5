//! Persisted search session schema.
//!
//! Shared by the session tracker and every store that persists sessions, so
//! the shape of a saved session cannot drift between writer and reader. The
//! store remains the authority on validation, but writers reuse the same
//! checks before handing an object over.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// On-disk format version written by file-backed stores.
pub const STORE_FORMAT_VERSION: u32 = 1;
pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A search session as handed to the persistence collaborator.
///
/// `url_generator_id` names the restoration target: the routine able to
/// rebuild a view from `initial_state` (fresh run) or `restore_state`
/// (re-attach to the stored searches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSessionSavedObject {
    pub session_id: String,
    pub name: String,
    pub app_id: String,
    pub url_generator_id: String,
    #[serde(default)]
    pub initial_state: Value,
    #[serde(default)]
    pub restore_state: Value,
    pub created: String,
}

impl SearchSessionSavedObject {
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        if self.session_id.trim().is_empty() {
            return Err(ErrorInfo::new(
                "invalid_session_id",
                "session_id is required",
            ));
        }
        if self.session_id.len() > MAX_SESSION_ID_LEN {
            return Err(ErrorInfo::new(
                "invalid_session_id",
                format!(
                    "session_id must be {} characters or fewer",
                    MAX_SESSION_ID_LEN
                ),
            ));
        }

        require_string(&self.name, "name")?;
        require_string(&self.app_id, "app_id")?;
        require_string(&self.url_generator_id, "url_generator_id")?;

        if DateTime::parse_from_rfc3339(&self.created).is_err() {
            return Err(ErrorInfo::new("invalid_timestamp", "created must be RFC3339"));
        }

        Ok(())
    }
}

pub fn parse_saved_object(value: Value) -> Result<SearchSessionSavedObject, ErrorInfo> {
    let object: SearchSessionSavedObject = serde_json::from_value(value).map_err(|err| {
        ErrorInfo::new(
            "invalid_session",
            format!("session payload is invalid JSON: {}", err),
        )
    })?;
    object.validate()?;
    Ok(object)
}

fn require_string(value: &str, field: &str) -> Result<(), ErrorInfo> {
    if value.trim().is_empty() {
        return Err(ErrorInfo::new(
            "missing_field",
            format!("{} is required", field),
        ));
    }
    Ok(())
}
