//! `save`: persist a session the way an application would.
//!
//! Runs the full service flow: record the current app, start or restore the
//! session, register a provider describing it, then save.

use std::sync::Arc;

use clap::Args;
use search_session::{
    FileSessionsClient, Result, SaveOutcome, SessionConfig, SessionError, SessionService,
    StaticInfoProvider, UrlGeneratorData,
};
use serde_json::Value;

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Application that owns the session
    #[arg(long, value_name = "APP")]
    pub app: String,

    /// User-facing session name
    #[arg(long)]
    pub name: String,

    /// Restoration target (URL generator id)
    #[arg(long, value_name = "ID")]
    pub generator: String,

    /// Initial state as JSON
    #[arg(long, value_name = "JSON", default_value = "{}")]
    pub initial_state: String,

    /// Restore state as JSON
    #[arg(long, value_name = "JSON", default_value = "{}")]
    pub restore_state: String,

    /// Re-save an existing session id instead of starting a new one
    #[arg(long, value_name = "SESSION_ID")]
    pub restore: Option<String>,
}

pub async fn run(config: &SessionConfig, args: SaveArgs) -> Result<String> {
    let data = UrlGeneratorData {
        url_generator_id: args.generator,
        initial_state: parse_state(&args.initial_state, "initial state")?,
        restore_state: parse_state(&args.restore_state, "restore state")?,
    };

    let client = Arc::new(FileSessionsClient::new(config.store_path()?));
    let service = SessionService::from_config(config, client);
    service.handle_app_change(Some(args.app));

    let session_id = match args.restore {
        Some(session_id) => {
            service.restore(&session_id);
            session_id
        }
        None => service.start(),
    };
    service.set_search_session_info_provider(Some(Arc::new(StaticInfoProvider::new(
        args.name, data,
    ))));

    let outcome = service.save().await;
    service.destroy();

    match outcome? {
        SaveOutcome::Stored => {
            tracing::info!(session_id = %session_id, "Session saved from CLI");
        }
        // Persisted, but the service moved on before it could mark it stored.
        SaveOutcome::Stale => {
            tracing::warn!(session_id = %session_id, "Session saved after it was replaced");
        }
    }
    Ok(session_id)
}

fn parse_state(raw: &str, what: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|source| SessionError::Json {
        context: format!("Failed to parse {}", what),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_session::{SessionsClient, StoreConfig};
    use serde_json::json;

    fn config_in(dir: &std::path::Path) -> SessionConfig {
        SessionConfig {
            store: StoreConfig {
                path: Some(dir.join("sessions.json")),
            },
            ..SessionConfig::default()
        }
    }

    fn args() -> SaveArgs {
        SaveArgs {
            app: "discover".to_string(),
            name: "Flights".to_string(),
            generator: "discover-app-url".to_string(),
            initial_state: r#"{"query":"carrier:JetBeats"}"#.to_string(),
            restore_state: "{}".to_string(),
            restore: None,
        }
    }

    #[tokio::test]
    async fn save_writes_session_to_store() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = config_in(temp.path());

        let session_id = run(&config, args()).await.expect("save");

        let client = FileSessionsClient::new(config.store_path().expect("store path"));
        let stored = client.get(&session_id).await.expect("get").expect("stored");
        assert_eq!(stored.name, "Flights");
        assert_eq!(stored.app_id, "discover");
        assert_eq!(stored.initial_state, json!({ "query": "carrier:JetBeats" }));
    }

    #[tokio::test]
    async fn save_with_restore_keeps_session_id() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = config_in(temp.path());
        let mut args = args();
        args.restore = Some("01HZX3J5W8R0K3M9Q2T7V6B4NA".to_string());

        let session_id = run(&config, args).await.expect("save");
        assert_eq!(session_id, "01HZX3J5W8R0K3M9Q2T7V6B4NA");
    }

    #[tokio::test]
    async fn save_rejects_malformed_state() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = config_in(temp.path());
        let mut args = args();
        args.initial_state = "{not json".to_string();

        let err = run(&config, args).await.expect_err("bad json");
        assert!(matches!(err, SessionError::Json { .. }));
        assert!(!temp.path().join("sessions.json").exists());
    }
}
