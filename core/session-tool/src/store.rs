//! `list`, `show` and `delete` over the configured session store.

use std::io::{self, Write};

use search_session::{FileSessionsClient, Result, SessionConfig, SessionError, SessionsClient};
use search_session_protocol::SearchSessionSavedObject;

fn client(config: &SessionConfig) -> Result<FileSessionsClient> {
    Ok(FileSessionsClient::new(config.store_path()?))
}

pub async fn list(config: &SessionConfig) -> Result<()> {
    let sessions = client(config)?.list().await?;
    tracing::debug!(sessions = sessions.len(), "Listing stored sessions");
    write_lines(&mut io::stdout().lock(), &sessions)
}

pub async fn show(config: &SessionConfig, session_id: &str) -> Result<()> {
    let session = client(config)?
        .get(session_id)
        .await?
        .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))?;
    let pretty = serde_json::to_string_pretty(&session).map_err(|source| SessionError::Json {
        context: "Failed to serialize session".to_string(),
        source,
    })?;
    println!("{}", pretty);
    Ok(())
}

pub async fn delete(config: &SessionConfig, session_id: &str) -> Result<()> {
    client(config)?.delete(session_id).await?;
    tracing::info!(session_id = %session_id, "Session deleted from CLI");
    Ok(())
}

fn write_lines(out: &mut impl Write, sessions: &[SearchSessionSavedObject]) -> Result<()> {
    for session in sessions {
        serde_json::to_writer(&mut *out, session).map_err(|source| SessionError::Json {
            context: "Failed to serialize session".to_string(),
            source,
        })?;
        out.write_all(b"\n").map_err(|source| SessionError::Io {
            context: "Failed to write session list".to_string(),
            source,
        })?;
    }
    Ok(())
}
