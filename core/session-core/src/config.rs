//! Configuration loading.
//!
//! Reads `~/.search-session/config.toml` unless a path is given. Every field
//! has a default, so a missing file is equivalent to an empty one.
//!
//! ```toml
//! [navigation]
//! mode = "deferred"
//! deferred_delay_ms = 100
//!
//! [store]
//! path = "/var/lib/search-session/sessions.json"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SessionError};

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".search-session/config.toml";
const DEFAULT_STORE_RELATIVE_PATH: &str = ".search-session/sessions.json";
const DEFAULT_DEFERRED_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    #[default]
    Immediate,
    Deferred,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NavigationConfig {
    #[serde(default)]
    pub mode: NavigationMode,
    #[serde(default = "default_deferred_delay_ms")]
    pub deferred_delay_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            mode: NavigationMode::default(),
            deferred_delay_ms: default_deferred_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl SessionConfig {
    /// The configured store path, or `~/.search-session/sessions.json`.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => home_relative(DEFAULT_STORE_RELATIVE_PATH),
        }
    }
}

fn default_deferred_delay_ms() -> u64 {
    DEFAULT_DEFERRED_DELAY_MS
}

fn home_relative(relative: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(SessionError::HomeDirNotFound)?;
    Ok(home.join(relative))
}

pub fn default_config_path() -> Result<PathBuf> {
    home_relative(DEFAULT_CONFIG_RELATIVE_PATH)
}

pub fn load_config(path: Option<PathBuf>) -> Result<SessionConfig> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };

    if !config_path.exists() {
        return Ok(SessionConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| SessionError::Io {
        context: format!("Failed to read config {}", config_path.display()),
        source,
    })?;
    parse_config(&config_path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<SessionConfig> {
    toml::from_str::<SessionConfig>(content).map_err(|err| SessionError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(Some(temp_dir.path().join("missing.toml"))).expect("load");
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.navigation.mode, NavigationMode::Immediate);
        assert_eq!(config.navigation.deferred_delay_ms, 100);
    }

    #[test]
    fn load_config_parses_navigation_and_store() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(
            &path,
            r#"
[navigation]
mode = "deferred"
deferred_delay_ms = 250

[store]
path = "/tmp/sessions.json"
"#,
        )
        .expect("write config");

        let config = load_config(Some(path)).expect("load");
        assert_eq!(config.navigation.mode, NavigationMode::Deferred);
        assert_eq!(config.navigation.deferred_delay_ms, 250);
        assert_eq!(
            config.store_path().expect("store path"),
            PathBuf::from("/tmp/sessions.json")
        );
    }

    #[test]
    fn partial_navigation_table_keeps_default_delay() {
        let config =
            parse_config(Path::new("inline.toml"), "[navigation]\nmode = \"deferred\"\n")
                .expect("parse");
        assert_eq!(config.navigation.mode, NavigationMode::Deferred);
        assert_eq!(config.navigation.deferred_delay_ms, 100);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = parse_config(Path::new("bad.toml"), "[navigation]\nmode = \"lenient\"\n")
            .expect_err("unknown mode");
        assert!(matches!(err, SessionError::ConfigMalformed { .. }));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse_config(Path::new("bad.toml"), "[store]\nfile = \"x\"\n")
            .expect_err("unknown key");
        assert!(matches!(err, SessionError::ConfigMalformed { .. }));
    }
}
