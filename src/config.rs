//! Configuration loading for chatctl.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chat::types::{IdentifyBehavior, MembersType};
use crate::error::{Error, Result};

/// Longest alias floor accepted, the length of a full conversation id.
const MAX_ALIAS_MIN_BYTES: usize = 16;

/// Get the chatctl home directory (~/.chatctl).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".chatctl"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.chatctl/settings.json, or defaults when it is absent.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::debug!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.service.endpoint.trim().is_empty() {
        return Err(Error::Config("service.endpoint must not be empty".to_string()));
    }
    if settings.service.timeout_secs == 0 {
        return Err(Error::Config(
            "service.timeout_secs must be greater than zero".to_string(),
        ));
    }
    let min = settings.chat.alias_min_bytes;
    if !(1..=MAX_ALIAS_MIN_BYTES).contains(&min) {
        return Err(Error::Config(format!(
            "chat.alias_min_bytes must be between 1 and {}, got {}",
            MAX_ALIAS_MIN_BYTES, min
        )));
    }
    Ok(())
}

/// Background service connection.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Service {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:7823".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Service {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Service {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Conversation lookup defaults.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Chat {
    #[serde(default)]
    pub default_members_type: MembersType,
    #[serde(default = "default_alias_min_bytes")]
    pub alias_min_bytes: usize,
    #[serde(default)]
    pub identify_behavior: IdentifyBehavior,
}

fn default_alias_min_bytes() -> usize {
    2
}

impl Default for Chat {
    fn default() -> Self {
        Self {
            default_members_type: MembersType::default(),
            alias_min_bytes: default_alias_min_bytes(),
            identify_behavior: IdentifyBehavior::default(),
        }
    }
}

/// chatctl settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub service: Service,

    #[serde(default)]
    pub chat: Chat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings.service.endpoint, "http://127.0.0.1:7823");
        assert_eq!(settings.service.timeout(), Duration::from_secs(30));
        assert_eq!(settings.chat.alias_min_bytes, 2);
        assert_eq!(settings.chat.default_members_type, MembersType::ImpTeamNative);
        assert_eq!(settings.chat.identify_behavior, IdentifyBehavior::ChatCli);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "chat": { "default_members_type": "kbfs" }, "service": { "timeout_secs": 5 } }"#,
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.chat.default_members_type, MembersType::Kbfs);
        assert_eq!(settings.chat.alias_min_bytes, 2);
        assert_eq!(settings.service.timeout_secs, 5);
        assert_eq!(settings.service.endpoint, "http://127.0.0.1:7823");
    }

    #[test]
    fn test_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{ "chat": { "alias_min_bytes": 0 } }"#).unwrap();
        assert!(matches!(load_settings_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, r#"{ "service": { "timeout_secs": 0 } }"#).unwrap();
        assert!(matches!(load_settings_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, r#"{ "service": { "endpoint": " " } }"#).unwrap();
        assert!(matches!(load_settings_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_settings_from(&path), Err(Error::Json(_))));
    }
}
