//! Configuration management
//!
//! Two files: shared settings (safe to commit) and personal settings
//! (credentials). Both are read once at startup and never mutated.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::application::errors::ConfigError;

/// Shared, non-secret settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SharedSettings {
    /// Guild the bot lives in
    pub server: String,
    pub data_dir: PathBuf,
    pub botty: BottyConfig,
    pub info: InfoConfig,
    pub uptime: UptimeConfig,
    pub version_checker: VersionCheckerConfig,
    pub forum: ForumConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BottyConfig {
    pub nickname: String,
    pub prefix: String,
    pub ignore_bots: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InfoConfig {
    pub enabled: bool,
    pub command: String,
    /// Role ids allowed to add and remove entries
    pub allowed_roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UptimeConfig {
    pub enabled: bool,
    pub check_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct VersionCheckerConfig {
    pub enabled: bool,
    pub check_interval_ms: u64,
    pub realm_url: String,
    /// `{major}` and `{minor}` are substituted
    pub patch_notes_url: String,
    pub max_tries: u32,
    /// `major.minor` to start checking from when nothing is stored yet
    pub initial_game_version: String,
    pub data_dragon_thumbnail: String,
    pub game_thumbnail: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ForumConfig {
    /// Channel name announcements go to
    pub channel: String,
}

/// Personal settings - credentials, never shared
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PersonalSettings {
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscordConfig {
    pub key: String,
    pub owner: Option<String>,
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self {
            server: "console".to_string(),
            data_dir: PathBuf::from("./data"),
            botty: BottyConfig::default(),
            info: InfoConfig::default(),
            uptime: UptimeConfig::default(),
            version_checker: VersionCheckerConfig::default(),
            forum: ForumConfig::default(),
        }
    }
}

impl Default for BottyConfig {
    fn default() -> Self {
        Self {
            nickname: "Botty McBotface".to_string(),
            prefix: "!".to_string(),
            ignore_bots: true,
        }
    }
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "info".to_string(),
            allowed_roles: Vec::new(),
        }
    }
}

impl Default for UptimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_ms: 60_000,
        }
    }
}

impl Default for VersionCheckerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            check_interval_ms: 600_000,
            realm_url: "http://ddragon.leagueoflegends.com/realms/na.json".to_string(),
            patch_notes_url: "https://na.leagueoflegends.com/en/news/game-updates/patch/patch-{major}{minor}-notes".to_string(),
            max_tries: 100,
            initial_game_version: "9.1".to_string(),
            data_dragon_thumbnail: String::new(),
            game_thumbnail: String::new(),
        }
    }
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            channel: "announcements".to_string(),
        }
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;

    serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::Parse(format!("Failed to parse {}: {}", path.display(), e)))
}

fn is_game_version(version: &str) -> bool {
    match version.split_once('.') {
        Some((major, minor)) => major.parse::<u32>().is_ok() && minor.parse::<u32>().is_ok(),
        None => false,
    }
}

impl SharedSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Self = read_yaml(path.as_ref())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut settings = SharedSettings::default();

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            settings.botty.prefix = prefix;
        }

        if let Ok(server) = std::env::var("BOT_SERVER") {
            settings.server = server;
        }

        settings
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.botty.prefix.is_empty() {
            return Err(ConfigError::InvalidValue("botty.prefix must not be empty".to_string()));
        }
        if self.uptime.check_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("uptime.check-interval-ms must be positive".to_string()));
        }
        if self.version_checker.check_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("version-checker.check-interval-ms must be positive".to_string()));
        }
        if !is_game_version(&self.version_checker.initial_game_version) {
            return Err(ConfigError::InvalidValue(format!(
                "version-checker.initial-game-version must look like 8.12, got '{}'",
                self.version_checker.initial_game_version
            )));
        }
        Ok(())
    }
}

impl PersonalSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_yaml(path.as_ref())
    }

    pub fn load_env() -> Self {
        let mut settings = PersonalSettings::default();

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            settings.discord.key = token;
        }

        settings
    }
}
