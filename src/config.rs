//! Application-level configuration loading, including the defaults seeded into new games.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAME_FORGE_BACK_CONFIG_PATH";
const DEFAULT_GAME_NAME: &str = "Default Game";
const DEFAULT_RULE_BOOK: &str = "Default Rule Book";
const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    default_game_name: String,
    default_rule_book: String,
    event_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        game_name = %app_config.default_game_name,
                        event_capacity = app_config.event_capacity,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Name given to the game created for a new account.
    pub fn default_game_name(&self) -> &str {
        &self.default_game_name
    }

    /// Rulebook content seeded into a new game.
    pub fn default_rule_book(&self) -> &str {
        &self.default_rule_book
    }

    /// Per-subscriber buffer of the change feed.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_game_name: DEFAULT_GAME_NAME.into(),
            default_rule_book: DEFAULT_RULE_BOOK.into(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    default_game_name: Option<String>,
    #[serde(default)]
    default_rule_book: Option<String>,
    #[serde(default)]
    event_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            default_game_name: value
                .default_game_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.default_game_name),
            default_rule_book: value
                .default_rule_book
                .unwrap_or(defaults.default_rule_book),
            event_capacity: value
                .event_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.event_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r##"{"default_rule_book":"# House rules"}"##).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.default_game_name(), DEFAULT_GAME_NAME);
        assert_eq!(config.default_rule_book(), "# House rules");
        assert_eq!(config.event_capacity(), DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn blank_name_and_zero_capacity_are_ignored() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"default_game_name":"  ","event_capacity":0}"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.default_game_name(), DEFAULT_GAME_NAME);
        assert_eq!(config.event_capacity(), DEFAULT_EVENT_CAPACITY);
    }
}
