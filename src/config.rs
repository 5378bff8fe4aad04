//! Runtime configuration from the environment (and `.env`)

use std::env;

pub const DB_PATH_VAR: &str = "TREINO_DB";
pub const SETTINGS_PATH_VAR: &str = "TREINO_SETTINGS";

const DEFAULT_DB_PATH: &str = "treino.db";
const DEFAULT_SETTINGS_PATH: &str = "treino-settings.json";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite file holding the document collections
    pub db_path: String,
    /// JSON file acting as local client storage
    pub settings_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            settings_path: DEFAULT_SETTINGS_PATH.to_string(),
        }
    }
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env_opt(DB_PATH_VAR).unwrap_or(defaults.db_path),
            settings_path: env_opt(SETTINGS_PATH_VAR).unwrap_or(defaults.settings_path),
        }
    }

    /// Command-line values win over the environment
    pub fn with_overrides(mut self, db_path: Option<String>, settings_path: Option<String>) -> Self {
        if let Some(path) = db_path {
            self.db_path = path;
        }
        if let Some(path) = settings_path {
            self.settings_path = path;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(Some("x.db".to_string()), None);
        assert_eq!(config.db_path, "x.db");
        assert_eq!(config.settings_path, DEFAULT_SETTINGS_PATH);
    }
}
