//! Environment-driven settings
//!
//! Values come from the process environment, with a `.env` file loaded first when present.

use log::warn;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:durabata.db?mode=rwc";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub allowed_origins: Vec<String>,
    pub static_dir: PathBuf,
    /// JSON product list replacing the bundled catalog.
    pub catalog_path: Option<PathBuf>,
    pub gemini: GeminiSettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Settings {
        dotenvy::dotenv().ok();
        Settings::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let timeout_secs = match var("GEMINI_TIMEOUT_SECS") {
            Some(raw) => u64::from_str(raw.trim()).unwrap_or_else(|_| {
                warn!("GEMINI_TIMEOUT_SECS={raw} is not a number, using {DEFAULT_GEMINI_TIMEOUT_SECS}");
                DEFAULT_GEMINI_TIMEOUT_SECS
            }),
            None => DEFAULT_GEMINI_TIMEOUT_SECS,
        };

        Settings {
            database_url: var("DATABASE_URL").unwrap_or(DEFAULT_DATABASE_URL.to_owned()),
            bind_address: var("BIND_ADDRESS").unwrap_or(DEFAULT_BIND_ADDRESS.to_owned()),
            allowed_origins: var("ALLOWED_ORIGINS")
                .unwrap_or(DEFAULT_ALLOWED_ORIGINS.to_owned())
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            static_dir: var("STATIC_DIR")
                .unwrap_or(DEFAULT_STATIC_DIR.to_owned())
                .into(),
            catalog_path: var("CATALOG_PATH").map(PathBuf::from),
            gemini: GeminiSettings {
                api_key: var("GEMINI_API_KEY"),
                model: var("GEMINI_MODEL").unwrap_or(DEFAULT_GEMINI_MODEL.to_owned()),
                base_url: var("GEMINI_BASE_URL")
                    .unwrap_or(DEFAULT_GEMINI_BASE_URL.to_owned())
                    .trim_end_matches('/')
                    .to_owned(),
                timeout: Duration::from_secs(timeout_secs),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let settings = settings_from(&[]);

        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(settings.allowed_origins.len(), 2);
        assert!(settings.catalog_path.is_none());
        assert!(settings.gemini.api_key.is_none());
        assert_eq!(settings.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.gemini.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_are_applied() {
        let settings = settings_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("ALLOWED_ORIGINS", "https://durabata.id, ,https://www.durabata.id"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_BASE_URL", "http://localhost:8080/"),
            ("GEMINI_TIMEOUT_SECS", "5"),
        ]);

        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(
            settings.allowed_origins,
            vec!["https://durabata.id", "https://www.durabata.id"]
        );
        assert_eq!(settings.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.gemini.base_url, "http://localhost:8080");
        assert_eq!(settings.gemini.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let settings = settings_from(&[("GEMINI_API_KEY", "   ")]);
        assert!(settings.gemini.api_key.is_none());
    }

    #[test]
    fn test_invalid_timeout_falls_back_to_default() {
        let settings = settings_from(&[("GEMINI_TIMEOUT_SECS", "soon")]);
        assert_eq!(settings.gemini.timeout, Duration::from_secs(30));
    }
}
