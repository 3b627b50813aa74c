//! Runtime configuration, resolved once at the CLI boundary.
//!
//! Precedence: explicit command-line argument > environment variable >
//! stored default. Core modules never read the environment themselves;
//! they receive the resolved values.

use std::path::{Path, PathBuf};

use log::debug;

/// Container for runtime configuration values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_currency: String,
    pub valuation_source: String,
    pub valuation_cache_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_currency: "GBP".to_string(),
            valuation_source: "scryfall".to_string(),
            valuation_cache_path: default_cache_path(),
        }
    }
}

/// Default valuation cache location: `<cache dir>/mtg_decks/valuation-cache.json`
fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mtg_decks")
        .join("valuation-cache.json")
}

/// Loads configuration from the environment, optionally seeded from a
/// `KEY=VALUE` .env file. Real environment variables always win over .env
/// entries.
pub fn load_config(env_path: Option<&Path>) -> AppConfig {
    let file_vars = env_path.map(read_env_file).unwrap_or_default();

    let lookup = |key: &str| -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| file_vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
            .filter(|value| !value.is_empty())
    };

    let defaults = AppConfig::default();
    AppConfig {
        default_currency: lookup("MTG_DECKS_CURRENCY").unwrap_or(defaults.default_currency),
        valuation_source: lookup("MTG_DECKS_VALUATION_SOURCE").unwrap_or(defaults.valuation_source),
        valuation_cache_path: lookup("MTG_DECKS_VALUATION_CACHE")
            .map(PathBuf::from)
            .unwrap_or(defaults.valuation_cache_path),
    }
}

fn read_env_file(path: &Path) -> Vec<(String, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        debug!("No .env file at {}", path.display());
        return Vec::new();
    };

    content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            let (key, value) = trimmed.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        let config = load_config(None);
        // Environment may legitimately override these in a dev shell; only
        // assert they are non-empty and well-formed.
        assert!(!config.default_currency.is_empty());
        assert!(!config.valuation_source.is_empty());
        assert!(config
            .valuation_cache_path
            .to_string_lossy()
            .contains("valuation-cache.json"));
    }

    #[test]
    fn test_env_file_parsing() {
        let dir = tempfile::TempDir::new().unwrap();
        let env_path = dir.path().join(".env");
        std::fs::write(
            &env_path,
            "# comment\nMTG_DECKS_CURRENCY=eur\n\nBROKEN LINE\nMTG_DECKS_VALUATION_SOURCE=scryfall\n",
        )
        .unwrap();

        let vars = read_env_file(&env_path);
        assert_eq!(
            vars,
            vec![
                ("MTG_DECKS_CURRENCY".to_string(), "eur".to_string()),
                ("MTG_DECKS_VALUATION_SOURCE".to_string(), "scryfall".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_env_file_is_empty() {
        assert!(read_env_file(Path::new("/nonexistent/.env")).is_empty());
    }
}
