// Configuration loader
// Loads settings from a TOML file with an environment-variable fallback
// for the API key

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::{Config, RateLimitConfig};
use crate::store::HotspotThresholds;

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Load configuration. Explicit `path` wins; otherwise
/// `~/.vaani/config.toml` is tried, and finally the environment alone.
/// A missing API key anywhere is a hard startup failure.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    if let Some(p) = config_path.as_deref() {
        if p.exists() {
            return load_from_file(p);
        }
        if path.is_some() {
            bail!("Config file not found: {}", p.display());
        }
    }

    // No file: the environment must carry the key
    let api_key = env_api_key().ok_or_else(|| missing_key_error())?;
    let config = Config::with_api_key(api_key);
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn load_from_file(path: &Path) -> Result<Config> {
    #[derive(serde::Deserialize)]
    struct TomlConfig {
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default)]
        request_timeout_secs: Option<u64>,
        #[serde(default)]
        db_path: Option<PathBuf>,
        #[serde(default)]
        bind_address: Option<String>,
        #[serde(default)]
        rate_limit: Option<RateLimitConfig>,
        #[serde(default)]
        hotspots: Option<HotspotThresholds>,
        #[serde(default)]
        knowledge_note: Option<String>,
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let toml_config: TomlConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    let api_key = toml_config
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(env_api_key)
        .ok_or_else(missing_key_error)?;

    let mut config = Config::with_api_key(api_key);
    if let Some(model) = toml_config.model {
        config.model = model;
    }
    if let Some(max_tokens) = toml_config.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(timeout) = toml_config.request_timeout_secs {
        config.request_timeout_secs = timeout;
    }
    if let Some(db_path) = toml_config.db_path {
        config.db_path = db_path;
    }
    if let Some(bind_address) = toml_config.bind_address {
        config.bind_address = bind_address;
    }
    if let Some(rate_limit) = toml_config.rate_limit {
        config.rate_limit = rate_limit;
    }
    if let Some(hotspots) = toml_config.hotspots {
        config.hotspots = hotspots;
    }
    if let Some(note) = toml_config.knowledge_note {
        config.knowledge_note = note;
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".vaani").join("config.toml"))
}

fn env_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}

fn missing_key_error() -> anyhow::Error {
    anyhow::anyhow!(
        "No LLM API key configured. Set `api_key` in ~/.vaani/config.toml \
         or export {API_KEY_ENV}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "api_key = \"sk-test\"\n\
             model = \"test-model\"\n\
             bind_address = \"127.0.0.1:9999\"\n\
             \n\
             [hotspots]\n\
             low = 3\n\
             medium = 6\n\
             high = 9\n\
             critical = 12\n"
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "test-model");
        assert_eq!(config.bind_address, "127.0.0.1:9999");
        assert_eq!(config.hotspots.critical, 12);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let err = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_file_without_key_fails_without_env() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = \"test-model\"\n").unwrap();

        // Only meaningful when the environment doesn't carry a key
        if std::env::var(API_KEY_ENV).is_err() {
            let err = load_config(Some(&path)).unwrap_err();
            assert!(err.to_string().contains("No LLM API key"));
        }
    }
}
