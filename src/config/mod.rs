pub mod init;
mod schema;

pub use schema::{BackendConfig, Config, ThemeMode};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const URL_ENV: &str = "SCOREBOARD_URL";
pub const ANON_KEY_ENV: &str = "SCOREBOARD_ANON_KEY";

/// Get the config directory path (~/.config/scoreboard/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".config")
        .join("scoreboard")
}

/// Get the default config file path (~/.config/scoreboard/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<()> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory at {}", config_dir.display()))?;
    }
    Ok(())
}

/// Load configuration from a YAML file, then apply environment overrides.
///
/// An explicitly given path must exist. When no path is given and the default
/// file is missing, defaults are used so the tool can run from the environment
/// alone.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?
    } else if explicit {
        anyhow::bail!("Config file not found at {}", config_path.display());
    } else {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        Config::default()
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    if let Err(errors) = config.validate() {
        anyhow::bail!("Invalid config:\n  {}", errors.join("\n  "));
    }

    Ok(config)
}

/// Replace backend settings with non-empty values from `lookup`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(URL_ENV) {
        config.backend.url = Some(url);
    }
    if let Some(key) = get(ANON_KEY_ENV) {
        config.backend.anon_key = Some(key);
    }
}

impl Config {
    /// Data service URL and anonymous key, or a message telling the user how to set them
    pub fn backend_credentials(&self) -> Result<(&str, &str)> {
        let url = self.backend.url.as_deref().with_context(|| {
            format!(
                "No data service URL configured. Set backend.url in {} or {}",
                get_config_path().display(),
                URL_ENV
            )
        })?;
        let key = self.backend.anon_key.as_deref().with_context(|| {
            format!(
                "No anon key configured. Set backend.anon_key in {}, export {}, or run `scoreboard init`",
                get_config_path().display(),
                ANON_KEY_ENV
            )
        })?;
        Ok((url, key))
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
