use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    /// Base URL of the web front end, used by `open`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    /// Auto-refresh interval in seconds (default: 30)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Per-request timeout in seconds (default: 20)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub theme: ThemeMode,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Auto,
    Dark,
    Light,
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    20
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            site_url: None,
            refresh_interval: default_refresh_interval(),
            request_timeout: default_request_timeout(),
            locale: default_locale(),
            theme: ThemeMode::default(),
        }
    }
}

impl Config {
    /// Validate field values, collecting every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.refresh_interval == 0 {
            errors.push("refresh_interval must be at least 1 second".to_string());
        }
        if self.request_timeout == 0 {
            errors.push("request_timeout must be at least 1 second".to_string());
        }
        if let Some(url) = &self.backend.url {
            if let Err(e) = reqwest::Url::parse(url) {
                errors.push(format!("backend.url '{}' is not a valid URL: {}", url, e));
            }
        }
        if let Some(site) = &self.site_url {
            if let Err(e) = reqwest::Url::parse(site) {
                errors.push(format!("site_url '{}' is not a valid URL: {}", site, e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_gets_defaults() {
        let config: Config = serde_saphyr::from_str("backend:\n  url: https://abc.supabase.co\n").unwrap();
        assert_eq!(config.backend.url.as_deref(), Some("https://abc.supabase.co"));
        assert!(config.backend.anon_key.is_none());
        assert_eq!(config.refresh_interval, 30);
        assert_eq!(config.request_timeout, 20);
        assert_eq!(config.locale, "en");
        assert_eq!(config.theme, ThemeMode::Auto);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
backend:
  url: https://abc.supabase.co
  anon_key: secret
site_url: https://scores.example.com
refresh_interval: 10
request_timeout: 5
locale: de
theme: light
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.site_url.as_deref(), Some("https://scores.example.com"));
        assert_eq!(config.refresh_interval, 10);
        assert_eq!(config.locale, "de");
        assert_eq!(config.theme, ThemeMode::Light);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_errors() {
        let config = Config {
            backend: BackendConfig {
                url: Some("not a url".to_string()),
                anon_key: None,
            },
            refresh_interval: 0,
            request_timeout: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("refresh_interval"));
    }
}
