use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, BackendConfig, Config, ThemeMode};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

fn prompt_url(message: &str, required: bool) -> Result<Option<String>> {
    loop {
        let input = prompt(&format!("{}: ", message))?;
        if input.is_empty() {
            if required {
                println!("  A URL is required.");
                continue;
            }
            return Ok(None);
        }
        match reqwest::Url::parse(&input) {
            Ok(_) => return Ok(Some(input)),
            Err(e) => println!("  Invalid URL: {}. Try again.", e),
        }
    }
}

fn prompt_seconds(message: &str, default: u64) -> Result<u64> {
    loop {
        let input = prompt_with_default(message, &default.to_string())?;
        match input.parse::<u64>() {
            Ok(v) if v > 0 => return Ok(v),
            _ => println!("  Invalid: must be a whole number of seconds above zero."),
        }
    }
}

fn parse_theme(input: &str) -> Option<ThemeMode> {
    match input.to_lowercase().as_str() {
        "auto" => Some(ThemeMode::Auto),
        "dark" => Some(ThemeMode::Dark),
        "light" => Some(ThemeMode::Light),
        _ => None,
    }
}

/// Serialize and write the config file atomically, creating parent directories
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;
    Ok(())
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("Scoreboard Configuration Wizard");
    println!("===============================");
    println!();
    println!("Scoreboard reads leaderboards from a Supabase project.");
    println!("You will find the URL and anon key under Project Settings > API.");
    println!();

    let url = prompt_url("Project URL (e.g., https://abcd.supabase.co)", true)?;

    let anon_key = loop {
        let key = rpassword::prompt_password("Anon key (input hidden): ")
            .context("Failed to read anon key from stdin")?;
        let key = key.trim().to_string();
        if !key.is_empty() {
            break key;
        }
        println!("  The anon key is required.");
    };

    println!();
    let site_url = prompt_url("Web front end URL for `open` (blank to skip)", false)?;
    let refresh_interval = prompt_seconds("Auto-refresh interval in seconds", 30)?;
    let request_timeout = prompt_seconds("Request timeout in seconds", 20)?;
    let locale = prompt_with_default("Number locale", "en")?;
    let theme = loop {
        let input = prompt_with_default("Theme (auto, dark, light)", "auto")?;
        match parse_theme(&input) {
            Some(theme) => break theme,
            None => println!("  Invalid: choose auto, dark or light."),
        }
    };

    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!("Config already exists at {}. Overwrite?", config_path.display()),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    let config = Config {
        backend: BackendConfig {
            url,
            anon_key: Some(anon_key),
        },
        site_url,
        refresh_interval,
        request_timeout,
        locale,
        theme,
    };
    write_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `scoreboard` to list leaderboards.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_theme() {
        assert_eq!(parse_theme("Dark"), Some(ThemeMode::Dark));
        assert_eq!(parse_theme("auto"), Some(ThemeMode::Auto));
        assert_eq!(parse_theme("sepia"), None);
    }

    #[test]
    fn test_write_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = Config {
            backend: BackendConfig {
                url: Some("https://abcd.supabase.co".to_string()),
                anon_key: Some("anon".to_string()),
            },
            refresh_interval: 45,
            theme: ThemeMode::Light,
            ..Default::default()
        };

        write_config(&path, &config).unwrap();
        let loaded = crate::config::load_config(Some(path)).unwrap();

        assert_eq!(loaded.refresh_interval, 45);
        assert_eq!(loaded.theme, ThemeMode::Light);
        assert!(loaded.site_url.is_none());
    }
}
