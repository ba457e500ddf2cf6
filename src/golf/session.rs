use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

const SESSION_VERSION: u32 = 1;

/// A team's code-golf attempt, started with `golf start` and consumed by `golf submit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GolfSession {
    pub version: u32,
    pub category: u8,
    pub team_number: u32,
    pub language: String,
    pub started_at: DateTime<Utc>,
}

impl GolfSession {
    pub fn new(category: u8, team_number: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            version: SESSION_VERSION,
            category,
            team_number,
            language: "javascript".to_string(),
            started_at,
        }
    }

    /// Seconds between start and `now`, never negative
    pub fn solve_time_seconds(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.started_at).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }
}

/// Get the default session file path (~/.config/scoreboard/golf-session.json)
pub fn get_session_path() -> PathBuf {
    crate::config::get_config_dir().join("golf-session.json")
}

/// Load the current session, `None` if no challenge was started
pub fn load_session(path: &Path) -> Result<Option<GolfSession>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open golf session file at {}", path.display()))?;
    let session: GolfSession =
        serde_json::from_reader(file).context("Failed to load golf session")?;

    if session.version != SESSION_VERSION {
        anyhow::bail!("Unsupported golf session version: {}", session.version);
    }

    Ok(Some(session))
}

/// Save the session atomically. A previous session is replaced.
pub fn save_session(path: &Path, session: &GolfSession) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, session).context("Failed to serialize golf session")?;
    file.commit().context("Failed to save golf session")?;

    Ok(())
}

pub fn clear_session(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_session(&dir.path().join("none.json")).unwrap().is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("golf-session.json");
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let session = GolfSession::new(2, 14, started);

        save_session(&path, &session).unwrap();
        assert_eq!(load_session(&path).unwrap(), Some(session));

        clear_session(&path).unwrap();
        assert!(load_session(&path).unwrap().is_none());
        clear_session(&path).unwrap();
    }

    #[test]
    fn test_unknown_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("golf-session.json");
        std::fs::write(
            &path,
            r#"{"version":9,"category":1,"team_number":1,"language":"javascript","started_at":"2024-03-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert!(load_session(&path).is_err());
    }

    #[test]
    fn test_solve_time() {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let session = GolfSession::new(1, 3, started);
        assert_eq!(session.solve_time_seconds(started + Duration::milliseconds(95_500)), 95.5);
        assert_eq!(session.solve_time_seconds(started - Duration::seconds(5)), 0.0);
    }
}
