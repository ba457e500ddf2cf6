use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ranking::{Scored, ScoringPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub scoring_type: ScoringPolicy,
    pub score_label: String,
    #[serde(default)]
    pub allow_updates: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub leaderboard_id: i64,
    pub team_name: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Scored for Entry {
    fn id(&self) -> &str {
        &self.id
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A code-golf submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub category: u8,
    pub team_number: u32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub code: String,
    pub character_count: u32,
    #[serde(default)]
    pub solve_time_seconds: Option<f64>,
    #[serde(default)]
    pub is_valid: bool,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Display name, e.g. "cat-1-team-7"
    pub fn team_label(&self) -> String {
        format!("cat-{}-team-{}", self.category, self.team_number)
    }
}

/// Row body for inserting or updating a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardDraft {
    pub name: String,
    pub description: Option<String>,
    pub scoring_type: ScoringPolicy,
    pub score_label: String,
    pub allow_updates: bool,
    pub is_active: bool,
}

impl From<&Leaderboard> for LeaderboardDraft {
    fn from(board: &Leaderboard) -> Self {
        Self {
            name: board.name.clone(),
            description: board.description.clone(),
            scoring_type: board.scoring_type,
            score_label: board.score_label.clone(),
            allow_updates: board.allow_updates,
            is_active: board.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEntry {
    pub leaderboard_id: i64,
    pub team_name: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSubmission {
    pub category: u8,
    pub team_number: u32,
    pub language: String,
    pub code: String,
    pub character_count: u32,
    pub solve_time_seconds: Option<f64>,
    pub is_valid: bool,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "javascript".to_string()
}

/// Row ids arrive as uuids from some tables and integers from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
