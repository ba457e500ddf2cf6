use chrono::Utc;
use reqwest::Method;
use tracing::{debug, info};

use super::client::{send_json, BackendClient};
use super::error::{BackendError, Result};
use super::types::{Entry, Leaderboard, NewEntry};
use crate::ranking::ValidEntry;

/// Column pair the data store keeps unique per leaderboard
const SUBJECT_CONFLICT_TARGET: &str = "leaderboard_id,team_name";

/// What happened to a submitted score
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A new entry was inserted
    Created(Entry),
    /// The board allows updates; the team's entry now holds this score
    Saved(Entry),
}

impl SubmitOutcome {
    pub fn entry(&self) -> &Entry {
        match self {
            SubmitOutcome::Created(e) | SubmitOutcome::Saved(e) => e,
        }
    }
}

/// All entries of a leaderboard, in no particular order
pub async fn list_entries(client: &BackendClient, leaderboard_id: i64) -> Result<Vec<Entry>> {
    let id_filter = format!("eq.{}", leaderboard_id);
    let entries: Vec<Entry> = send_json(
        client.request(Method::GET, "entries", &[("select", "*"), ("leaderboard_id", &id_filter)]),
        None,
    )
    .await?;
    debug!(leaderboard_id, count = entries.len(), "fetched entries");
    Ok(entries)
}

/// Submit a validated score.
///
/// Uniqueness of the team name is left to the data store. Boards that
/// forbid updates get a plain insert, and a uniqueness conflict comes back
/// as [`BackendError::DuplicateSubject`]. Boards that allow updates get an
/// upsert on the same key, so two clients racing on one team name cannot
/// both insert.
pub async fn submit_entry(client: &BackendClient, board: &Leaderboard, entry: &ValidEntry) -> Result<SubmitOutcome> {
    let row = NewEntry {
        leaderboard_id: board.id,
        team_name: entry.team_name.clone(),
        score: entry.score,
        updated_at: board.allow_updates.then(Utc::now),
    };

    let request = if board.allow_updates {
        client
            .request(Method::POST, "entries", &[("on_conflict", SUBJECT_CONFLICT_TARGET)])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
    } else {
        client
            .request(Method::POST, "entries", &[])
            .header("Prefer", "return=representation")
    };

    let rows: Vec<Entry> = send_json(request.json(&[row]), Some(&entry.team_name)).await?;
    let saved = rows
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Decode("insert returned no rows".to_string()))?;

    info!(leaderboard_id = board.id, team = %saved.team_name, score = saved.score, "entry submitted");

    Ok(if board.allow_updates {
        SubmitOutcome::Saved(saved)
    } else {
        SubmitOutcome::Created(saved)
    })
}
