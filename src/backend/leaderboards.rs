use reqwest::Method;
use tracing::debug;

use super::client::{send, send_json, BackendClient};
use super::error::{BackendError, Result};
use super::types::{Leaderboard, LeaderboardDraft};

const RETURN_REPRESENTATION: &str = "return=representation";

/// List leaderboards ordered by id. Inactive boards are skipped unless asked for.
pub async fn list_leaderboards(client: &BackendClient, include_inactive: bool) -> Result<Vec<Leaderboard>> {
    let mut params = vec![("select", "*"), ("order", "id.asc")];
    if !include_inactive {
        params.push(("is_active", "eq.true"));
    }
    let boards: Vec<Leaderboard> = send_json(client.request(Method::GET, "leaderboards", &params), None).await?;
    debug!(count = boards.len(), include_inactive, "listed leaderboards");
    Ok(boards)
}

pub async fn get_leaderboard(client: &BackendClient, id: i64) -> Result<Leaderboard> {
    let id_filter = format!("eq.{}", id);
    let rows: Vec<Leaderboard> = send_json(
        client.request(Method::GET, "leaderboards", &[("select", "*"), ("id", &id_filter)]),
        None,
    )
    .await?;
    first_or_not_found(rows, id)
}

pub async fn create_leaderboard(client: &BackendClient, draft: &LeaderboardDraft) -> Result<Leaderboard> {
    let rows: Vec<Leaderboard> = send_json(
        client
            .request(Method::POST, "leaderboards", &[])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[draft]),
        None,
    )
    .await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::Decode("insert returned no rows".to_string()))
}

pub async fn update_leaderboard(client: &BackendClient, id: i64, draft: &LeaderboardDraft) -> Result<Leaderboard> {
    let id_filter = format!("eq.{}", id);
    let rows: Vec<Leaderboard> = send_json(
        client
            .request(Method::PATCH, "leaderboards", &[("id", &id_filter)])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(draft),
        None,
    )
    .await?;
    first_or_not_found(rows, id)
}

/// Delete a leaderboard. Its entries go with it (cascade in the data store).
pub async fn delete_leaderboard(client: &BackendClient, id: i64) -> Result<Leaderboard> {
    let id_filter = format!("eq.{}", id);
    let rows: Vec<Leaderboard> = send_json(
        client
            .request(Method::DELETE, "leaderboards", &[("id", &id_filter)])
            .header("Prefer", RETURN_REPRESENTATION),
        None,
    )
    .await?;
    first_or_not_found(rows, id)
}

/// Number of entries on a leaderboard, read from the exact-count header
pub async fn count_entries(client: &BackendClient, leaderboard_id: i64) -> Result<u64> {
    let id_filter = format!("eq.{}", leaderboard_id);
    let response = send(
        client
            .request(Method::HEAD, "entries", &[("select", "*"), ("leaderboard_id", &id_filter)])
            .header("Prefer", "count=exact"),
        None,
    )
    .await?;

    let range = response
        .headers()
        .get(http::header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    parse_content_range_total(range)
        .ok_or_else(|| BackendError::Decode(format!("missing entry count in Content-Range '{}'", range)))
}

/// Total from a Content-Range value such as "0-24/57" or "*/0"
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn first_or_not_found(rows: Vec<Leaderboard>, id: i64) -> Result<Leaderboard> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("Leaderboard {}", id)))
}
