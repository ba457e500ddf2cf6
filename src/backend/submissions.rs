use reqwest::Method;
use tracing::{debug, info};

use super::client::{send_json, BackendClient};
use super::error::{BackendError, Result};
use super::types::{NewSubmission, Submission};

/// Valid code-golf submissions, unordered
pub async fn list_valid_submissions(client: &BackendClient) -> Result<Vec<Submission>> {
    let rows: Vec<Submission> = send_json(
        client.request(Method::GET, "submissions", &[("select", "*"), ("is_valid", "eq.true")]),
        None,
    )
    .await?;
    debug!(count = rows.len(), "fetched submissions");
    Ok(rows)
}

pub async fn insert_submission(client: &BackendClient, submission: &NewSubmission) -> Result<Submission> {
    let rows: Vec<Submission> = send_json(
        client
            .request(Method::POST, "submissions", &[])
            .header("Prefer", "return=representation")
            .json(&[submission]),
        None,
    )
    .await?;
    let saved = rows
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Decode("insert returned no rows".to_string()))?;
    info!(team = %saved.team_label(), chars = saved.character_count, "submission recorded");
    Ok(saved)
}
