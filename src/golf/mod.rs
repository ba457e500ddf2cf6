pub mod fizzbuzz;
pub mod session;

pub use fizzbuzz::{character_count, verify_output, OutputMismatch};
pub use session::{clear_session, get_session_path, load_session, save_session, GolfSession};

use chrono::{DateTime, Utc};

use crate::backend::types::NewSubmission;

/// Build the row for a verified solution.
///
/// Output that does not match is rejected here, so only valid rows are ever sent.
pub fn prepare_submission(
    session: &GolfSession,
    code: &str,
    output: &str,
    now: DateTime<Utc>,
) -> Result<NewSubmission, OutputMismatch> {
    verify_output(output)?;

    Ok(NewSubmission {
        category: session.category,
        team_number: session.team_number,
        language: session.language.clone(),
        code: code.trim_end_matches(['\n', '\r']).to_string(),
        character_count: character_count(code),
        solve_time_seconds: Some(session.solve_time_seconds(now)),
        is_valid: true,
    })
}
