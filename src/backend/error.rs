use thiserror::Error;

/// SQLSTATE for unique_violation, surfaced by the REST layer in `code`
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request rejected by the data service (HTTP {status}). Check your anon key.")]
    Unauthorized { status: u16 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Team '{team}' already has an entry and this leaderboard does not allow updates")]
    DuplicateSubject { team: String },

    #[error("Data service error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response from data service: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Error body shape returned by the REST layer
#[derive(Debug, serde::Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl BackendError {
    /// Map a non-success response to an error. `team` is set for entry
    /// inserts so a uniqueness conflict can name the subject.
    pub fn from_response(status: u16, body: &str, team: Option<&str>) -> Self {
        let parsed: Option<RestErrorBody> = serde_json::from_str(body).ok();
        let code = parsed.as_ref().and_then(|b| b.code.as_deref());

        if status == 401 || status == 403 {
            return BackendError::Unauthorized { status };
        }

        // A 409 with some other code (e.g. a foreign-key violation) is not a duplicate
        let duplicate = match code {
            Some(code) => code == UNIQUE_VIOLATION,
            None => status == 409,
        };
        if duplicate {
            if let Some(team) = team {
                return BackendError::DuplicateSubject {
                    team: team.to_string(),
                };
            }
        }

        let message = parsed
            .and_then(|b| match (b.message, b.details) {
                (Some(m), Some(d)) => Some(format!("{} ({})", m, d)),
                (Some(m), None) => Some(m),
                (None, d) => d,
            })
            .unwrap_or_else(|| body.trim().to_string());

        BackendError::Status { status, message }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_becomes_duplicate_subject() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"entries_board_team_key\"","details":null,"hint":null}"#;
        let err = BackendError::from_response(409, body, Some("Blue"));
        assert!(matches!(err, BackendError::DuplicateSubject { ref team } if team == "Blue"));
    }

    #[test]
    fn test_foreign_key_conflict_is_not_duplicate() {
        let body = r#"{"code":"23503","message":"insert or update on table \"entries\" violates foreign key constraint","details":"Key (leaderboard_id)=(9) is not present in table \"leaderboards\"."}"#;
        let err = BackendError::from_response(409, body, Some("Blue"));
        assert!(matches!(err, BackendError::Status { status: 409, .. }), "got {:?}", err);
    }

    #[test]
    fn test_bare_conflict_with_team_is_duplicate() {
        let err = BackendError::from_response(409, "", Some("Blue"));
        assert!(matches!(err, BackendError::DuplicateSubject { ref team } if team == "Blue"));
    }

    #[test]
    fn test_conflict_without_team_is_plain_status() {
        let err = BackendError::from_response(409, r#"{"message":"conflict"}"#, None);
        assert!(matches!(err, BackendError::Status { status: 409, .. }));
    }

    #[test]
    fn test_auth_statuses() {
        assert!(matches!(
            BackendError::from_response(401, "", None),
            BackendError::Unauthorized { status: 401 }
        ));
    }

    #[test]
    fn test_message_and_details_are_joined() {
        let body = r#"{"code":"22P02","message":"invalid input syntax","details":"for type bigint"}"#;
        let err = BackendError::from_response(400, body, None);
        assert_eq!(
            err.to_string(),
            "Data service error (HTTP 400): invalid input syntax (for type bigint)"
        );
    }

    #[test]
    fn test_non_json_body_kept_verbatim() {
        let err = BackendError::from_response(502, " Bad Gateway \n", None);
        assert_eq!(err.to_string(), "Data service error (HTTP 502): Bad Gateway");
    }
}
