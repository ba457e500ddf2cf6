use super::policy::ScoringPolicy;
use crate::backend::types::LeaderboardDraft;

/// A score submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    pub team_name: String,
    pub score: f64,
}

/// Raw leaderboard form input, as typed by the user
#[derive(Debug, Clone, Default)]
pub struct LeaderboardForm {
    pub name: String,
    pub description: String,
    pub scoring_type: ScoringPolicy,
    pub score_label: String,
    pub allow_updates: bool,
    pub is_active: bool,
}

/// Validate a score submission before anything goes over the wire.
/// Returns all validation errors at once (not just the first).
pub fn validate_entry(team_name: &str, score: &str) -> Result<ValidEntry, Vec<String>> {
    let mut errors = Vec::new();

    let team_name = team_name.trim();
    if team_name.is_empty() {
        errors.push("team name: required".to_string());
    }

    let parsed = match score.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(_) => {
            errors.push(format!("score: '{}' is not a finite number", score.trim()));
            None
        }
        Err(_) if score.trim().is_empty() => {
            errors.push("score: required".to_string());
            None
        }
        Err(_) => {
            errors.push(format!("score: '{}' is not a number", score.trim()));
            None
        }
    };

    match parsed {
        Some(score) if errors.is_empty() => Ok(ValidEntry {
            team_name: team_name.to_string(),
            score,
        }),
        _ => Err(errors),
    }
}

/// Validate and normalize a leaderboard form.
///
/// Blank descriptions become `None`; a blank score label falls back to the
/// policy's default ("Points" or "Time").
pub fn validate_leaderboard(form: &LeaderboardForm) -> Result<LeaderboardDraft, Vec<String>> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(vec!["name: required".to_string()]);
    }

    let description = Some(form.description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let score_label = match form.score_label.trim() {
        "" => form.scoring_type.default_label().to_string(),
        label => label.to_string(),
    };

    Ok(LeaderboardDraft {
        name: name.to_string(),
        description,
        scoring_type: form.scoring_type,
        score_label,
        allow_updates: form.allow_updates,
        is_active: form.is_active,
    })
}

/// Validate the team details for a code-golf challenge start.
pub fn validate_golf_start(category: u8, team_number: &str) -> Result<(u8, u32), Vec<String>> {
    let mut errors = Vec::new();

    if !(1..=2).contains(&category) {
        errors.push(format!("category: must be 1 or 2, got {}", category));
    }

    let team = match team_number.trim() {
        "" => {
            errors.push("team number: required".to_string());
            None
        }
        raw => match raw.parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                errors.push(format!("team number: '{}' is not a positive integer", raw));
                None
            }
        },
    };

    match team {
        Some(team) if errors.is_empty() => Ok((category, team)),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_entry_is_trimmed() {
        let entry = validate_entry("  Team Rocket ", " 1234.5 ").unwrap();
        assert_eq!(entry.team_name, "Team Rocket");
        assert_eq!(entry.score, 1234.5);
    }

    #[test]
    fn test_blank_team_and_score_report_both() {
        let errors = validate_entry("   ", "").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("team name"));
        assert!(errors[1].contains("score: required"));
    }

    #[test]
    fn test_non_finite_scores_rejected() {
        assert!(validate_entry("A", "NaN").is_err());
        assert!(validate_entry("A", "inf").is_err());
        assert!(validate_entry("A", "ten").is_err());
    }

    #[test]
    fn test_negative_score_allowed() {
        assert_eq!(validate_entry("A", "-4").unwrap().score, -4.0);
    }

    #[test]
    fn test_leaderboard_defaults_applied() {
        let form = LeaderboardForm {
            name: " Speedrun ".to_string(),
            description: "   ".to_string(),
            scoring_type: ScoringPolicy::TimeFast,
            score_label: "".to_string(),
            allow_updates: true,
            is_active: true,
        };
        let draft = validate_leaderboard(&form).unwrap();
        assert_eq!(draft.name, "Speedrun");
        assert_eq!(draft.description, None);
        assert_eq!(draft.score_label, "Time");
        assert!(draft.allow_updates);
    }

    #[test]
    fn test_leaderboard_requires_name() {
        let form = LeaderboardForm {
            name: "  ".to_string(),
            ..Default::default()
        };
        assert!(validate_leaderboard(&form).is_err());
    }

    #[test]
    fn test_golf_start() {
        assert_eq!(validate_golf_start(2, " 14 ").unwrap(), (2, 14));
        assert_eq!(validate_golf_start(3, "").unwrap_err().len(), 2);
        assert!(validate_golf_start(1, "0").is_err());
        assert!(validate_golf_start(1, "seven").is_err());
    }
}
