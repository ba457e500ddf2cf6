use std::cmp::Ordering;

use super::engine::Ranked;
use crate::backend::types::Submission;

/// Shorter code wins, then the faster solve, then the earlier submission.
/// Submissions without a solve time sort after timed ones of the same length.
pub fn compare_submissions(a: &Submission, b: &Submission) -> Ordering {
    a.character_count
        .cmp(&b.character_count)
        .then_with(|| match (a.solve_time_seconds, b.solve_time_seconds) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Rank valid submissions; invalid ones never reach the standings.
pub fn rank_submissions(submissions: Vec<Submission>) -> Vec<Ranked<Submission>> {
    let mut valid: Vec<Submission> = submissions.into_iter().filter(|s| s.is_valid).collect();
    valid.sort_by(compare_submissions);
    valid
        .into_iter()
        .enumerate()
        .map(|(idx, item)| Ranked { rank: idx + 1, item })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn submission(id: &str, chars: u32, solve: Option<f64>, minutes_ago: i64) -> Submission {
        Submission {
            id: id.to_string(),
            category: 1,
            team_number: 1,
            language: "javascript".to_string(),
            code: String::new(),
            character_count: chars,
            solve_time_seconds: solve,
            is_valid: true,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn ids(ranked: &[Ranked<Submission>]) -> Vec<&str> {
        ranked.iter().map(|r| r.item.id.as_str()).collect()
    }

    #[test]
    fn test_shortest_code_wins() {
        let ranked = rank_submissions(vec![
            submission("long", 120, Some(30.0), 5),
            submission("short", 64, Some(300.0), 1),
        ]);
        assert_eq!(ids(&ranked), vec!["short", "long"]);
    }

    #[test]
    fn test_equal_length_faster_wins() {
        let ranked = rank_submissions(vec![
            submission("slow", 64, Some(300.0), 5),
            submission("fast", 64, Some(95.0), 1),
        ]);
        assert_eq!(ids(&ranked), vec!["fast", "slow"]);
    }

    #[test]
    fn test_missing_solve_time_sorts_last() {
        let ranked = rank_submissions(vec![
            submission("untimed", 64, None, 10),
            submission("timed", 64, Some(500.0), 1),
        ]);
        assert_eq!(ids(&ranked), vec!["timed", "untimed"]);
    }

    #[test]
    fn test_full_tie_earliest_wins() {
        let ranked = rank_submissions(vec![
            submission("second", 64, Some(60.0), 1),
            submission("first", 64, Some(60.0), 10),
        ]);
        assert_eq!(ids(&ranked), vec!["first", "second"]);
    }

    #[test]
    fn test_invalid_submissions_are_dropped() {
        let mut bogus = submission("bogus", 10, Some(1.0), 1);
        bogus.is_valid = false;
        let ranked = rank_submissions(vec![bogus, submission("ok", 80, Some(60.0), 2)]);
        assert_eq!(ids(&ranked), vec!["ok"]);
        assert_eq!(ranked[0].rank, 1);
    }
}
