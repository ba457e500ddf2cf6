use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::policy::{Direction, ScoringPolicy};

/// Anything the engine can put in order.
pub trait Scored {
    fn id(&self) -> &str;
    fn score(&self) -> f64;
    fn created_at(&self) -> DateTime<Utc>;
}

/// An item with its 1-based position in the final order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub rank: usize,
    pub item: T,
}

/// Compare two entries under `direction`.
///
/// Score decides first. Exactly equal scores fall back to the earlier
/// `created_at`, and identical timestamps to the smaller id, so no two
/// distinct entries ever compare equal.
pub fn compare<T: Scored>(a: &T, b: &T, direction: Direction) -> Ordering {
    let score_cmp = match direction {
        Direction::HigherIsBetter => b.score().total_cmp(&a.score()),
        Direction::LowerIsBetter => a.score().total_cmp(&b.score()),
    };
    score_cmp
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.id().cmp(b.id()))
}

/// Rank entries, best first. Scores must be finite; validation happens upstream.
pub fn rank<T: Scored>(mut entries: Vec<T>, direction: Direction) -> Vec<Ranked<T>> {
    entries.sort_by(|a, b| compare(a, b, direction));
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, item)| Ranked { rank: idx + 1, item })
        .collect()
}

pub fn rank_for_policy<T: Scored>(entries: Vec<T>, policy: ScoringPolicy) -> Vec<Ranked<T>> {
    rank(entries, policy.direction())
}
