pub mod engine;
pub mod golf;
pub mod policy;
pub mod validation;

pub use engine::{compare, rank, rank_for_policy, Ranked, Scored};
pub use golf::rank_submissions;
pub use policy::{Direction, Metric, ScoringPolicy};
pub use validation::{validate_entry, validate_golf_start, validate_leaderboard, LeaderboardForm, ValidEntry};
