pub mod cache;
pub mod client;
pub mod entries;
pub mod error;
pub mod leaderboards;
pub mod realtime;
pub mod submissions;
pub mod types;

pub use client::{create_client, BackendClient};
pub use entries::{list_entries, submit_entry, SubmitOutcome};
pub use error::BackendError;
pub use leaderboards::{
    count_entries, create_leaderboard, delete_leaderboard, get_leaderboard, list_leaderboards,
    update_leaderboard,
};
pub use realtime::{subscribe, ChangeFeed, Subscription};
pub use submissions::{insert_submission, list_valid_submissions};
pub use types::{Entry, Leaderboard, LeaderboardDraft, NewEntry, NewSubmission, Submission};
