use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::cache::{load_snapshot, store_snapshot, CacheConfig};
use crate::backend::error::Result;
use crate::backend::types::{Entry, Leaderboard, Submission};
use crate::backend::{self, BackendClient, ChangeFeed};
use crate::ranking::{rank_for_policy, rank_submissions, Ranked};

/// Which standings a caller is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Board(i64),
    Golf,
}

impl View {
    pub fn cache_key(self) -> String {
        match self {
            View::Board(id) => format!("board:{}", id),
            View::Golf => "golf".to_string(),
        }
    }

    pub fn change_feed(self) -> ChangeFeed {
        match self {
            View::Board(leaderboard_id) => ChangeFeed::Entries { leaderboard_id },
            View::Golf => ChangeFeed::Submissions,
        }
    }
}

/// Rows exactly as the data service returned them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Rows {
    Board {
        leaderboard: Leaderboard,
        entries: Vec<Entry>,
    },
    Golf {
        submissions: Vec<Submission>,
    },
}

/// Ranked, display-ready standings
#[derive(Debug, Clone)]
pub enum Standings {
    Board {
        leaderboard: Leaderboard,
        entries: Vec<Ranked<Entry>>,
    },
    Golf {
        submissions: Vec<Ranked<Submission>>,
    },
}

impl Standings {
    pub fn len(&self) -> usize {
        match self {
            Standings::Board { entries, .. } => entries.len(),
            Standings::Golf { submissions } => submissions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn title(&self) -> String {
        match self {
            Standings::Board { leaderboard, .. } => leaderboard.name.clone(),
            Standings::Golf { .. } => "Code Golf Leaderboard".to_string(),
        }
    }
}

/// Fetch the rows behind a view
pub async fn fetch_rows(client: &BackendClient, view: View) -> Result<Rows> {
    match view {
        View::Board(id) => {
            let (leaderboard, entries) = futures::try_join!(
                backend::get_leaderboard(client, id),
                backend::list_entries(client, id)
            )?;
            Ok(Rows::Board { leaderboard, entries })
        }
        View::Golf => Ok(Rows::Golf {
            submissions: backend::list_valid_submissions(client).await?,
        }),
    }
}

/// Run the ranking pass over freshly fetched rows. Pure; no state kept.
pub fn rank_rows(rows: Rows) -> Standings {
    match rows {
        Rows::Board { leaderboard, entries } => {
            let entries = rank_for_policy(entries, leaderboard.scoring_type);
            Standings::Board { leaderboard, entries }
        }
        Rows::Golf { submissions } => Standings::Golf {
            submissions: rank_submissions(submissions),
        },
    }
}

/// Fetch, remember as last-known, then rank.
///
/// This function is called from main.rs for one-shot output and from the
/// TUI event loop on every refresh trigger.
pub async fn fetch_and_rank(client: &BackendClient, view: View, cache: &CacheConfig) -> Result<Standings> {
    let rows = fetch_rows(client, view).await?;

    if let Err(e) = store_snapshot(cache, &view.cache_key(), &rows) {
        warn!("Could not cache snapshot: {:#}", e);
    }

    let standings = rank_rows(rows);
    debug!(view = ?view, ranked = standings.len(), "standings refreshed");
    Ok(standings)
}

/// Last successfully fetched standings for a view, re-ranked, with their fetch time
pub fn load_last_known(view: View, cache: &CacheConfig) -> Option<(DateTime<Utc>, Standings)> {
    let snapshot = load_snapshot::<Rows>(cache, &view.cache_key())?;
    let matches_view = match (&snapshot.data, view) {
        (Rows::Board { leaderboard, .. }, View::Board(id)) => leaderboard.id == id,
        (Rows::Golf { .. }, View::Golf) => true,
        _ => false,
    };
    matches_view.then(|| (snapshot.saved_at, rank_rows(snapshot.data)))
}
