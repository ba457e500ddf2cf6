use anyhow::{Context, Result};

/// Public page of a leaderboard on the web front end: `{site}/{id}/leaderboard`
pub fn board_url(site_url: &str, leaderboard_id: i64) -> String {
    format!("{}/{}/leaderboard", site_url.trim_end_matches('/'), leaderboard_id)
}

/// Open a URL in the user's default browser
///
/// # Errors
/// Returns error if browser cannot be opened (e.g., no browser available)
pub fn open_url(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| format!("Failed to open browser for URL: {}", url))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_url() {
        assert_eq!(board_url("https://scores.example.com", 4), "https://scores.example.com/4/leaderboard");
        assert_eq!(board_url("https://scores.example.com/", 4), "https://scores.example.com/4/leaderboard");
    }
}
