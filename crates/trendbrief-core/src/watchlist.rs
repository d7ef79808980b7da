use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// The tracked universe for a pipeline run: which keywords, communities,
/// articles, and question searches the collectors cover, plus the theme the
/// selector falls back to when every signal source comes up empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Watchlist {
    pub default_theme: String,
    pub keywords: Vec<String>,
    pub forum_sources: Vec<String>,
    pub pageview_articles: Vec<String>,
    pub question_queries: Vec<String>,
    /// Optional override for the help-seeking marker list used in
    /// engagement ranking. Empty means use the built-in defaults.
    #[serde(default)]
    pub help_markers: Vec<String>,
}

/// Load and validate the watchlist from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (empty keyword list, duplicate entries, blank default theme).
pub fn load_watchlist(path: &Path) -> Result<Watchlist, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::WatchlistIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let watchlist: Watchlist = serde_yaml::from_str(&content)?;
    validate_watchlist(&watchlist)?;
    Ok(watchlist)
}

fn validate_watchlist(watchlist: &Watchlist) -> Result<(), ConfigError> {
    if watchlist.default_theme.trim().is_empty() {
        return Err(ConfigError::WatchlistInvalid(
            "default_theme must not be blank".to_string(),
        ));
    }
    if watchlist.keywords.is_empty() {
        return Err(ConfigError::WatchlistInvalid(
            "keywords must not be empty".to_string(),
        ));
    }

    check_no_duplicates("keywords", &watchlist.keywords)?;
    check_no_duplicates("forum_sources", &watchlist.forum_sources)?;
    check_no_duplicates("pageview_articles", &watchlist.pageview_articles)?;
    check_no_duplicates("question_queries", &watchlist.question_queries)?;
    Ok(())
}

/// Reject duplicate entries (case-insensitive) within one list.
fn check_no_duplicates(field: &str, entries: &[String]) -> Result<(), ConfigError> {
    let mut seen: HashSet<String> = HashSet::new();
    for entry in entries {
        let normalized = entry.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ConfigError::WatchlistInvalid(format!(
                "{field} contains a blank entry"
            )));
        }
        if !seen.insert(normalized) {
            return Err(ConfigError::WatchlistInvalid(format!(
                "{field} contains duplicate entry '{entry}'"
            )));
        }
    }
    Ok(())
}
