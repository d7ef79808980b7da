//! Weekly theme selection.
//!
//! A deterministic decision procedure over available signal strength — not a
//! model. The fallback chain is the pipeline's graceful-degradation
//! contract: a failed upstream source arrives here as empty input and only
//! shifts which branch fires; selection itself never fails.

use std::collections::BTreeMap;

use trendbrief_core::{
    DeltaRecord, EmergingSignal, PostRecord, PostTag, ThemeSelection, ThemeSource,
};

/// Tuning and inputs for theme selection.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    /// A keyword whose change vs. the last run exceeds this is an
    /// established trend and wins outright.
    pub established_trend_threshold: f64,
    /// Engagement gates for the forum branch: a NEW post qualifies when its
    /// score or comment count clears the respective minimum.
    pub min_post_score: i64,
    pub min_post_comments: i64,
    /// Theme used when every signal source came up empty.
    pub default_theme: String,
    /// The tracked keyword list, used to pull a real keyword out of a forum
    /// post title instead of theming on raw title text.
    pub tracked_keywords: Vec<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            established_trend_threshold: 20.0,
            min_post_score: 30,
            min_post_comments: 10,
            default_theme: "general trends".to_string(),
            tracked_keywords: Vec::new(),
        }
    }
}

/// Pick this week's primary theme.
///
/// Priority order:
/// 1. The keyword with the largest `vs_last_run_pct_change` above the
///    established-trend threshold (ties broken lexically).
/// 2. The subject of the top pageview breakout (underscores become spaces).
/// 3. The highest-scored NEW forum post clearing the engagement gates; the
///    theme is a tracked keyword found in its title (longest match), or the
///    post's source community when none matches.
/// 4. The configured default theme.
///
/// `is_continuation` is set iff the chosen theme equals the prior theme
/// after trim + lowercase normalization.
#[must_use]
pub fn select_theme(
    deltas: &BTreeMap<String, DeltaRecord>,
    signals: &[EmergingSignal],
    tagged_posts: &[PostRecord],
    prior_theme: Option<&str>,
    config: &ThemeConfig,
) -> ThemeSelection {
    let (theme, source) = established_trend(deltas, config)
        .map(|theme| (theme, ThemeSource::Trends))
        .or_else(|| top_breakout(signals).map(|theme| (theme, ThemeSource::Pageviews)))
        .or_else(|| forum_theme(tagged_posts, config).map(|theme| (theme, ThemeSource::Forum)))
        .unwrap_or_else(|| (config.default_theme.clone(), ThemeSource::FallbackDefault));

    let is_continuation = prior_theme.is_some_and(|prior| normalized_eq(&theme, prior));
    ThemeSelection {
        theme,
        source,
        prior_theme: prior_theme.map(ToString::to_string),
        is_continuation,
    }
}

fn normalized_eq(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Branch 1: strongest keyword mover above the threshold.
fn established_trend(
    deltas: &BTreeMap<String, DeltaRecord>,
    config: &ThemeConfig,
) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for (keyword, record) in deltas {
        let Some(change) = record.vs_last_run_pct_change else {
            continue;
        };
        if change <= config.established_trend_threshold {
            continue;
        }
        // Strictly-greater keeps the lexically-first keyword on ties, since
        // BTreeMap iterates in key order.
        if best.map_or(true, |(_, best_change)| change > best_change) {
            best = Some((keyword, change));
        }
    }
    best.map(|(keyword, _)| keyword.to_string())
}

/// Branch 2: subject of the top pageview breakout. The detector already
/// ordered breakouts by descending change.
fn top_breakout(signals: &[EmergingSignal]) -> Option<String> {
    signals.iter().find_map(|signal| match signal {
        EmergingSignal::PageviewBreakout { article, .. } => Some(article.replace('_', " ")),
        _ => None,
    })
}

/// Branch 3: best engaging NEW forum post.
fn forum_theme(tagged_posts: &[PostRecord], config: &ThemeConfig) -> Option<String> {
    let post = tagged_posts
        .iter()
        .filter(|post| {
            post.tag == PostTag::New
                && (post.score >= config.min_post_score
                    || post.comment_count >= config.min_post_comments)
        })
        .max_by_key(|post| post.score)?;

    let title = post.title.to_lowercase();
    let keyword_match = config
        .tracked_keywords
        .iter()
        .filter(|keyword| title.contains(&keyword.to_lowercase()))
        .max_by_key(|keyword| keyword.len());

    Some(match keyword_match {
        // Longest match wins for specificity ("lower back pain" over "back pain").
        Some(keyword) => keyword.clone(),
        None => post.source.clone(),
    })
}
