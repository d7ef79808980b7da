//! Record types exchanged between pipeline stages.
//!
//! Snapshots serialize to self-describing JSON; unknown fields are ignored on
//! read so older binaries can load newer snapshots. Keyed collections use
//! `BTreeMap`/`BTreeSet` so persisted documents are byte-stable across runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Per-keyword interest metrics keyed by keyword.
pub type KeywordSeries = BTreeMap<String, KeywordMetrics>;

/// Direction of a keyword's interest series over its recent window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

/// One keyword's weekly interest record as delivered by the trends source.
///
/// `series_wow_pct` is the in-series week-over-week change the source itself
/// reports (current point vs. the point seven days earlier in the same
/// series). Cross-run comparison lives in [`DeltaRecord`], not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    pub current: f64,
    pub previous_week: f64,
    pub series_wow_pct: Option<f64>,
    pub direction: TrendDirection,
    pub four_week_avg: f64,
    /// Rising related queries, in the rank order the source supplied.
    #[serde(default)]
    pub rising_queries: Vec<String>,
}

/// Whether a post was seen in the prior run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostTag {
    New,
    Returning,
}

/// A raw forum post as fetched, before NEW/RETURNING tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingPost {
    /// Platform-native identifier. Stable across fetches even when the title
    /// is edited or truncated, which is why identity never derives from text.
    pub id: String,
    pub title: String,
    pub score: i64,
    pub comment_count: i64,
    /// Community the post came from (e.g. a subreddit name).
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub url: Option<String>,
    /// Leading slice of the post body, kept for help-marker scanning.
    pub snippet: Option<String>,
}

/// A forum post after tagging against the prior snapshot.
///
/// `prior_score`/`score_delta` are populated only for RETURNING posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub comment_count: i64,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub tag: PostTag,
    pub prior_score: Option<i64>,
    pub score_delta: Option<i64>,
}

/// An immutable record of one pipeline run, persisted once and read exactly
/// once as "prior" by the following run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub run_date: NaiveDate,
    pub keyword_series: KeywordSeries,
    pub forum_posts: Vec<PostRecord>,
    /// Significant terms extracted from this week's forum post titles.
    pub topic_fingerprint: BTreeSet<String>,
    /// Daily-average pageviews per tracked article title.
    pub pageview_series: BTreeMap<String, f64>,
    /// Normalized-text question set observed this week.
    pub questions: BTreeSet<String>,
    pub selected_theme: Option<String>,
}

/// Week-over-week delta for one tracked keyword.
///
/// All prior/percentage fields are `None` in baseline mode (no prior
/// snapshot, or keyword absent from it) and when the prior value is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRecord {
    pub current_value: f64,
    pub prior_value: Option<f64>,
    pub wow_pct_change: Option<f64>,
    pub vs_last_run_pct_change: Option<f64>,
}

/// A genuinely-new item relative to the immediately prior snapshot.
///
/// Every variant is produced by plain set/membership difference — never by a
/// learned or fuzzy model — so a signal's presence is exactly reproducible
/// from its two input snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmergingSignal {
    /// A related query that entered the rising set this week.
    RisingQuery { term: String },
    /// A forum post whose title carries terms absent from the prior week's
    /// topic fingerprint. One signal per flagged post.
    NewTopic { terms: BTreeSet<String> },
    /// An article whose daily-average pageviews jumped past the configured
    /// threshold while clearing the noise floor.
    PageviewBreakout {
        article: String,
        current_avg: f64,
        prior_avg: f64,
        pct_change: f64,
    },
    /// A question not observed (after normalization) in the prior week.
    NewQuestion { text: String },
}

/// Which metric family a declining signal was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Trends,
    Pageviews,
}

/// A tracked item losing interest week over week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecliningSignal {
    pub keyword: String,
    pub pct_change: f64,
    pub source: SignalSource,
}

/// Which branch of the fallback chain produced the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeSource {
    Trends,
    Pageviews,
    Forum,
    FallbackDefault,
}

/// The week's primary content theme plus continuity linkage to last week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSelection {
    pub theme: String,
    pub source: ThemeSource,
    pub prior_theme: Option<String>,
    /// True iff `theme` equals `prior_theme` after case/whitespace
    /// normalization, so downstream prose can say "continuing from last week".
    pub is_continuation: bool,
}

/// Upstream data sources the pipeline collects from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Trends,
    Forum,
    Questions,
    Pageviews,
    News,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Trends => write!(f, "trends"),
            SourceKind::Forum => write!(f, "forum"),
            SourceKind::Questions => write!(f, "questions"),
            SourceKind::Pageviews => write!(f, "pageviews"),
            SourceKind::News => write!(f, "news"),
        }
    }
}

/// How a source's collection ended this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Collected { records: usize },
    /// Collection failed or was skipped via CLI flag; the source degraded to
    /// an empty record set and the brief says so.
    Skipped { reason: String },
}

/// Per-source coverage entry surfaced in the brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: SourceKind,
    pub outcome: SourceOutcome,
}

/// Headline counts for the brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// 1-based ordinal of this brief (prior snapshot count + 1).
    pub brief_number: usize,
    /// True on the first run or whenever no usable prior snapshot exists;
    /// delta and emerging-signal computation is suppressed by design.
    pub baseline: bool,
    pub keywords: usize,
    pub posts: usize,
    pub questions: usize,
    pub articles: usize,
}

/// One news headline from the RSS source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub outlet: String,
    pub url: String,
    pub published: Option<String>,
}

/// A post or question worth replying to this week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementCandidate {
    pub title: String,
    pub url: Option<String>,
    pub source: String,
    pub score: i64,
    pub comment_count: i64,
    pub tag: PostTag,
    /// Help-seeking markers found in the title/snippet.
    pub markers: Vec<String>,
}

/// The terminal aggregate handed to the downstream prompt and email
/// collaborators. Assembled purely from already-computed stage outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub generated_on: NaiveDate,
    pub summary: SnapshotSummary,
    pub coverage: Vec<SourceReport>,
    pub deltas: BTreeMap<String, DeltaRecord>,
    pub emerging_signals: Vec<EmergingSignal>,
    pub declining_signals: Vec<DecliningSignal>,
    pub tagged_posts: Vec<PostRecord>,
    pub questions: BTreeSet<String>,
    pub news: Vec<NewsItem>,
    pub theme: ThemeSelection,
    pub engagement_candidates: Vec<EngagementCandidate>,
}
