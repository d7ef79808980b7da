use std::path::PathBuf;

/// Runtime configuration assembled from environment variables.
///
/// Every field has a default, so a bare environment runs the pipeline with
/// sensible behavior; env vars (prefix `TRENDBRIEF_`) override individual
/// knobs. Detection thresholds live here rather than in code because the
/// source material treats them as tuning values, not law.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding snapshots, rendered briefs, and run artifacts.
    pub data_dir: PathBuf,
    /// Path to the YAML watchlist (keywords, forum sources, articles, ...).
    pub watchlist_path: PathBuf,
    pub log_level: String,

    // HTTP behavior shared by all collectors.
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_concurrent_fetches: usize,

    // Detection thresholds.
    pub breakout_threshold: f64,
    pub pageview_noise_floor: f64,
    pub established_trend_threshold: f64,
    pub decline_threshold: f64,
    pub min_term_len: usize,

    // Theme and engagement policy.
    pub min_post_score: i64,
    pub min_post_comments: i64,
    pub engagement_recency_days: i64,
    pub max_engagement_candidates: usize,
}
