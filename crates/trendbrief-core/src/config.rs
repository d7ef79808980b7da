use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to pick up a `.env` file before reading.
///
/// # Errors
///
/// Returns `ConfigError` if a set variable has an unparseable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from env vars already in the process.
///
/// Unlike [`load_app_config`], this does NOT read `.env` files — useful for
/// tests or when the caller manages environment setup.
///
/// # Errors
///
/// Returns `ConfigError` if a set variable has an unparseable value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
///
/// The parsing/validation core is decoupled from the real environment so it
/// can be tested with a plain `HashMap` lookup — no `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    macro_rules! parse_or_default {
        ($ty:ty, $var:expr, $default:expr) => {{
            let raw = or_default($var, $default);
            raw.parse::<$ty>().map_err(|e| ConfigError::InvalidEnvVar {
                var: $var.to_string(),
                reason: e.to_string(),
            })
        }};
    }

    let data_dir = PathBuf::from(or_default("TRENDBRIEF_DATA_DIR", "./data"));
    let watchlist_path = PathBuf::from(or_default(
        "TRENDBRIEF_WATCHLIST_PATH",
        "./config/watchlist.yaml",
    ));
    let log_level = or_default("TRENDBRIEF_LOG_LEVEL", "info");

    let user_agent = or_default(
        "TRENDBRIEF_USER_AGENT",
        "trendbrief/0.1 (weekly-trend-brief)",
    );
    let request_timeout_secs = parse_or_default!(u64, "TRENDBRIEF_REQUEST_TIMEOUT_SECS", "15")?;
    let max_retries = parse_or_default!(u32, "TRENDBRIEF_MAX_RETRIES", "2")?;
    let backoff_base_ms = parse_or_default!(u64, "TRENDBRIEF_BACKOFF_BASE_MS", "1000")?;
    let max_concurrent_fetches = parse_or_default!(usize, "TRENDBRIEF_MAX_CONCURRENT_FETCHES", "4")?;

    let breakout_threshold = parse_or_default!(f64, "TRENDBRIEF_BREAKOUT_THRESHOLD", "15.0")?;
    let pageview_noise_floor = parse_or_default!(f64, "TRENDBRIEF_PAGEVIEW_NOISE_FLOOR", "100.0")?;
    let established_trend_threshold =
        parse_or_default!(f64, "TRENDBRIEF_TREND_THRESHOLD", "20.0")?;
    let decline_threshold = parse_or_default!(f64, "TRENDBRIEF_DECLINE_THRESHOLD", "-10.0")?;
    let min_term_len = parse_or_default!(usize, "TRENDBRIEF_MIN_TERM_LEN", "3")?;

    let min_post_score = parse_or_default!(i64, "TRENDBRIEF_MIN_POST_SCORE", "30")?;
    let min_post_comments = parse_or_default!(i64, "TRENDBRIEF_MIN_POST_COMMENTS", "10")?;
    let engagement_recency_days = parse_or_default!(i64, "TRENDBRIEF_ENGAGEMENT_RECENCY_DAYS", "7")?;
    let max_engagement_candidates =
        parse_or_default!(usize, "TRENDBRIEF_MAX_ENGAGEMENT_CANDIDATES", "5")?;

    Ok(AppConfig {
        data_dir,
        watchlist_path,
        log_level,
        user_agent,
        request_timeout_secs,
        max_retries,
        backoff_base_ms,
        max_concurrent_fetches,
        breakout_threshold,
        pageview_noise_floor,
        established_trend_threshold,
        decline_threshold,
        min_term_len,
        min_post_score,
        min_post_comments,
        engagement_recency_days,
        max_engagement_candidates,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("./data"));
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.request_timeout_secs, 15);
        assert_eq!(cfg.max_retries, 2);
        assert!((cfg.breakout_threshold - 15.0).abs() < f64::EPSILON);
        assert!((cfg.decline_threshold - -10.0).abs() < f64::EPSILON);
        assert_eq!(cfg.min_term_len, 3);
        assert_eq!(cfg.max_engagement_candidates, 5);
    }

    #[test]
    fn env_vars_override_defaults() {
        let mut map = HashMap::new();
        map.insert("TRENDBRIEF_DATA_DIR", "/var/lib/trendbrief");
        map.insert("TRENDBRIEF_BREAKOUT_THRESHOLD", "25.5");
        map.insert("TRENDBRIEF_MIN_POST_SCORE", "100");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/trendbrief"));
        assert!((cfg.breakout_threshold - 25.5).abs() < f64::EPSILON);
        assert_eq!(cfg.min_post_score, 100);
    }

    #[test]
    fn invalid_numeric_value_is_rejected() {
        let mut map = HashMap::new();
        map.insert("TRENDBRIEF_REQUEST_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidEnvVar { ref var, .. })
                    if var == "TRENDBRIEF_REQUEST_TIMEOUT_SECS"
            ),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn negative_threshold_parses() {
        let mut map = HashMap::new();
        map.insert("TRENDBRIEF_DECLINE_THRESHOLD", "-25");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!((cfg.decline_threshold - -25.0).abs() < f64::EPSILON);
    }
}
