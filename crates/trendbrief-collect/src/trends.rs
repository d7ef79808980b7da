//! Keyword interest-over-time client.
//!
//! Fetches raw daily interest series plus rising related queries and reduces
//! them to per-keyword [`KeywordMetrics`]. Keywords are requested in batches
//! of five (the upstream's payload limit); a failed batch is logged and
//! skipped so a partial result still reaches the pipeline — forty of sixty
//! keywords beats zero.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde::Deserialize;

use trendbrief_core::{KeywordMetrics, KeywordSeries, TrendDirection};

use crate::error::CollectError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://trends-api.example.net/";
const BATCH_SIZE: usize = 5;
const MAX_RISING_PER_KEYWORD: usize = 10;

#[derive(Debug, Deserialize)]
struct InterestResponse {
    series: std::collections::BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct RelatedQueriesResponse {
    #[serde(default)]
    rising: Vec<RisingEntry>,
}

#[derive(Debug, Deserialize)]
struct RisingEntry {
    query: String,
}

/// Client for the trend-series upstream.
///
/// Use [`TrendsClient::new`] for production or
/// [`TrendsClient::with_base_url`] to point at a mock server in tests.
pub struct TrendsClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl TrendsClient {
    /// Creates a client pointed at the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CollectError> {
        Self::with_base_url(
            timeout_secs,
            user_agent,
            max_retries,
            backoff_base_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (wiremock tests).
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the client cannot be constructed or
    /// [`CollectError::UnexpectedStatus`] if `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, CollectError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetch interest metrics (and rising queries) for all keywords.
    ///
    /// # Errors
    ///
    /// Returns the last batch error only if *every* batch failed; otherwise
    /// partial results are returned and failed batches are logged. Rising
    /// queries are garnish: a per-keyword failure there is logged at `debug`
    /// and the keyword simply carries no rising set.
    pub async fn fetch(&self, keywords: &[String]) -> Result<KeywordSeries, CollectError> {
        let mut results = KeywordSeries::new();
        let mut last_error: Option<CollectError> = None;
        let batch_count = keywords.len().div_ceil(BATCH_SIZE);

        for (batch_idx, batch) in keywords.chunks(BATCH_SIZE).enumerate() {
            match self.fetch_batch(batch).await {
                Ok(response) => {
                    for keyword in batch {
                        if let Some(series) = response.series.get(keyword) {
                            if !series.is_empty() {
                                results.insert(keyword.clone(), compute_metrics(series));
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        batch = batch_idx + 1,
                        batches = batch_count,
                        error = %e,
                        "interest batch failed — continuing with remaining batches"
                    );
                    last_error = Some(e);
                }
            }
        }

        if results.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
            return Ok(results);
        }

        for (keyword, metrics) in &mut results {
            match self.fetch_rising(keyword).await {
                Ok(rising) => metrics.rising_queries = rising,
                Err(e) => {
                    tracing::debug!(keyword = %keyword, error = %e, "rising query fetch failed");
                }
            }
        }

        tracing::info!(
            keywords = results.len(),
            requested = keywords.len(),
            "collected keyword interest metrics"
        );
        Ok(results)
    }

    async fn fetch_batch(&self, batch: &[String]) -> Result<InterestResponse, CollectError> {
        let mut url = self.join("v1/interest-over-time")?;
        url.query_pairs_mut()
            .append_pair("keywords", &batch.join(","))
            .append_pair("geo", "US")
            .append_pair("timeframe", "today 3-m");

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_json(url.clone())
        })
        .await?;
        serde_json::from_value(body).map_err(|e| CollectError::Deserialize {
            context: format!("interest-over-time({})", batch.join(",")),
            source: e,
        })
    }

    async fn fetch_rising(&self, keyword: &str) -> Result<Vec<String>, CollectError> {
        let mut url = self.join("v1/related-queries")?;
        url.query_pairs_mut().append_pair("keyword", keyword);

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_json(url.clone())
        })
        .await?;
        let response: RelatedQueriesResponse =
            serde_json::from_value(body).map_err(|e| CollectError::Deserialize {
                context: format!("related-queries({keyword})"),
                source: e,
            })?;

        Ok(response
            .rising
            .into_iter()
            .take(MAX_RISING_PER_KEYWORD)
            .map(|entry| entry.query)
            .collect())
    }

    async fn request_json(&self, url: Url) -> Result<serde_json::Value, CollectError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(CollectError::RateLimited {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }

    fn join(&self, path: &str) -> Result<Url, CollectError> {
        self.base_url
            .join(path)
            .map_err(|_| CollectError::UnexpectedStatus {
                status: 0,
                url: format!("{}{path}", self.base_url),
            })
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, CollectError> {
    // Ensure exactly one trailing slash so join() appends rather than
    // replacing the last path segment.
    let normalized = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalized).map_err(|_| CollectError::UnexpectedStatus {
        status: 0,
        url: base_url.to_string(),
    })
}

/// Reduce a raw daily series (newest point last) to weekly metrics.
fn compute_metrics(series: &[f64]) -> KeywordMetrics {
    let current = *series.last().unwrap_or(&0.0);
    let previous_week = if series.len() >= 8 {
        series[series.len() - 8]
    } else {
        series[0]
    };
    let series_wow_pct = if previous_week == 0.0 {
        None
    } else {
        Some((current - previous_week) / previous_week * 100.0)
    };

    let window = if series.len() >= 28 {
        &series[series.len() - 28..]
    } else {
        series
    };
    #[allow(clippy::cast_precision_loss)]
    let four_week_avg = window.iter().sum::<f64>() / window.len() as f64;

    KeywordMetrics {
        current,
        previous_week,
        series_wow_pct,
        direction: trend_direction(window),
        four_week_avg,
        rising_queries: Vec::new(),
    }
}

/// Direction over a window: compare the first half's mean to the second's.
fn trend_direction(values: &[f64]) -> TrendDirection {
    if values.len() < 2 {
        return TrendDirection::Stable;
    }
    let midpoint = values.len() / 2;
    #[allow(clippy::cast_precision_loss)]
    let first = values[..midpoint].iter().sum::<f64>() / midpoint.max(1) as f64;
    #[allow(clippy::cast_precision_loss)]
    let second = values[midpoint..].iter().sum::<f64>() / (values.len() - midpoint).max(1) as f64;

    if first == 0.0 {
        return if second > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Stable
        };
    }
    let change = (second - first) / first * 100.0;
    if change > 5.0 {
        TrendDirection::Rising
    } else if change < -5.0 {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    }
}

/// Percent-encode a query string for URL building in sibling collectors.
pub(crate) fn encode_query(query: &str) -> String {
    utf8_percent_encode(query, NON_ALPHANUMERIC).to_string()
}
