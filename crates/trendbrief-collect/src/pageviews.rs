//! Per-article daily pageview collector.
//!
//! Reads the last seven days of pageviews per tracked article from the
//! wiki metrics REST API and reduces each to a daily average. Articles are
//! fetched concurrently with a bounded fan-out; a missing article (404) is
//! skipped quietly since watchlists routinely outlive article renames.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::CollectError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://wikimedia.org/api/rest_v1/";
const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct PageviewResponse {
    #[serde(default)]
    items: Vec<PageviewItem>,
}

#[derive(Debug, Deserialize)]
struct PageviewItem {
    views: f64,
}

/// Client for the pageview metrics REST API.
pub struct PageviewClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    max_concurrent: usize,
}

impl PageviewClient {
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
        max_concurrent: usize,
    ) -> Result<Self, CollectError> {
        Self::with_base_url(
            timeout_secs,
            user_agent,
            max_retries,
            backoff_base_ms,
            max_concurrent,
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
        max_concurrent: usize,
        base_url: &str,
    ) -> Result<Self, CollectError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|_| CollectError::UnexpectedStatus {
            status: 0,
            url: base_url.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_ms,
            max_concurrent: max_concurrent.max(1),
        })
    }

    /// Fetch the trailing-week daily-average pageviews per article.
    ///
    /// The window ends the day before `run_date` (the upstream lags a day).
    ///
    /// # Errors
    ///
    /// Returns the last error only if every article failed with a real
    /// error; 404s and empty payloads just drop the article.
    pub async fn fetch(
        &self,
        articles: &[String],
        run_date: NaiveDate,
    ) -> Result<BTreeMap<String, f64>, CollectError> {
        let end = run_date - chrono::Duration::days(1);
        let start = end - chrono::Duration::days(WINDOW_DAYS - 1);

        let fetches = stream::iter(articles)
            .map(|article| async move {
                (article, self.fetch_article(article, start, end).await)
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        let mut results = BTreeMap::new();
        let mut failures = 0usize;
        let mut last_error: Option<CollectError> = None;

        for (article, outcome) in fetches {
            match outcome {
                Ok(Some(avg)) => {
                    results.insert(article.clone(), avg);
                }
                Ok(None) => {
                    tracing::debug!(article = %article, "no pageview data — skipping article");
                }
                Err(e) => {
                    tracing::warn!(article = %article, error = %e, "pageview fetch failed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if !articles.is_empty() && failures == articles.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        tracing::info!(
            articles = results.len(),
            requested = articles.len(),
            "collected pageview averages"
        );
        Ok(results)
    }

    /// Returns `Ok(None)` for 404 (unknown article) or an empty series.
    async fn fetch_article(
        &self,
        article: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<f64>, CollectError> {
        // Upstream date format is YYYYMMDD00 (trailing hour digits required).
        let slug = article.replace(' ', "_");
        let path = format!(
            "metrics/pageviews/per-article/en.wikipedia/all-access/all-agents/{slug}/daily/{}00/{}00",
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
        );
        let url = self
            .base_url
            .join(&path)
            .map_err(|_| CollectError::UnexpectedStatus {
                status: 0,
                url: path.clone(),
            })?;

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_json_opt(url.clone())
        })
        .await?;
        let Some(body) = body else {
            return Ok(None);
        };
        let response: PageviewResponse =
            serde_json::from_value(body).map_err(|e| CollectError::Deserialize {
                context: format!("pageviews for {slug}"),
                source: e,
            })?;

        if response.items.is_empty() {
            return Ok(None);
        }
        #[allow(clippy::cast_precision_loss)]
        let avg =
            response.items.iter().map(|i| i.views).sum::<f64>() / response.items.len() as f64;
        Ok(Some(avg))
    }

    /// `Ok(None)` signals a 404 — an unknown or renamed article.
    async fn request_json_opt(&self, url: Url) -> Result<Option<serde_json::Value>, CollectError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
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
        Ok(Some(response.json().await?))
    }
}
