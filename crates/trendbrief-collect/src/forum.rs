//! Forum post collector (public JSON listing endpoints, no auth).
//!
//! Reads each community's weekly top listing via the public `.json`
//! endpoints, which serve read-only data without API keys. A failing
//! community is logged and skipped; the method errors only when every
//! community failed, so one bad source never hides the rest.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;

use trendbrief_core::IncomingPost;

use crate::error::CollectError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://www.reddit.com/";
const SNIPPET_LEN: usize = 300;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    /// Fullname ("t3_abc123") — the stable platform identity.
    name: Option<String>,
    id: Option<String>,
    title: Option<String>,
    score: Option<i64>,
    num_comments: Option<i64>,
    permalink: Option<String>,
    created_utc: Option<f64>,
    selftext: Option<String>,
}

/// Client for public forum listing endpoints.
pub struct ForumClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ForumClient {
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
        })
    }

    /// Fetch this week's top posts from every listed community.
    ///
    /// # Errors
    ///
    /// Returns the last error only if every community failed; partial
    /// coverage is returned as-is with failures logged.
    pub async fn fetch_top(
        &self,
        sources: &[String],
        limit: usize,
    ) -> Result<Vec<IncomingPost>, CollectError> {
        let mut posts = Vec::new();
        let mut failures = 0usize;
        let mut last_error: Option<CollectError> = None;

        for source in sources {
            match self.fetch_source(source, limit).await {
                Ok(mut source_posts) => {
                    tracing::debug!(
                        source = %source,
                        count = source_posts.len(),
                        "collected forum posts"
                    );
                    posts.append(&mut source_posts);
                }
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "forum source failed — skipping");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if failures == sources.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        Ok(posts)
    }

    async fn fetch_source(
        &self,
        source: &str,
        limit: usize,
    ) -> Result<Vec<IncomingPost>, CollectError> {
        let mut url =
            self.base_url
                .join(&format!("r/{source}/top.json"))
                .map_err(|_| CollectError::UnexpectedStatus {
                    status: 0,
                    url: source.to_string(),
                })?;
        url.query_pairs_mut()
            .append_pair("t", "week")
            .append_pair("limit", &limit.to_string())
            .append_pair("raw_json", "1");

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_json(url.clone())
        })
        .await?;
        let listing: Listing =
            serde_json::from_value(body).map_err(|e| CollectError::Deserialize {
                context: format!("top listing for {source}"),
                source: e,
            })?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(|child| to_incoming_post(child.data, source))
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
}

/// Convert one raw listing entry into an [`IncomingPost`].
///
/// Entries without a usable identity or title are dropped at `debug` —
/// promoted/deleted placeholders show up in listings with fields missing.
fn to_incoming_post(raw: RawPost, source: &str) -> Option<IncomingPost> {
    let id = raw.name.or(raw.id)?;
    let title = raw.title?;
    if title.is_empty() {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    let created_at: DateTime<Utc> = raw
        .created_utc
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .unwrap_or_default();

    let snippet = raw.selftext.as_deref().and_then(|body| {
        if body.is_empty() {
            None
        } else {
            Some(body.chars().take(SNIPPET_LEN).collect::<String>())
        }
    });

    Some(IncomingPost {
        id,
        title,
        score: raw.score.unwrap_or(0),
        comment_count: raw.num_comments.unwrap_or(0),
        source: source.to_string(),
        url: raw
            .permalink
            .map(|p| format!("https://www.reddit.com{p}")),
        snippet,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_post_without_identity_is_dropped() {
        let raw = RawPost {
            name: None,
            id: None,
            title: Some("orphan".to_string()),
            score: Some(1),
            num_comments: Some(0),
            permalink: None,
            created_utc: None,
            selftext: None,
        };
        assert!(to_incoming_post(raw, "backpain").is_none());
    }

    #[test]
    fn fullname_preferred_over_short_id() {
        let raw = RawPost {
            name: Some("t3_abc".to_string()),
            id: Some("abc".to_string()),
            title: Some("sciatica flare".to_string()),
            score: Some(12),
            num_comments: Some(4),
            permalink: Some("/r/backpain/comments/abc/".to_string()),
            created_utc: Some(1_785_400_000.0),
            selftext: Some(String::new()),
        };
        let post = to_incoming_post(raw, "backpain").unwrap();
        assert_eq!(post.id, "t3_abc");
        assert_eq!(post.url.as_deref(), Some("https://www.reddit.com/r/backpain/comments/abc/"));
        assert!(post.snippet.is_none());
    }

    #[test]
    fn long_selftext_is_truncated_to_snippet() {
        let raw = RawPost {
            name: Some("t3_abc".to_string()),
            id: None,
            title: Some("long story".to_string()),
            score: None,
            num_comments: None,
            permalink: None,
            created_utc: None,
            selftext: Some("x".repeat(1000)),
        };
        let post = to_incoming_post(raw, "backpain").unwrap();
        assert_eq!(post.snippet.unwrap().len(), SNIPPET_LEN);
        assert_eq!(post.score, 0);
    }
}
