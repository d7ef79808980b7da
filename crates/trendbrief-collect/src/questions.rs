//! Question-site discovery via web-search scraping.
//!
//! The question site has no public search API, so questions are discovered
//! the way the audience finds them: a web search scoped to the site, with
//! question text recovered from the result URL slugs. Blocked or empty
//! result pages degrade that query, never the run.

use std::collections::BTreeSet;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, Url};

use crate::error::CollectError;
use crate::retry::retry_with_backoff;
use crate::trends::encode_query;

const DEFAULT_BASE_URL: &str = "https://www.google.com/";
const QUESTION_SITE: &str = "quora.com";
const MAX_PER_QUERY: usize = 3;

/// Client that discovers question-site questions through scoped web search.
pub struct QuestionClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    url_pattern: Regex,
}

impl QuestionClient {
    /// Creates a client pointed at the production search endpoint.
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
        // Result pages wrap targets in redirect links or plain hrefs; both
        // shapes carry the question URL.
        let url_pattern = Regex::new(
            r#"href="(?:/url\?q=)?(https?://(?:www\.)?quora\.com/[^"&]+)"#,
        )
        .map_err(|_| CollectError::UnexpectedStatus {
            status: 0,
            url: "question url pattern".to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_ms,
            url_pattern,
        })
    }

    /// Run every configured query and return the deduplicated question set.
    ///
    /// # Errors
    ///
    /// Returns the last error only if every query failed; partial results
    /// win otherwise.
    pub async fn fetch(&self, queries: &[String]) -> Result<BTreeSet<String>, CollectError> {
        let mut questions = BTreeSet::new();
        let mut failures = 0usize;
        let mut last_error: Option<CollectError> = None;

        for query in queries {
            match self.fetch_query(query).await {
                Ok(found) => {
                    tracing::debug!(query = %query, count = found.len(), "collected questions");
                    questions.extend(found);
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "question search failed — skipping query");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if !queries.is_empty() && failures == queries.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        Ok(questions)
    }

    async fn fetch_query(&self, query: &str) -> Result<Vec<String>, CollectError> {
        let scoped = format!("site:{QUESTION_SITE} {query}");
        let url = self
            .base_url
            .join(&format!("search?q={}", encode_query(&scoped)))
            .map_err(|_| CollectError::UnexpectedStatus {
                status: 0,
                url: scoped.clone(),
            })?;

        let html = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_text(url.clone())
        })
        .await?;

        Ok(self.extract_questions(&html))
    }

    async fn request_text(&self, url: Url) -> Result<String, CollectError> {
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
        Ok(response.text().await?)
    }

    /// Pull question texts out of result-page HTML via the URL slugs.
    fn extract_questions(&self, html: &str) -> Vec<String> {
        let mut questions = Vec::new();
        for capture in self.url_pattern.captures_iter(html) {
            let raw_url = &capture[1];
            // Profiles, topics, and answer permalinks are not questions.
            if ["/profile/", "/topic/", "/space/", "/answer/"]
                .iter()
                .any(|skip| raw_url.contains(skip))
            {
                continue;
            }
            let trimmed = raw_url.split('?').next().unwrap_or(raw_url);
            let Some(slug) = trimmed.trim_end_matches('/').split('/').next_back() else {
                continue;
            };
            if slug.is_empty() || !slug.contains('-') {
                continue;
            }
            questions.push(slug.replace('-', " "));
            if questions.len() >= MAX_PER_QUERY {
                break;
            }
        }
        questions
    }
}
