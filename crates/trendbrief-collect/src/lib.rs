//! Upstream data collection for the weekly pipeline.
//!
//! Five thin HTTP wrappers (trends, forum, questions, pageviews, news) plus
//! [`collect_all`], which enforces the single degradation contract: a source
//! that fails — or is skipped by flag — contributes an empty record set and
//! a `Skipped` coverage entry. No collector error ever reaches the
//! differencing engine.

pub mod error;
pub mod forum;
pub mod news;
pub mod pageviews;
pub mod questions;
pub mod trends;

mod retry;

pub use error::CollectError;
pub use forum::ForumClient;
pub use news::NewsClient;
pub use pageviews::PageviewClient;
pub use questions::QuestionClient;
pub use trends::TrendsClient;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use trendbrief_core::{
    AppConfig, IncomingPost, KeywordSeries, NewsItem, SourceKind, SourceOutcome, SourceReport,
    Watchlist,
};

/// Top posts pulled per forum community.
const POSTS_PER_SOURCE: usize = 10;

/// The five collectors, constructed once per run from config.
pub struct Collectors {
    pub trends: TrendsClient,
    pub forum: ForumClient,
    pub questions: QuestionClient,
    pub pageviews: PageviewClient,
    pub news: NewsClient,
}

impl Collectors {
    /// Build all clients from the shared HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if a `reqwest::Client` cannot be
    /// constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, CollectError> {
        Ok(Self {
            trends: TrendsClient::new(
                config.request_timeout_secs,
                &config.user_agent,
                config.max_retries,
                config.backoff_base_ms,
            )?,
            forum: ForumClient::new(
                config.request_timeout_secs,
                &config.user_agent,
                config.max_retries,
                config.backoff_base_ms,
            )?,
            questions: QuestionClient::new(
                config.request_timeout_secs,
                &config.user_agent,
                config.max_retries,
                config.backoff_base_ms,
            )?,
            pageviews: PageviewClient::new(
                config.request_timeout_secs,
                &config.user_agent,
                config.max_retries,
                config.backoff_base_ms,
                config.max_concurrent_fetches,
            )?,
            news: NewsClient::new(
                config.request_timeout_secs,
                &config.user_agent,
                config.max_retries,
                config.backoff_base_ms,
            )?,
        })
    }
}

/// Which sources to skip this run. A skipped source exercises exactly the
/// same degradation path as a live failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipFlags {
    pub trends: bool,
    pub forum: bool,
    pub questions: bool,
    pub pageviews: bool,
    pub news: bool,
}

/// Everything collected for the current week, with per-source coverage.
#[derive(Debug)]
pub struct Collected {
    pub keyword_series: KeywordSeries,
    pub posts: Vec<IncomingPost>,
    pub questions: BTreeSet<String>,
    pub pageviews: BTreeMap<String, f64>,
    pub news: Vec<NewsItem>,
    pub coverage: Vec<SourceReport>,
}

const SKIPPED_BY_FLAG: &str = "disabled via CLI flag";

fn report(source: SourceKind, records: usize) -> SourceReport {
    SourceReport {
        source,
        outcome: SourceOutcome::Collected { records },
    }
}

fn skipped(source: SourceKind, reason: String) -> SourceReport {
    tracing::warn!(source = %source, reason = %reason, "source degraded to empty input");
    SourceReport {
        source,
        outcome: SourceOutcome::Skipped { reason },
    }
}

/// Collect from every source concurrently, degrading failures to empty.
pub async fn collect_all(
    collectors: &Collectors,
    watchlist: &Watchlist,
    run_date: NaiveDate,
    skip: SkipFlags,
) -> Collected {
    let trends_fut = async {
        if skip.trends {
            return (
                KeywordSeries::new(),
                skipped(SourceKind::Trends, SKIPPED_BY_FLAG.to_string()),
            );
        }
        match collectors.trends.fetch(&watchlist.keywords).await {
            Ok(series) => {
                let entry = report(SourceKind::Trends, series.len());
                (series, entry)
            }
            Err(e) => (
                KeywordSeries::new(),
                skipped(SourceKind::Trends, e.to_string()),
            ),
        }
    };

    let forum_fut = async {
        if skip.forum {
            return (
                Vec::new(),
                skipped(SourceKind::Forum, SKIPPED_BY_FLAG.to_string()),
            );
        }
        match collectors
            .forum
            .fetch_top(&watchlist.forum_sources, POSTS_PER_SOURCE)
            .await
        {
            Ok(posts) => {
                let entry = report(SourceKind::Forum, posts.len());
                (posts, entry)
            }
            Err(e) => (Vec::new(), skipped(SourceKind::Forum, e.to_string())),
        }
    };

    let questions_fut = async {
        if skip.questions {
            return (
                BTreeSet::new(),
                skipped(SourceKind::Questions, SKIPPED_BY_FLAG.to_string()),
            );
        }
        match collectors.questions.fetch(&watchlist.question_queries).await {
            Ok(questions) => {
                let entry = report(SourceKind::Questions, questions.len());
                (questions, entry)
            }
            Err(e) => (
                BTreeSet::new(),
                skipped(SourceKind::Questions, e.to_string()),
            ),
        }
    };

    let pageviews_fut = async {
        if skip.pageviews {
            return (
                BTreeMap::new(),
                skipped(SourceKind::Pageviews, SKIPPED_BY_FLAG.to_string()),
            );
        }
        match collectors
            .pageviews
            .fetch(&watchlist.pageview_articles, run_date)
            .await
        {
            Ok(pageviews) => {
                let entry = report(SourceKind::Pageviews, pageviews.len());
                (pageviews, entry)
            }
            Err(e) => (
                BTreeMap::new(),
                skipped(SourceKind::Pageviews, e.to_string()),
            ),
        }
    };

    let news_fut = async {
        if skip.news {
            return (
                Vec::new(),
                skipped(SourceKind::News, SKIPPED_BY_FLAG.to_string()),
            );
        }
        match collectors.news.fetch(&watchlist.keywords).await {
            Ok(news) => {
                let entry = report(SourceKind::News, news.len());
                (news, entry)
            }
            Err(e) => (Vec::new(), skipped(SourceKind::News, e.to_string())),
        }
    };

    let (
        (keyword_series, trends_report),
        (posts, forum_report),
        (questions, questions_report),
        (pageviews, pageviews_report),
        (news, news_report),
    ) = tokio::join!(trends_fut, forum_fut, questions_fut, pageviews_fut, news_fut);

    Collected {
        keyword_series,
        posts,
        questions,
        pageviews,
        news,
        coverage: vec![
            trends_report,
            forum_report,
            questions_report,
            pageviews_report,
            news_report,
        ],
    }
}
