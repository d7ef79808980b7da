//! Integration tests for the source-degradation contract.
//!
//! A skipped or failing source must contribute an empty record set and a
//! `Skipped` coverage entry — never an error.

use chrono::NaiveDate;
use trendbrief_collect::{
    collect_all, Collectors, ForumClient, NewsClient, PageviewClient, QuestionClient, SkipFlags,
    TrendsClient,
};
use trendbrief_core::{SourceKind, SourceOutcome, Watchlist};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn collectors_against(base_url: &str) -> Collectors {
    Collectors {
        trends: TrendsClient::with_base_url(5, "test-agent", 0, 0, base_url).unwrap(),
        forum: ForumClient::with_base_url(5, "test-agent", 0, 0, base_url).unwrap(),
        questions: QuestionClient::with_base_url(5, "test-agent", 0, 0, base_url).unwrap(),
        pageviews: PageviewClient::with_base_url(5, "test-agent", 0, 0, 2, base_url).unwrap(),
        news: NewsClient::with_base_url(5, "test-agent", 0, 0, base_url).unwrap(),
    }
}

fn watchlist() -> Watchlist {
    Watchlist {
        default_theme: "general mobility".to_string(),
        keywords: vec!["sciatica".to_string()],
        forum_sources: vec!["backpain".to_string()],
        pageview_articles: vec!["Sciatica".to_string()],
        question_queries: vec!["sciatica relief".to_string()],
        help_markers: Vec::new(),
    }
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()
}

fn outcome_of(collected: &trendbrief_collect::Collected, source: SourceKind) -> &SourceOutcome {
    &collected
        .coverage
        .iter()
        .find(|r| r.source == source)
        .expect("every source reports coverage")
        .outcome
}

#[tokio::test]
async fn skip_flags_degrade_sources_without_touching_the_network() {
    let server = MockServer::start().await;
    // Any request hitting the server would be a contract violation; expect(0)
    // asserts none arrive.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let collectors = collectors_against(&server.uri());
    let skip = SkipFlags {
        trends: true,
        forum: true,
        questions: true,
        pageviews: true,
        news: true,
    };
    let collected = collect_all(&collectors, &watchlist(), run_date(), skip).await;

    assert!(collected.keyword_series.is_empty());
    assert!(collected.posts.is_empty());
    assert!(collected.questions.is_empty());
    assert!(collected.pageviews.is_empty());
    assert!(collected.news.is_empty());
    assert_eq!(collected.coverage.len(), 5);
    for report in &collected.coverage {
        assert!(
            matches!(
                &report.outcome,
                SourceOutcome::Skipped { reason } if reason == "disabled via CLI flag"
            ),
            "unexpected outcome for {:?}: {:?}",
            report.source,
            report.outcome
        );
    }
}

#[tokio::test]
async fn failing_source_is_reported_skipped_while_others_collect() {
    let server = MockServer::start().await;

    // Trends endpoint hard-fails; forum endpoint serves one post; the
    // remaining sources 404 (also a failure for their clients).
    Mock::given(method("GET"))
        .and(path("/v1/interest-over-time"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/backpain/top.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "children": [ { "data": {
                "name": "t3_abc",
                "title": "sciatica flare",
                "score": 10,
                "num_comments": 2,
                "permalink": "/r/backpain/comments/abc/",
                "created_utc": 1_785_400_000.0,
                "selftext": ""
            } } ] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let collectors = collectors_against(&server.uri());
    let collected =
        collect_all(&collectors, &watchlist(), run_date(), SkipFlags::default()).await;

    assert!(matches!(
        outcome_of(&collected, SourceKind::Trends),
        SourceOutcome::Skipped { .. }
    ));
    assert!(matches!(
        outcome_of(&collected, SourceKind::Forum),
        SourceOutcome::Collected { records: 1 }
    ));
    assert_eq!(collected.posts.len(), 1);
    assert!(collected.keyword_series.is_empty());
}
