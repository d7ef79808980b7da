//! Integration tests for `TrendsClient` using wiremock HTTP mocks.

use trendbrief_collect::TrendsClient;
use trendbrief_core::TrendDirection;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> TrendsClient {
    TrendsClient::with_base_url(30, "test-agent", 0, 0, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn fetch_parses_series_and_rising_queries() {
    let server = MockServer::start().await;

    let series: Vec<f64> = (0..28).map(|i| 30.0 + f64::from(i)).collect();
    let interest_body = serde_json::json!({ "series": { "sciatica": series } });

    Mock::given(method("GET"))
        .and(path("/v1/interest-over-time"))
        .and(query_param("keywords", "sciatica"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&interest_body))
        .mount(&server)
        .await;

    let rising_body = serde_json::json!({
        "rising": [
            { "query": "sciatica stretches", "value": 250 },
            { "query": "sciatica vs piriformis", "value": 120 }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/v1/related-queries"))
        .and(query_param("keyword", "sciatica"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&rising_body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let results = client
        .fetch(&["sciatica".to_string()])
        .await
        .expect("should parse interest response");

    let metrics = &results["sciatica"];
    assert!((metrics.current - 57.0).abs() < f64::EPSILON);
    assert!((metrics.previous_week - 50.0).abs() < f64::EPSILON);
    assert_eq!(metrics.direction, TrendDirection::Rising);
    assert_eq!(
        metrics.rising_queries,
        vec![
            "sciatica stretches".to_string(),
            "sciatica vs piriformis".to_string()
        ]
    );
}

#[tokio::test]
async fn one_failed_batch_keeps_other_batches() {
    let server = MockServer::start().await;

    // Batch 1 (five keywords) fails; batch 2 succeeds.
    let keywords: Vec<String> = ["a", "b", "c", "d", "e", "f"]
        .iter()
        .map(ToString::to_string)
        .collect();

    Mock::given(method("GET"))
        .and(path("/v1/interest-over-time"))
        .and(query_param("keywords", "a,b,c,d,e"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/interest-over-time"))
        .and(query_param("keywords", "f"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "series": { "f": [10.0, 12.0] } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/related-queries"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "rising": [] })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let results = client.fetch(&keywords).await.expect("partial result wins");
    assert_eq!(results.len(), 1);
    assert!(results.contains_key("f"));
}

#[tokio::test]
async fn all_batches_failing_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/interest-over-time"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.fetch(&["sciatica".to_string()]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn rising_query_failure_leaves_metrics_without_rising_set() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/interest-over-time"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "series": { "posture": [5.0, 6.0] } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/related-queries"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let results = client.fetch(&["posture".to_string()]).await.unwrap();
    assert!(results["posture"].rising_queries.is_empty());
}

#[tokio::test]
async fn keyword_missing_from_response_is_omitted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/interest-over-time"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "series": { "posture": [5.0] } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/related-queries"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "rising": [] })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let results = client
        .fetch(&["posture".to_string(), "text neck".to_string()])
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results.contains_key("text neck"));
}
