//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use crate::types::BackoffType;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retries(retries: u32) -> HttpClientConfig {
    HttpClientConfig::builder()
        .max_retries(retries)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .build()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 0);
    assert!(config.rate_limit.is_none());
    assert!(config.user_agent.starts_with("parcel-ingest/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .rate_limit(Some(RateLimiterConfig::per_second(2)))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(2, 2)));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_request_config_keeps_query_order() {
    let config = RequestConfig::new()
        .query("$limit", "10")
        .query("$offset", "20")
        .header("X-App-Token", "abc123");

    assert_eq!(
        config.query,
        vec![
            ("$limit".to_string(), "10".to_string()),
            ("$offset".to_string(), "20".to_string())
        ]
    );
    assert_eq!(
        config.headers.get("X-App-Token"),
        Some(&"abc123".to_string())
    );
}

#[tokio::test]
async fn test_get_text_with_query_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resource/abc.json"))
        .and(query_param("$limit", "2"))
        .and(header("X-App-Token", "tok"))
        .and(header("X-Default", "d"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(HttpClientConfig::builder().header("X-Default", "d").build())
        .unwrap();
    let body = client
        .get_text(
            &format!("{}/resource/abc.json", mock_server.uri()),
            RequestConfig::new().query("$limit", "2").header("X-App-Token", "tok"),
        )
        .await
        .unwrap();

    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/things"))
        .and(body_json(serde_json::json!([{"id": 1}])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let response = client
        .post(
            &format!("{}/rest/v1/things", mock_server.uri()),
            RequestConfig::new().json(serde_json::json!([{"id": 1}])),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_non_success_becomes_http_status_with_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such dataset"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get(&format!("{}/missing", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such dataset");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let result = client
        .get(&format!("{}/flaky", mock_server.uri()), RequestConfig::new())
        .await;

    assert!(matches!(result, Err(Error::HttpStatus { status: 503, .. })));
}

#[tokio::test]
async fn test_retry_on_500_when_enabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_retries(3)).unwrap();
    let body = client
        .get_text(&format!("{}/flaky", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_retries_exhausted_returns_last_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_retries(2)).unwrap();
    let result = client
        .get(&format!("{}/down", mock_server.uri()), RequestConfig::new())
        .await;

    assert!(matches!(result, Err(Error::HttpStatus { status: 502, .. })));
}

#[tokio::test]
async fn test_too_many_requests_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_string("slow down"),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let result = client
        .get(&format!("{}/limited", mock_server.uri()), RequestConfig::new())
        .await;

    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down (retry after 7s)");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_get_json_rejects_invalid_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let result: crate::Result<serde_json::Value> = client
        .get_json(&format!("{}/html", mock_server.uri()), RequestConfig::new())
        .await;

    assert!(matches!(result, Err(Error::Decode { .. })));
}

#[test]
fn test_calculate_backoff_linear() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(300));
}

#[test]
fn test_calculate_backoff_exponential_respects_max() {
    let config = HttpClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(500));
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .rate_limit(Some(RateLimiterConfig::per_second(5)))
            .build(),
    )
    .unwrap();
    let debug = format!("{client:?}");
    assert!(debug.contains("HttpClient"));
    assert!(debug.contains("has_rate_limiter: true"));
}
