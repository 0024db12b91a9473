mod common;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use cf_monitor::{ClientConfig, CloudflareClient, CloudflareError, QueryParams};
use common::{FakeCloudflare, TEST_TOKEN};
use serde_json::json;

fn client_for(base_url: &str, account_id: Option<&str>) -> CloudflareClient {
    CloudflareClient::new(ClientConfig {
        token: Some(TEST_TOKEN.to_string()),
        account_id: account_id.map(str::to_string),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_account_id_from_user_info() {
    let fake = FakeCloudflare::new().ok(
        "/user",
        json!({"success": true, "result": {"id": "user-7", "email": "ops@example.com"}}),
    );
    let base_url = fake.spawn().await;

    let client = client_for(&base_url, None);
    assert_eq!(client.resolve_account_id().await.unwrap(), "user-7");
    assert_eq!(fake.seen().len(), 1);
}

#[tokio::test]
async fn test_configured_account_id_skips_user_info() {
    let fake = FakeCloudflare::new().ok(
        "/user",
        json!({"success": true, "result": {"id": "user-7"}}),
    );
    let base_url = fake.spawn().await;

    let client = client_for(&base_url, Some("acc-9"));
    assert_eq!(client.resolve_account_id().await.unwrap(), "acc-9");
    assert!(fake.seen().is_empty());
}

#[tokio::test]
async fn test_series_defaults() {
    let fake = FakeCloudflare::new().ok(
        "/zones/z1/analytics/series",
        json!({"success": true, "result": []}),
    );
    let base_url = fake.spawn().await;

    let client = client_for(&base_url, None);
    client
        .zone_analytics_series("z1", QueryParams::new())
        .await
        .unwrap();

    let seen = fake.seen_path("/zones/z1/analytics/series").unwrap();
    assert_eq!(seen.param("continuous").as_deref(), Some("true"));
    assert_eq!(
        seen.param("metrics").as_deref(),
        Some("requests,bandwidth,uniques")
    );

    let now = Utc::now();
    let since: DateTime<Utc> = seen.param("since").unwrap().parse().unwrap();
    let until: DateTime<Utc> = seen.param("until").unwrap().parse().unwrap();
    assert_eq!(until - since, chrono::Duration::hours(24));
    assert!((now - until).num_seconds().abs() <= 5);
}

#[tokio::test]
async fn test_workers_resolves_account_before_request() {
    let fake = FakeCloudflare::new()
        .ok("/user", json!({"success": true, "result": {"id": "user-7"}}))
        .ok(
            "/accounts/user-7/workers/analytics",
            json!({"success": true, "result": {"requests": 3}}),
        );
    let base_url = fake.spawn().await;

    let body = client_for(&base_url, None)
        .workers_analytics(None, QueryParams::new())
        .await
        .unwrap();
    assert_eq!(body["result"]["requests"], 3);
}

#[tokio::test]
async fn test_pages_without_account_fails() {
    let fake = FakeCloudflare::new().ok("/user", json!({"success": true, "result": {}}));
    let base_url = fake.spawn().await;

    let err = client_for(&base_url, None)
        .pages_projects(None, QueryParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CloudflareError::MissingAccountId));
}

#[tokio::test]
async fn test_body_is_returned_unchanged() {
    let body = json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": {"id": "z1", "name": "example.com"},
        "extra": {"nested": [1, 2]}
    });
    let fake = FakeCloudflare::new().ok("/zones/z1", body.clone());
    let base_url = fake.spawn().await;

    let got = client_for(&base_url, None).zone("z1").await.unwrap();
    assert_eq!(got, body);
}

#[tokio::test]
async fn test_silent_upstream_hits_deadline() {
    // Accept connections and never answer.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = CloudflareClient::new(ClientConfig {
        token: Some(TEST_TOKEN.to_string()),
        account_id: None,
        base_url: format!("http://{}", addr),
        timeout: Duration::from_secs(1),
    })
    .unwrap();

    let started = Instant::now();
    let err = client.zones(QueryParams::new()).await.unwrap_err();
    assert!(matches!(err, CloudflareError::Http(_)), "{:?}", err);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_api_error_survives_irregular_envelope() {
    let fake = FakeCloudflare::new()
        .ok(
            "/zones",
            json!({
                "success": false,
                "errors": [{"code": 9109, "message": "Invalid access token"}],
                "messages": ["see docs"]
            }),
        )
        .ok(
            "/zones/z1",
            json!({"success": false, "errors": [{"code": "E1", "message": "Bad zone"}]}),
        );
    let base_url = fake.spawn().await;
    let client = client_for(&base_url, None);

    let err = client.zones(QueryParams::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Cloudflare API Error: Invalid access token");

    let err = client.zone("z1").await.unwrap_err();
    assert_eq!(err.to_string(), "Cloudflare API Error: Bad zone");
}
