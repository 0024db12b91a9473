#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, Uri, header},
    response::Response,
};
use cf_monitor::{AppConfig, AppState, ClientConfig, build_app};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_ACCOUNT: &str = "acc-1";

/// A request seen by the fake upstream.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
}

impl Seen {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_str(&self.query).unwrap()
    }

    pub fn param(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// In-process stand-in for `api.cloudflare.com/client/v4`.
#[derive(Clone, Default)]
pub struct FakeCloudflare {
    responses: Arc<Mutex<HashMap<String, (StatusCode, Value)>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl FakeCloudflare {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer GET `path` with `body` and status 200.
    pub fn ok(self, path: &str, body: Value) -> Self {
        self.respond(path, StatusCode::OK, body)
    }

    pub fn respond(self, path: &str, status: StatusCode, body: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body));
        self
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn seen_path(&self, path: &str) -> Option<Seen> {
        self.seen().into_iter().find(|s| s.path == path)
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn spawn(&self) -> String {
        let router = Router::new().fallback(answer).with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

async fn answer(
    State(fake): State<FakeCloudflare>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    fake.seen.lock().unwrap().push(Seen {
        path: uri.path().to_string(),
        query: uri.query().unwrap_or("").to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let responses = fake.responses.lock().unwrap();
    match responses.get(uri.path()) {
        Some((status, body)) => (*status, Json(body.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "errors": [{"code": 7003, "message": "Could not route to the requested path"}],
                "messages": [],
                "result": null
            })),
        ),
    }
}

/// Fixture directory for mock mode.
pub struct Fixtures {
    pub dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write(&self, key: &str, body: &Value) {
        std::fs::write(
            self.dir.path().join(format!("{}.json", key)),
            serde_json::to_string_pretty(body).unwrap(),
        )
        .unwrap();
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Live-mode configuration pointing at `base_url`.
pub fn live_config(base_url: &str, mock_dir: &Path) -> AppConfig {
    AppConfig {
        client: ClientConfig {
            token: Some(TEST_TOKEN.to_string()),
            account_id: Some(TEST_ACCOUNT.to_string()),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        },
        mock_dir: mock_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Run one GET through the full router and return status and JSON body.
pub async fn get(config: AppConfig, uri: &str) -> (StatusCode, Value) {
    let app = build_app(AppState::new(config).unwrap());
    let response: Response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
