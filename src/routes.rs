//! HTTP routes: one dispatch table, one dispatcher.
//!
//! Every API route is either answered from a local fixture (mock mode) or
//! relayed to the matching [`CloudflareClient`] method. Errors are turned
//! into `{"error": "..."}` with status 400 or 500.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::Utc;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::client::CloudflareClient;
use crate::config::AppConfig;
use crate::error::CloudflareError;
use crate::mock::{MockError, MockStore};
use crate::pages;
use crate::params::{QueryParams, iso, start_of_month};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<CloudflareClient>,
    pub config: Arc<AppConfig>,
    pub mocks: MockStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, CloudflareError> {
        let client = CloudflareClient::new(config.client.clone())?;
        Ok(Self {
            client: Arc::new(client),
            mocks: MockStore::new(config.mock_dir.clone()),
            config: Arc::new(config),
        })
    }
}

/// Errors surfaced at the route boundary.
#[derive(Debug)]
pub enum AppError {
    MissingParameter(&'static str),
    Mock(MockError),
    Upstream(CloudflareError),
    Internal(String),
}

impl From<CloudflareError> for AppError {
    fn from(e: CloudflareError) -> Self {
        Self::Upstream(e)
    }
}

impl From<MockError> for AppError {
    fn from(e: MockError) -> Self {
        Self::Mock(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                format!("Missing {} parameter", name),
            ),
            AppError::Mock(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Upstream(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type LiveFuture = BoxFuture<'static, Result<Value, AppError>>;
pub type LiveHandler = fn(AppState, QueryParams) -> LiveFuture;

/// Where a route's mock response comes from.
#[derive(Debug, Clone, Copy)]
pub enum Fixture {
    /// `<mock_dir>/<name>.json`
    Named(&'static str),
    /// `<mock_dir>/<prefix>_<metric>.json`, `metric` from the query string.
    PerMetric(&'static str),
}

impl Fixture {
    const DEFAULT_METRIC: &'static str = "requests";

    pub fn key(&self, params: &QueryParams) -> String {
        match self {
            Fixture::Named(name) => name.to_string(),
            Fixture::PerMetric(prefix) => format!(
                "{}_{}",
                prefix,
                params.get("metric").unwrap_or(Self::DEFAULT_METRIC)
            ),
        }
    }
}

/// One API endpoint.
pub struct RouteSpec {
    pub path: &'static str,
    /// Also mounted as `<path>/:zoneId`.
    pub zone_scoped: bool,
    /// `None` means the route answers the same in both modes.
    pub fixture: Option<Fixture>,
    /// Query parameters checked before any live call.
    pub required: &'static [&'static str],
    /// Serve the fixture, flagged, when the live call fails.
    pub fixture_fallback: bool,
    pub live: LiveHandler,
}

pub static ROUTES: &[RouteSpec] = &[
    RouteSpec {
        path: "/config",
        zone_scoped: false,
        fixture: None,
        required: &[],
        fixture_fallback: false,
        live: site_config,
    },
    RouteSpec {
        path: "/zones",
        zone_scoped: false,
        fixture: Some(Fixture::Named("zones")),
        required: &[],
        fixture_fallback: false,
        live: zones,
    },
    RouteSpec {
        path: "/traffic",
        zone_scoped: false,
        fixture: Some(Fixture::PerMetric("traffic")),
        required: &["zoneId"],
        fixture_fallback: false,
        live: traffic,
    },
    RouteSpec {
        path: "/pages/build-count",
        zone_scoped: false,
        fixture: Some(Fixture::Named("pages_build_count")),
        required: &[],
        fixture_fallback: false,
        live: build_count,
    },
    RouteSpec {
        path: "/pages/cloud-function-requests",
        zone_scoped: false,
        fixture: Some(Fixture::Named("pages_cloud_function_requests")),
        required: &[],
        fixture_fallback: true,
        live: cloud_function_requests,
    },
    RouteSpec {
        path: "/pages/cloud-function-monthly-stats",
        zone_scoped: false,
        fixture: Some(Fixture::Named("pages_cloud_function_monthly_stats")),
        required: &[],
        fixture_fallback: true,
        live: cloud_function_monthly_stats,
    },
    RouteSpec {
        path: "/zone-analytics",
        zone_scoped: true,
        fixture: Some(Fixture::Named("zone_analytics")),
        required: &["zoneId"],
        fixture_fallback: false,
        live: zone_analytics,
    },
    RouteSpec {
        path: "/zone-dashboard",
        zone_scoped: true,
        fixture: Some(Fixture::Named("zone_dashboard")),
        required: &["zoneId"],
        fixture_fallback: false,
        live: zone_dashboard,
    },
    RouteSpec {
        path: "/firewall-events",
        zone_scoped: true,
        fixture: Some(Fixture::Named("firewall_events")),
        required: &["zoneId"],
        fixture_fallback: false,
        live: firewall_events,
    },
    RouteSpec {
        path: "/ddos-events",
        zone_scoped: true,
        fixture: Some(Fixture::Named("ddos_events")),
        required: &["zoneId"],
        fixture_fallback: false,
        live: ddos_events,
    },
];

/// Answer `route` from a fixture or the live API.
pub async fn dispatch(
    state: AppState,
    route: &'static RouteSpec,
    params: QueryParams,
) -> Result<Json<Value>, AppError> {
    if state.config.mock_mode() {
        if let Some(fixture) = route.fixture {
            let key = fixture.key(&params);
            tracing::debug!("Serving {} from local mock {}", route.path, key);
            return Ok(Json(state.mocks.load(&key).await?));
        }
    }

    for name in route.required {
        if params.get(name).is_none() {
            return Err(AppError::MissingParameter(*name));
        }
    }

    match (route.live)(state.clone(), params.clone()).await {
        Ok(body) => Ok(Json(body)),
        Err(AppError::Upstream(e)) if route.fixture_fallback => {
            let Some(fixture) = route.fixture else {
                return Err(AppError::Upstream(e));
            };
            fallback(&state, route, fixture.key(&params), e).await
        }
        Err(e) => {
            tracing::error!("{} failed: {:?}", route.path, e);
            Err(e)
        }
    }
}

/// Serve the route's fixture marked as a fallback. If the fixture is
/// missing too, the upstream error stands.
async fn fallback(
    state: &AppState,
    route: &RouteSpec,
    key: String,
    error: CloudflareError,
) -> Result<Json<Value>, AppError> {
    let mut body = match state.mocks.load(&key).await {
        Ok(body) => body,
        Err(mock_err) => {
            tracing::error!("{} failed: {} (no fallback: {})", route.path, error, mock_err);
            return Err(AppError::Upstream(error));
        }
    };

    tracing::warn!(
        "{} failed, serving local mock {} instead: {}",
        route.path,
        key,
        error
    );
    if let Some(map) = body.as_object_mut() {
        map.insert("fallback".to_string(), Value::Bool(true));
        map.insert("fallbackReason".to_string(), Value::String(error.to_string()));
    }
    Ok(Json(body))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

fn take_zone_id(params: &mut QueryParams) -> Result<String, AppError> {
    params
        .remove("zoneId")
        .filter(|id| !id.is_empty())
        .ok_or(AppError::MissingParameter("zoneId"))
}

fn site_config(state: AppState, _params: QueryParams) -> LiveFuture {
    Box::pin(async move { to_json(&state.config.site) })
}

fn zones(state: AppState, params: QueryParams) -> LiveFuture {
    Box::pin(async move { Ok(state.client.zones(params).await?) })
}

/// Time series for the traffic chart. Accepts `startTime`/`endTime` as
/// well as `since`/`until`.
fn traffic(state: AppState, mut params: QueryParams) -> LiveFuture {
    Box::pin(async move {
        let zone_id = take_zone_id(&mut params)?;

        let mut query = QueryParams::new();
        query.set(
            "metrics",
            params.get("metrics").unwrap_or("bandwidth,requests"),
        );
        if let Some(since) = params.get("startTime").or_else(|| params.get("since")) {
            query.set("since", since);
        }
        if let Some(until) = params.get("endTime").or_else(|| params.get("until")) {
            query.set("until", until);
        }

        Ok(state.client.zone_analytics_series(&zone_id, query).await?)
    })
}

fn build_count(state: AppState, _params: QueryParams) -> LiveFuture {
    Box::pin(async move {
        let account_id = state.client.resolve_account_id().await?;
        let count = pages::build_count(&state.client, &account_id, Utc::now()).await?;
        tracing::info!(
            "Pages build count: {} today, {} this month across {} projects",
            count.today_builds,
            count.month_builds,
            count.project_count
        );
        Ok(json!({ "success": true, "result": to_json(&count)? }))
    })
}

fn cloud_function_requests(state: AppState, mut params: QueryParams) -> LiveFuture {
    Box::pin(async move {
        // zoneId is accepted for the frontend's sake but Workers stats are
        // account-wide.
        params.remove("zoneId");
        Ok(state.client.workers_analytics(None, params).await?)
    })
}

fn cloud_function_monthly_stats(state: AppState, mut params: QueryParams) -> LiveFuture {
    Box::pin(async move {
        params.remove("zoneId");
        let now = Utc::now();
        params.set_default("since", iso(start_of_month(now)));
        params.set_default("until", iso(now));
        Ok(state.client.workers_analytics(None, params).await?)
    })
}

fn zone_analytics(state: AppState, mut params: QueryParams) -> LiveFuture {
    Box::pin(async move {
        let zone_id = take_zone_id(&mut params)?;
        Ok(state.client.zone_analytics_summary(&zone_id, params).await?)
    })
}

fn zone_dashboard(state: AppState, mut params: QueryParams) -> LiveFuture {
    Box::pin(async move {
        let zone_id = take_zone_id(&mut params)?;
        Ok(state.client.zone_analytics_dashboard(&zone_id, params).await?)
    })
}

fn firewall_events(state: AppState, mut params: QueryParams) -> LiveFuture {
    Box::pin(async move {
        let zone_id = take_zone_id(&mut params)?;
        Ok(state.client.firewall_events(&zone_id, params).await?)
    })
}

fn ddos_events(state: AppState, mut params: QueryParams) -> LiveFuture {
    Box::pin(async move {
        let zone_id = take_zone_id(&mut params)?;
        Ok(state.client.ddos_events(&zone_id, params).await?)
    })
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": if state.config.mock_mode() { "mock" } else { "live" },
    }))
}

/// Routes under `/api`, built from [`ROUTES`].
pub fn api_router() -> Router<AppState> {
    let mut router = Router::new();

    for route in ROUTES {
        router = router.route(
            route.path,
            get(
                move |State(state): State<AppState>,
                      Query(query): Query<Vec<(String, String)>>| async move {
                    dispatch(state, route, QueryParams::from(query)).await
                },
            ),
        );

        if route.zone_scoped {
            router = router.route(
                &format!("{}/:zoneId", route.path),
                get(
                    move |State(state): State<AppState>,
                          Path(zone_id): Path<String>,
                          Query(query): Query<Vec<(String, String)>>| async move {
                        let mut params = QueryParams::from(query);
                        params.set("zoneId", zone_id);
                        dispatch(state, route, params).await
                    },
                ),
            );
        }
    }

    router
}

/// Build the Axum application with routes and middleware
pub fn build_app(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router())
        .fallback_service(static_files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
