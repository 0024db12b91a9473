use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, header};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{CloudflareError, Result};
use crate::params::{QueryParams, windows};
use crate::types::Envelope;

const DEFAULT_SERIES_METRICS: &str = "requests,bandwidth,uniques";

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Client for the Cloudflare v4 REST API.
///
/// The token is resolved before construction and reused for every call.
/// A missing token is not an error until a live call is made.
pub struct CloudflareClient {
    http_client: Client,
    config: ClientConfig,
}

impl CloudflareClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("cf-monitor/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Issue a GET against `path` and return the parsed body unchanged.
    ///
    /// Fails on a non-2xx status and on `success: false` in the body.
    pub async fn request(&self, path: &str, params: &QueryParams) -> Result<Value> {
        let mut url = format!("{}{}", self.config.base_url, path);
        let query = params.to_query_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        self.execute(&url).await
    }

    async fn execute(&self, url: &str) -> Result<Value> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(CloudflareError::MissingToken)?;

        tracing::debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CloudflareError::Transport {
                status,
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body: Value = response.json().await?;

        let envelope = Envelope::new(&body);
        if envelope.is_failure() {
            tracing::debug!("GET {} reported success: false", url);
            return Err(CloudflareError::Api(envelope.error_message()));
        }

        Ok(body)
    }

    /// `/user` for the token's owner.
    pub async fn user_info(&self) -> Result<Value> {
        self.request("/user", &QueryParams::new()).await
    }

    /// Account id from configuration, or the id reported by `/user`.
    pub async fn resolve_account_id(&self) -> Result<String> {
        if let Some(account_id) = &self.config.account_id {
            return Ok(account_id.clone());
        }

        match self.user_info().await {
            Ok(info) => info
                .pointer("/result/id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .ok_or(CloudflareError::MissingAccountId),
            Err(e) => {
                tracing::warn!("Error getting account ID: {}", e);
                Err(CloudflareError::MissingAccountId)
            }
        }
    }

    async fn account_id_or_resolve(&self, account_id: Option<&str>) -> Result<String> {
        match account_id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => self.resolve_account_id().await,
        }
    }

    pub async fn zones(&self, params: QueryParams) -> Result<Value> {
        self.request("/zones", &params).await
    }

    pub async fn zone(&self, zone_id: &str) -> Result<Value> {
        let path = format!("/zones/{}", segment(zone_id));
        self.request(&path, &QueryParams::new()).await
    }

    /// Analytics totals; defaults to the last 24 hours.
    pub async fn zone_analytics_summary(&self, zone_id: &str, params: QueryParams) -> Result<Value> {
        let path = format!("/zones/{}/analytics/summary", segment(zone_id));
        let params = params.with_window(Utc::now(), windows::zone_analytics());
        self.request(&path, &params).await
    }

    /// Analytics time series; defaults to the last 24 hours, continuous,
    /// with requests, bandwidth and uniques.
    pub async fn zone_analytics_series(&self, zone_id: &str, params: QueryParams) -> Result<Value> {
        let path = format!("/zones/{}/analytics/series", segment(zone_id));
        let mut params = params.with_window(Utc::now(), windows::zone_analytics());
        params.set_default("continuous", "true");
        params.set_default("metrics", DEFAULT_SERIES_METRICS);
        self.request(&path, &params).await
    }

    /// Top-N breakdowns (countries, paths...); defaults to the last 24 hours.
    pub async fn zone_analytics_dashboard(
        &self,
        zone_id: &str,
        params: QueryParams,
    ) -> Result<Value> {
        let path = format!("/zones/{}/analytics/dashboard", segment(zone_id));
        let params = params.with_window(Utc::now(), windows::zone_analytics());
        self.request(&path, &params).await
    }

    /// Workers invocation stats; defaults to the last 24 hours.
    pub async fn workers_analytics(
        &self,
        account_id: Option<&str>,
        params: QueryParams,
    ) -> Result<Value> {
        let account_id = self.account_id_or_resolve(account_id).await?;
        let path = format!("/accounts/{}/workers/analytics", segment(&account_id));
        let params = params.with_window(Utc::now(), windows::workers());
        self.request(&path, &params).await
    }

    pub async fn pages_projects(
        &self,
        account_id: Option<&str>,
        params: QueryParams,
    ) -> Result<Value> {
        let account_id = self.account_id_or_resolve(account_id).await?;
        let path = format!("/accounts/{}/pages/projects", segment(&account_id));
        self.request(&path, &params).await
    }

    pub async fn pages_project_deployments(
        &self,
        account_id: Option<&str>,
        project_name: &str,
        params: QueryParams,
    ) -> Result<Value> {
        let account_id = self.account_id_or_resolve(account_id).await?;
        let path = format!(
            "/accounts/{}/pages/projects/{}/deployments",
            segment(&account_id),
            segment(project_name)
        );
        self.request(&path, &params).await
    }

    /// Firewall events; defaults to the last hour.
    pub async fn firewall_events(&self, zone_id: &str, params: QueryParams) -> Result<Value> {
        let path = format!("/zones/{}/firewall/events", segment(zone_id));
        let params = params.with_window(Utc::now(), windows::firewall_events());
        self.request(&path, &params).await
    }

    /// DDoS attack events; defaults to the last 7 days.
    pub async fn ddos_events(&self, zone_id: &str, params: QueryParams) -> Result<Value> {
        let path = format!("/zones/{}/ddos_events", segment(zone_id));
        let params = params.with_window(Utc::now(), windows::ddos_events());
        self.request(&path, &params).await
    }
}

/// Percent-encode a path segment so ids cannot alter the request path.
fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}
