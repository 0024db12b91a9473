use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only view of Cloudflare's standard response wrapper.
///
/// Fields are read straight from the JSON so an unexpected shape in one of
/// them (a string `code`, plain-string `messages`) cannot hide the rest.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a>(&'a Value);

impl<'a> Envelope<'a> {
    pub fn new(body: &'a Value) -> Self {
        Self(body)
    }

    /// `success: false` marks an application failure. A missing field does not.
    pub fn is_failure(&self) -> bool {
        self.0.get("success") == Some(&Value::Bool(false))
    }

    /// Joined `errors[].message`, or `Unknown error` when none were reported.
    pub fn error_message(&self) -> String {
        let messages: Vec<&str> = self
            .0
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();
        if messages.is_empty() {
            "Unknown error".to_string()
        } else {
            messages.join(", ")
        }
    }
}

/// A Pages project as listed by `/accounts/:id/pages/projects`.
#[derive(Debug, Clone, Deserialize)]
pub struct PagesProject {
    pub name: String,
}

/// A single Pages deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub created_on: Option<String>,
}

impl Deployment {
    /// Parsed `created_on`, if present and well-formed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_on.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Aggregated Pages build counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCount {
    pub today_builds: u64,
    pub month_builds: u64,
    pub total_builds: u64,
    pub project_count: u64,
    pub skipped_projects: Vec<String>,
}

/// Site metadata served by `/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub site_name: String,
    pub site_icon: String,
}
