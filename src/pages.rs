//! Pages build counts aggregated across every project in an account.

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::CloudflareClient;
use crate::error::Result;
use crate::params::{QueryParams, start_of_day, start_of_month};
use crate::types::{BuildCount, Deployment, PagesProject};

/// Deployment listings fetched at once.
const DEPLOYMENT_CONCURRENCY: usize = 4;

/// Count deployments created today, this month, and in total.
///
/// Failing to list projects is an error. A project whose deployments
/// cannot be fetched is logged and left out of the counts.
pub async fn build_count(
    client: &CloudflareClient,
    account_id: &str,
    now: DateTime<Utc>,
) -> Result<BuildCount> {
    let body = client
        .pages_projects(Some(account_id), QueryParams::new())
        .await?;
    let projects: Vec<PagesProject> = result_items(&body);

    let day = start_of_day(now);
    let month = start_of_month(now);

    let mut count = BuildCount {
        project_count: projects.len() as u64,
        ..Default::default()
    };

    let results: Vec<(String, Result<Value>)> =
        stream::iter(projects.into_iter().map(|project| project.name))
            .map(|name| async move {
                let deployments = client
                    .pages_project_deployments(Some(account_id), &name, QueryParams::new())
                    .await;
                (name, deployments)
            })
            .buffer_unordered(DEPLOYMENT_CONCURRENCY)
            .collect()
            .await;

    for (name, deployments) in results {
        let body = match deployments {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Skipping Pages project {}: {}", name, e);
                count.skipped_projects.push(name);
                continue;
            }
        };

        for deployment in result_items::<Deployment>(&body) {
            count.total_builds += 1;
            if let Some(created) = deployment.created_at() {
                if created >= month {
                    count.month_builds += 1;
                }
                if created >= day {
                    count.today_builds += 1;
                }
            }
        }
    }

    count.skipped_projects.sort();
    Ok(count)
}

/// Items of an envelope's `result` array that deserialize as `T`.
fn result_items<T: DeserializeOwned>(body: &Value) -> Vec<T> {
    body.get("result")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
