use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;

use crate::config::settings::ApiSettings;
use crate::domain::VersusStats;
use crate::errors::{truncate_body, FetchError};
use crate::http;

/// Source of cumulative player stats, one batch per call.
///
/// The production implementation talks to the remote batch endpoint; tests
/// drive the sync engine with a scripted source.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_batch(&self, pids: &[String]) -> Result<Vec<VersusStats>, FetchError>;
}

/// Client for the remote batch stats endpoint
pub struct StatsClient {
    client: reqwest::Client,
    base_url: String,
}

impl StatsClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = http::build_client(settings.user_agent, settings.timeout_secs)?;
        Ok(Self {
            client,
            base_url: settings.base_url.to_string(),
        })
    }

    // Player ids are joined by commas into the request path.
    fn build_batch_url(&self, pids: &[String]) -> String {
        format!("{}/user_info_multiple/{}", self.base_url, pids.join(","))
    }

    /// Parse a batch response body into validated records.
    ///
    /// The body must be JSON with a `users` array; anything else fails the
    /// whole batch. Individual records are parsed strictly: malformed
    /// entries are skipped with a warning, and entries for players outside
    /// the requested batch are dropped silently.
    fn parse_batch_body(body: &str, requested: &[String]) -> Result<Vec<VersusStats>, FetchError> {
        let data: Value = serde_json::from_str(body).map_err(|e| {
            FetchError::MalformedResponse(format!(
                "invalid JSON ({}): {}",
                e,
                truncate_body(body)
            ))
        })?;

        let users = data.get("users").and_then(Value::as_array).ok_or_else(|| {
            FetchError::MalformedResponse(format!(
                "missing 'users' collection: {}",
                truncate_body(body)
            ))
        })?;

        let requested_set: HashSet<&str> = requested.iter().map(String::as_str).collect();
        let mut records = Vec::with_capacity(users.len());

        for entry in users {
            match serde_json::from_value::<VersusStats>(entry.clone()) {
                Ok(record) => {
                    if requested_set.contains(record.pid.as_str()) {
                        records.push(record);
                    } else {
                        debug!("Dropping record for unrequested pid {}", record.pid);
                    }
                }
                Err(e) => warn!("Skipping malformed player record: {}", e),
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl StatsSource for StatsClient {
    async fn fetch_batch(&self, pids: &[String]) -> Result<Vec<VersusStats>, FetchError> {
        let url = self.build_batch_url(pids);
        info!("Fetching stats for {} players", pids.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("API returned status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Self::parse_batch_body(&body, pids)
    }
}
