use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// Build the HTTP client used for remote stats fetches.
///
/// The timeout bounds the whole request; a batch that exceeds it is reported
/// as a network failure for that batch, never retried within the cycle.
pub fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}
