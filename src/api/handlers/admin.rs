use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::api::stats_client::StatsClient;
use crate::services::sync::SyncService;

use super::{AppState, ReadSide};

/// Kick off a full sync cycle in the background.
///
/// Only available when reads go against the local store; replica-backed
/// deployments are read-only by construction.
pub async fn admin_sync(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let auth_header = headers.get("Authorization").and_then(|h| h.to_str().ok());
    if auth_header != Some(admin_bearer().as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let ReadSide::Local(repo) = &state.reader else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "Sync is unavailable on replica-backed deployments",
        )
            .into_response();
    };

    let repo = Arc::clone(repo);
    let config = state.config.clone();

    tokio::spawn(async move {
        log::info!("Admin triggered sync started");
        let result = async {
            let client = StatsClient::new(&config.api)?;
            let service = SyncService::new(repo, Arc::new(client), config.sync.clone());
            service.run_cycle().await
        }
        .await;

        match result {
            Ok(summary) => log::info!(
                "Admin triggered sync completed: {}/{} players updated, {} failed",
                summary.succeeded,
                summary.total,
                summary.failed
            ),
            Err(e) => log::error!("Admin triggered sync failed: {:?}", e),
        }
    });

    (StatusCode::ACCEPTED, "Sync triggered").into_response()
}

fn admin_bearer() -> String {
    let token = std::env::var("ADMIN_TOKEN").unwrap_or_else(|_| "secret".to_string());
    format!("Bearer {}", token)
}
