use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{
    admin::admin_sync,
    players::{get_player_history, get_player_snapshot, get_players, search_players},
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/players", get(get_players))
        .route("/api/player/:pid", get(get_player_snapshot))
        .route("/api/player/:pid/history", get(get_player_history))
        .route("/api/search", get(search_players))
        .route("/api/admin/sync", post(admin_sync))
        .with_state(state)
}
