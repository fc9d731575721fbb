use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::models::{
    DeltaItem, HistoryResponse, PlayerListItem, PlayerListResponse, PlayerSummary, SearchResponse,
    SnapshotResponse,
};
use crate::database::models::{RankedQuery, SortColumn, SortOrder};

use super::{AppState, HistoryParams, PlayerParams, SearchParams};

pub async fn get_players(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlayerParams>,
) -> impl IntoResponse {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(100).clamp(1, 1000);
    let offset = (page - 1) * page_size;

    let sort_by = match params.sort_by.as_deref() {
        Some("name") => SortColumn::Name,
        Some("winsTotal") => SortColumn::WinsTotal,
        Some("playsTotal") => SortColumn::PlaysTotal,
        _ => SortColumn::Rating,
    };

    let sort_order = match params.order.as_deref() {
        Some("asc") => SortOrder::Asc,
        _ => SortOrder::Desc,
    };

    let query = RankedQuery {
        sort_by,
        sort_order,
        limit: page_size,
        offset,
    };

    let (rows, total) = match state.reader.ranked_latest(&query).await {
        Ok(result) => result,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e))
                .into_response()
        }
    };

    let items: Vec<PlayerListItem> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| PlayerListItem::from_row(offset + i + 1, row))
        .collect();

    Json(PlayerListResponse {
        items,
        total,
        page,
        page_size,
    })
    .into_response()
}

pub async fn get_player_snapshot(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
) -> impl IntoResponse {
    let player = match state.reader.find_player(&pid).await {
        Ok(Some(player)) => player,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e))
                .into_response()
        }
    };

    match state.reader.latest_snapshot(&pid).await {
        Ok(Some(snapshot)) => {
            let wins_total = snapshot.wins_total;
            let plays_total = snapshot.plays_total;
            let response = SnapshotResponse {
                player: PlayerSummary::from(player),
                rating: snapshot.rating,
                wins_total,
                plays_total,
                captured_at: snapshot.captured_at.to_string(),
            };
            Json(response).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e)).into_response()
        }
    }
}

pub async fn get_player_history(
    State(state): State<Arc<AppState>>,
    Path(pid): Path<String>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let player = match state.reader.find_player(&pid).await {
        Ok(Some(player)) => player,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e))
                .into_response()
        }
    };

    let deltas = match state
        .reader
        .delta_history(&pid, params.from, params.to, params.limit)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e))
                .into_response()
        }
    };

    Json(HistoryResponse {
        player: PlayerSummary::from(player),
        items: deltas.into_iter().map(DeltaItem::from).collect(),
    })
    .into_response()
}

pub async fn search_players(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    match state.reader.search_players(&params.q).await {
        Ok(players) => Json(SearchResponse {
            items: players.into_iter().map(PlayerSummary::from).collect(),
        })
        .into_response(),
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e)).into_response()
        }
    }
}
