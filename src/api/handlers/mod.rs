use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::cache::ReplicaCache;
use crate::config::settings::AppConfig;
use crate::database::models::{DailyDelta, Player, RankedPlayerRow, RankedQuery, Snapshot};
use crate::database::{deltas, players as player_queries, snapshots, StatsRepository};

pub mod admin;
pub mod players;

pub struct AppState {
    pub reader: ReadSide,
    pub config: AppConfig,
}

/// Where read queries go: the local store, or the TTL-refreshed mirror of a
/// remotely hosted replica (stateless compute deployments).
///
/// Both paths run the same typed queries; only the connection differs.
pub enum ReadSide {
    Local(Arc<StatsRepository>),
    Replica(Mutex<ReplicaCache>),
}

impl ReadSide {
    pub async fn latest_snapshot(&self, pid: &str) -> Result<Option<Snapshot>> {
        match self {
            ReadSide::Local(repo) => repo.latest_snapshot(pid),
            ReadSide::Replica(cache) => {
                let conn = cache.lock().await.open().await?;
                snapshots::find_by_pid(&conn, pid)
            }
        }
    }

    pub async fn find_player(&self, pid: &str) -> Result<Option<Player>> {
        match self {
            ReadSide::Local(repo) => repo.find_player(pid),
            ReadSide::Replica(cache) => {
                let conn = cache.lock().await.open().await?;
                player_queries::find_by_pid(&conn, pid)
            }
        }
    }

    pub async fn search_players(&self, query: &str) -> Result<Vec<Player>> {
        match self {
            ReadSide::Local(repo) => repo.search_players(query),
            ReadSide::Replica(cache) => {
                let conn = cache.lock().await.open().await?;
                player_queries::search(&conn, query)
            }
        }
    }

    pub async fn delta_history(
        &self,
        pid: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<DailyDelta>> {
        match self {
            ReadSide::Local(repo) => repo.delta_history(pid, from, to, limit),
            ReadSide::Replica(cache) => {
                let conn = cache.lock().await.open().await?;
                deltas::list_range(&conn, pid, from, to, limit)
            }
        }
    }

    pub async fn ranked_latest(&self, query: &RankedQuery) -> Result<(Vec<RankedPlayerRow>, usize)> {
        match self {
            ReadSide::Local(repo) => repo.ranked_latest(query),
            ReadSide::Replica(cache) => {
                let conn = cache.lock().await.open().await?;
                snapshots::ranked_latest(&conn, query)
            }
        }
    }
}

#[derive(Deserialize)]
pub struct PlayerParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}
