use serde::Serialize;

use crate::database::models::{DailyDelta, Player, RankedPlayerRow};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub pid: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub country: Option<String>,
}

impl From<Player> for PlayerSummary {
    fn from(player: Player) -> Self {
        Self {
            pid: player.pid,
            name: player.name,
            code: player.code,
            country: player.country,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerListItem {
    pub rank: usize,
    pub pid: String,
    pub name: Option<String>,
    pub rating: i64,
    pub wins_total: i64,
    pub plays_total: i64,
    pub win_rate: f64,
}

impl PlayerListItem {
    pub fn from_row(rank: usize, row: RankedPlayerRow) -> Self {
        let win_rate = row.win_rate();
        Self {
            rank,
            pid: row.pid,
            name: row.name,
            rating: row.rating,
            wins_total: row.wins_total,
            plays_total: row.plays_total,
            win_rate,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerListResponse {
    pub items: Vec<PlayerListItem>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub player: PlayerSummary,
    pub rating: i64,
    pub wins_total: i64,
    pub plays_total: i64,
    pub captured_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaItem {
    pub stat_date: String,
    pub wins: i64,
    pub plays: i64,
    pub win_rate: f64,
    pub rating: i64,
    pub rating_change: i64,
    pub wins_total: i64,
    pub plays_total: i64,
}

impl From<DailyDelta> for DeltaItem {
    fn from(delta: DailyDelta) -> Self {
        Self {
            stat_date: delta.stat_date.to_string(),
            wins: delta.wins,
            plays: delta.plays,
            win_rate: delta.win_rate,
            rating: delta.rating,
            rating_change: delta.rating_change,
            wins_total: delta.wins_total,
            plays_total: delta.plays_total,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub player: PlayerSummary,
    pub items: Vec<DeltaItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub items: Vec<PlayerSummary>,
}
