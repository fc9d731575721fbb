use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone)]
pub struct Player {
    pub pid: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub country: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// The single latest known state for a player. One row per pid.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub pid: String,
    pub rating: i64,
    pub wins_total: i64,
    pub plays_total: i64,
    pub captured_at: NaiveDateTime,
}

/// Archived copy of a snapshot, written immediately before it is superseded.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub id: i64,
    pub pid: String,
    pub rating: i64,
    pub wins_total: i64,
    pub plays_total: i64,
    pub win_rate: f64,
    pub recorded_at: NaiveDateTime,
}

/// Day-over-day change for a player. One row per (pid, stat_date);
/// recomputing the same date overwrites in place.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyDelta {
    pub pid: String,
    pub stat_date: NaiveDate,
    pub wins: i64,
    pub plays: i64,
    pub win_rate: f64,
    pub rating: i64,
    pub rating_change: i64,
    pub wins_total: i64,
    pub plays_total: i64,
}

// DTO for the ranked listing (snapshot joined with player metadata)
#[derive(Debug, Clone)]
pub struct RankedPlayerRow {
    pub pid: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub country: Option<String>,
    pub rating: i64,
    pub wins_total: i64,
    pub plays_total: i64,
    pub captured_at: NaiveDateTime,
}

impl RankedPlayerRow {
    /// Lifetime win rate in percent, zero when nothing has been played.
    pub fn win_rate(&self) -> f64 {
        if self.plays_total > 0 {
            self.wins_total as f64 * 100.0 / self.plays_total as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub enum SortColumn {
    Rating,
    WinsTotal,
    PlaysTotal,
    Name,
}

#[derive(Debug, Clone)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct RankedQuery {
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}
