use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{RankedPlayerRow, RankedQuery, Snapshot, SortColumn, SortOrder};
use crate::domain::CumulativeStats;

/// Replace a player's snapshot with freshly fetched cumulative values.
///
/// The pid is the primary key, so this can never produce a second live row
/// for a player; an existing row is replaced wholesale, never merged.
pub fn upsert_snapshot(
    conn: &Connection,
    pid: &str,
    stats: CumulativeStats,
    captured_at: NaiveDateTime,
) -> Result<()> {
    let sql = "INSERT OR REPLACE INTO stats_snapshot \
               (pid, rating, wins_total, plays_total, captured_at) \
               VALUES (?1, ?2, ?3, ?4, ?5)";

    conn.execute(
        sql,
        params![
            pid,
            stats.rating,
            stats.wins_total,
            stats.plays_total,
            captured_at
        ],
    )
    .context("Failed to upsert snapshot")?;

    Ok(())
}

pub fn find_by_pid(conn: &Connection, pid: &str) -> Result<Option<Snapshot>> {
    let sql = "SELECT pid, rating, wins_total, plays_total, captured_at \
               FROM stats_snapshot WHERE pid = ?1";

    conn.query_row(sql, params![pid], parse_snapshot_row)
        .optional()
        .context("Failed to query snapshot by pid")
}

pub fn list_all(conn: &Connection) -> Result<Vec<Snapshot>> {
    let sql = "SELECT pid, rating, wins_total, plays_total, captured_at FROM stats_snapshot";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], parse_snapshot_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn clear_all(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM stats_snapshot", [])
        .context("Failed to clear snapshot table")
}

pub fn count(conn: &Connection) -> Result<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM stats_snapshot", [], |row| row.get(0))
        .context("Failed to count snapshots")?;
    Ok(n as usize)
}

fn parse_snapshot_row(row: &rusqlite::Row) -> rusqlite::Result<Snapshot> {
    Ok(Snapshot {
        pid: row.get(0)?,
        rating: row.get(1)?,
        wins_total: row.get(2)?,
        plays_total: row.get(3)?,
        captured_at: row.get(4)?,
    })
}

/// Ranked listing over the latest snapshots, joined with player metadata.
///
/// Returns the requested page plus the total row count for pagination.
pub fn ranked_latest(
    conn: &Connection,
    query: &RankedQuery,
) -> Result<(Vec<RankedPlayerRow>, usize)> {
    let order_clause = build_order_clause(&query.sort_by, &query.sort_order);
    let sql = format!(
        "SELECT s.pid, p.name, p.code, p.country, s.rating, s.wins_total, s.plays_total, s.captured_at \
         FROM stats_snapshot s \
         JOIN players p ON p.pid = s.pid \
         ORDER BY {} \
         LIMIT ?1 OFFSET ?2",
        order_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![query.limit as i64, query.offset as i64],
            parse_ranked_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let total = count(conn)?;
    Ok((rows, total))
}

fn build_order_clause(sort_by: &SortColumn, sort_order: &SortOrder) -> String {
    let column = match sort_by {
        SortColumn::Rating => "s.rating",
        SortColumn::WinsTotal => "s.wins_total",
        SortColumn::PlaysTotal => "s.plays_total",
        SortColumn::Name => "p.name",
    };
    let direction = match sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    format!("{} {}", column, direction)
}

fn parse_ranked_row(row: &rusqlite::Row) -> rusqlite::Result<RankedPlayerRow> {
    Ok(RankedPlayerRow {
        pid: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        country: row.get(3)?,
        rating: row.get(4)?,
        wins_total: row.get(5)?,
        plays_total: row.get(6)?,
        captured_at: row.get(7)?,
    })
}
