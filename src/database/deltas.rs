use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::DailyDelta;

/// Write a day's delta row, replacing any previous computation for the same
/// (pid, stat_date). Re-running a cycle on the same day therefore overwrites
/// rather than duplicates.
pub fn upsert_daily_delta(conn: &Connection, delta: &DailyDelta) -> Result<()> {
    let sql = "INSERT INTO daily_delta \
               (pid, stat_date, wins, plays, win_rate, rating, rating_change, wins_total, plays_total) \
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
               ON CONFLICT(pid, stat_date) DO UPDATE SET \
               wins = excluded.wins, \
               plays = excluded.plays, \
               win_rate = excluded.win_rate, \
               rating = excluded.rating, \
               rating_change = excluded.rating_change, \
               wins_total = excluded.wins_total, \
               plays_total = excluded.plays_total";

    conn.execute(
        sql,
        params![
            delta.pid,
            delta.stat_date,
            delta.wins,
            delta.plays,
            delta.win_rate,
            delta.rating,
            delta.rating_change,
            delta.wins_total,
            delta.plays_total,
        ],
    )
    .context("Failed to upsert daily delta")?;

    Ok(())
}

/// The most recent delta row dated strictly before `date`.
///
/// Today's own row is deliberately excluded so that a same-day re-run
/// computes against yesterday's totals again instead of against itself.
pub fn latest_before(conn: &Connection, pid: &str, date: NaiveDate) -> Result<Option<DailyDelta>> {
    let sql = "SELECT pid, stat_date, wins, plays, win_rate, rating, rating_change, wins_total, plays_total \
               FROM daily_delta \
               WHERE pid = ?1 AND stat_date < ?2 \
               ORDER BY stat_date DESC \
               LIMIT 1";

    conn.query_row(sql, params![pid, date], parse_delta_row)
        .optional()
        .context("Failed to query latest delta before date")
}

/// Delta rows for a player, newest first, optionally bounded by dates.
pub fn list_range(
    conn: &Connection,
    pid: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<usize>,
) -> Result<Vec<DailyDelta>> {
    let sql = "SELECT pid, stat_date, wins, plays, win_rate, rating, rating_change, wins_total, plays_total \
               FROM daily_delta \
               WHERE pid = ?1 \
                 AND (?2 IS NULL OR stat_date >= ?2) \
                 AND (?3 IS NULL OR stat_date <= ?3) \
               ORDER BY stat_date DESC \
               LIMIT ?4";

    let limit = limit.map(|n| n as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![pid, from, to, limit], parse_delta_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn parse_delta_row(row: &rusqlite::Row) -> rusqlite::Result<DailyDelta> {
    Ok(DailyDelta {
        pid: row.get(0)?,
        stat_date: row.get(1)?,
        wins: row.get(2)?,
        plays: row.get(3)?,
        win_rate: row.get(4)?,
        rating: row.get(5)?,
        rating_change: row.get(6)?,
        wins_total: row.get(7)?,
        plays_total: row.get(8)?,
    })
}
