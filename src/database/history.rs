use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::models::{HistoryRecord, Snapshot};

/// Archive a batch of snapshots into the history ledger.
///
/// Called with the pre-roll snapshot rows, before the snapshot table is
/// touched. Returns the number of records written, which must equal the
/// number of snapshots passed in.
pub fn archive_snapshots(
    conn: &Connection,
    snapshots: &[Snapshot],
    recorded_at: NaiveDateTime,
) -> Result<usize> {
    let sql = "INSERT INTO stats_history \
               (pid, rating, wins_total, plays_total, win_rate, recorded_at) \
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

    let mut stmt = conn
        .prepare(sql)
        .context("Failed to prepare history insert")?;

    for snapshot in snapshots {
        stmt.execute(params![
            snapshot.pid,
            snapshot.rating,
            snapshot.wins_total,
            snapshot.plays_total,
            snapshot_win_rate(snapshot),
            recorded_at,
        ])
        .with_context(|| format!("Failed to archive snapshot for {}", snapshot.pid))?;
    }

    Ok(snapshots.len())
}

/// Lifetime win rate in percent for an archived snapshot.
pub fn snapshot_win_rate(snapshot: &Snapshot) -> f64 {
    if snapshot.wins_total > 0 {
        snapshot.wins_total as f64 * 100.0 / snapshot.plays_total as f64
    } else {
        0.0
    }
}

pub fn list_by_pid(conn: &Connection, pid: &str) -> Result<Vec<HistoryRecord>> {
    let sql = "SELECT id, pid, rating, wins_total, plays_total, win_rate, recorded_at \
               FROM stats_history WHERE pid = ?1 ORDER BY recorded_at DESC";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![pid], parse_history_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn count(conn: &Connection) -> Result<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM stats_history", [], |row| row.get(0))
        .context("Failed to count history records")?;
    Ok(n as usize)
}

fn parse_history_row(row: &rusqlite::Row) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.get(0)?,
        pid: row.get(1)?,
        rating: row.get(2)?,
        wins_total: row.get(3)?,
        plays_total: row.get(4)?,
        win_rate: row.get(5)?,
        recorded_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot(wins_total: i64, plays_total: i64) -> Snapshot {
        Snapshot {
            pid: "P1".to_string(),
            rating: 1500,
            wins_total,
            plays_total,
            captured_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn win_rate_is_percentage_of_plays() {
        assert_eq!(snapshot_win_rate(&snapshot(25, 100)), 25.0);
    }

    #[test]
    fn win_rate_is_zero_without_wins() {
        assert_eq!(snapshot_win_rate(&snapshot(0, 100)), 0.0);
        assert_eq!(snapshot_win_rate(&snapshot(0, 0)), 0.0);
    }
}
