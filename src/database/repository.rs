use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

use super::connection::{create_pool, get_connection, DbConn, DbPool};
use super::models::{DailyDelta, HistoryRecord, Player, RankedPlayerRow, RankedQuery, Snapshot};
use super::{deltas, history, players, setup, snapshots};
use crate::domain::{DeltaBasis, VersusStats};

/// One player's fully prepared write for a successful batch: the fetched
/// record plus the delta row computed from it.
#[derive(Debug, Clone)]
pub struct PlayerUpdate {
    pub record: VersusStats,
    pub delta: DailyDelta,
}

/// Typed storage operations for players, snapshots, history and deltas.
///
/// Everything the sync engine and the read API know about the store goes
/// through here; the multi-statement mutations (roll, batch apply) each run
/// inside a single transaction.
pub struct StatsRepository {
    pool: DbPool,
}

impl StatsRepository {
    pub fn open(database_path: &str) -> Result<Self> {
        let pool = create_pool(database_path)?;
        let conn = get_connection(&pool)?;
        setup::init_schema(&conn)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<DbConn> {
        get_connection(&self.pool)
    }

    /// The full ordered player-id set. Failure here is structural and aborts
    /// a sync cycle.
    pub fn player_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        players::list_ids(&conn).context("Failed to enumerate player ids")
    }

    // --- Bulk-load interface (also used by the importer) ---

    pub fn upsert_player(
        &self,
        pid: &str,
        name: Option<&str>,
        code: Option<&str>,
        country: Option<&str>,
    ) -> Result<Player> {
        let conn = self.conn()?;
        players::upsert_player(&conn, pid, name, code, country)
    }

    pub fn upsert_daily_delta(&self, delta: &DailyDelta) -> Result<()> {
        let conn = self.conn()?;
        deltas::upsert_daily_delta(&conn, delta)
    }

    // --- Sync-cycle mutations ---

    /// The roll: archive every live snapshot to the history ledger, then
    /// clear the snapshot table for repopulation.
    ///
    /// Archive and clear share one transaction, so a failed archive leaves
    /// the snapshot table untouched (backup before delete). Returns the
    /// number of rows archived.
    pub fn roll_snapshots(&self, recorded_at: NaiveDateTime) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .context("Failed to begin roll transaction")?;

        let current = snapshots::list_all(&tx)?;
        let archived = history::archive_snapshots(&tx, &current, recorded_at)
            .context("Failed to archive snapshots before clear")?;
        snapshots::clear_all(&tx)?;

        tx.commit().context("Failed to commit roll transaction")?;
        Ok(archived)
    }

    /// Basis for a player's delta on `date`: the most recent stored delta
    /// row dated before it, or first observation if none exists.
    pub fn delta_basis(&self, pid: &str, date: NaiveDate) -> Result<DeltaBasis> {
        let conn = self.conn()?;
        let prev = deltas::latest_before(&conn, pid, date)?;
        Ok(match prev {
            Some(row) => DeltaBasis::DeltaFrom(crate::domain::CumulativeStats {
                rating: row.rating,
                wins_total: row.wins_total,
                plays_total: row.plays_total,
            }),
            None => DeltaBasis::FirstObservation,
        })
    }

    /// Apply one successful batch: player metadata, snapshot and delta rows
    /// for every record, inside a single transaction.
    pub fn apply_batch(&self, updates: &[PlayerUpdate], captured_at: NaiveDateTime) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .context("Failed to begin batch transaction")?;

        for update in updates {
            let record = &update.record;
            players::upsert_player(
                &tx,
                &record.pid,
                record.name.as_deref(),
                record.code.as_deref(),
                record.country.as_deref(),
            )?;
            snapshots::upsert_snapshot(&tx, &record.pid, record.cumulative(), captured_at)?;
            deltas::upsert_daily_delta(&tx, &update.delta)?;
        }

        tx.commit().context("Failed to commit batch transaction")
    }

    // --- Read-side interface ---

    pub fn latest_snapshot(&self, pid: &str) -> Result<Option<Snapshot>> {
        let conn = self.conn()?;
        snapshots::find_by_pid(&conn, pid)
    }

    pub fn find_player(&self, pid: &str) -> Result<Option<Player>> {
        let conn = self.conn()?;
        players::find_by_pid(&conn, pid)
    }

    pub fn search_players(&self, query: &str) -> Result<Vec<Player>> {
        let conn = self.conn()?;
        players::search(&conn, query)
    }

    pub fn delta_history(
        &self,
        pid: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<DailyDelta>> {
        let conn = self.conn()?;
        deltas::list_range(&conn, pid, from, to, limit)
    }

    pub fn ranked_latest(&self, query: &RankedQuery) -> Result<(Vec<RankedPlayerRow>, usize)> {
        let conn = self.conn()?;
        snapshots::ranked_latest(&conn, query)
    }

    pub fn history_for(&self, pid: &str) -> Result<Vec<HistoryRecord>> {
        let conn = self.conn()?;
        history::list_by_pid(&conn, pid)
    }

    pub fn snapshot_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        snapshots::count(&conn)
    }

    pub fn history_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        history::count(&conn)
    }
}
