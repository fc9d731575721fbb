use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::Player;

/// Insert a player or refresh its display metadata.
///
/// Metadata is updated opportunistically: a field is only overwritten when
/// the caller actually supplies a value, so a sparse remote record never
/// blanks what an earlier fetch filled in.
pub fn upsert_player(
    conn: &Connection,
    pid: &str,
    name: Option<&str>,
    code: Option<&str>,
    country: Option<&str>,
) -> Result<Player> {
    if find_by_pid(conn, pid)?.is_some() {
        return refresh_metadata(conn, pid, name, code, country);
    }

    insert_new_player(conn, pid, name, code, country)
}

fn refresh_metadata(
    conn: &Connection,
    pid: &str,
    name: Option<&str>,
    code: Option<&str>,
    country: Option<&str>,
) -> Result<Player> {
    let sql = "UPDATE players SET \
               name = COALESCE(?1, name), \
               code = COALESCE(?2, code), \
               country = COALESCE(?3, country), \
               updated_at = CURRENT_TIMESTAMP \
               WHERE pid = ?4 \
               RETURNING pid, name, code, country, created_at, updated_at";

    conn.query_row(sql, params![name, code, country, pid], parse_player_row)
        .context("Failed to update player metadata")
}

fn insert_new_player(
    conn: &Connection,
    pid: &str,
    name: Option<&str>,
    code: Option<&str>,
    country: Option<&str>,
) -> Result<Player> {
    let sql = "INSERT INTO players (pid, name, code, country) VALUES (?1, ?2, ?3, ?4) \
               RETURNING pid, name, code, country, created_at, updated_at";

    conn.query_row(sql, params![pid, name, code, country], parse_player_row)
        .context("Failed to insert new player")
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    Ok(Player {
        pid: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        country: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn find_by_pid(conn: &Connection, pid: &str) -> Result<Option<Player>> {
    let sql = "SELECT pid, name, code, country, created_at, updated_at \
               FROM players WHERE pid = ?1";

    conn.query_row(sql, params![pid], parse_player_row)
        .optional()
        .context("Failed to query player by pid")
}

/// All known player ids, ordered for reproducible batch numbering.
pub fn list_ids(conn: &Connection) -> Result<Vec<String>> {
    let sql = "SELECT pid FROM players ORDER BY pid";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Substring search over name, code and pid.
pub fn search(conn: &Connection, query: &str) -> Result<Vec<Player>> {
    let sql = "SELECT pid, name, code, country, created_at, updated_at \
               FROM players \
               WHERE LOWER(name) LIKE LOWER(?1) \
                  OR LOWER(code) LIKE LOWER(?1) \
                  OR LOWER(pid) LIKE LOWER(?1) \
               ORDER BY name \
               LIMIT 20";

    let pattern = format!("%{}%", query);
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![pattern], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}
