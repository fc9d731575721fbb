use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{info, warn};

use crate::database::models::DailyDelta;
use crate::database::StatsRepository;

/// One-time bulk loader for the legacy per-player CSV exports.
///
/// Each file is named `<pid>.csv` with the columns
/// `wins,plays,win_rate,rate,rate_change,wins_total,plays_total,time`.
/// Rows are loaded through the same upserts the sync engine uses, so
/// re-importing a file overwrites rather than duplicates.
pub struct ImportService {
    repo: Arc<StatsRepository>,
}

#[derive(Debug)]
pub struct ImportSummary {
    pub files: usize,
    pub rows: usize,
    pub skipped: usize,
}

impl ImportService {
    pub fn new(repo: Arc<StatsRepository>) -> Self {
        Self { repo }
    }

    pub fn run(&self, data_dir: &Path) -> Result<ImportSummary> {
        let mut summary = ImportSummary {
            files: 0,
            rows: 0,
            skipped: 0,
        };

        let entries = fs::read_dir(data_dir)
            .with_context(|| format!("Failed to read import directory {}", data_dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(pid) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            info!("Importing {}", path.display());
            self.import_file(pid, &path, &mut summary)?;
            summary.files += 1;
        }

        info!(
            "Import finished: {} files, {} rows loaded, {} rows skipped",
            summary.files, summary.rows, summary.skipped
        );
        Ok(summary)
    }

    fn import_file(&self, pid: &str, path: &Path, summary: &mut ImportSummary) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        self.repo.upsert_player(pid, None, None, None)?;

        for line in content.lines().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_csv_row(pid, line) {
                Ok(delta) => {
                    self.repo.upsert_daily_delta(&delta)?;
                    summary.rows += 1;
                }
                Err(e) => {
                    warn!("Skipping row in {}: {}", path.display(), e);
                    summary.skipped += 1;
                }
            }
        }

        Ok(())
    }
}

fn parse_csv_row(pid: &str, line: &str) -> Result<DailyDelta> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 8 {
        anyhow::bail!("expected 8 columns, got {}", fields.len());
    }

    let record_time = parse_record_time(fields[7])?;

    Ok(DailyDelta {
        pid: pid.to_string(),
        stat_date: record_time.date(),
        wins: fields[0].trim().parse().context("bad wins")?,
        plays: fields[1].trim().parse().context("bad plays")?,
        win_rate: fields[2].trim().parse().context("bad win_rate")?,
        rating: fields[3].trim().parse().context("bad rate")?,
        rating_change: fields[4].trim().parse().context("bad rate_change")?,
        wins_total: fields[5].trim().parse().context("bad wins_total")?,
        plays_total: fields[6].trim().parse().context("bad plays_total")?,
    })
}

// The exports carry two timestamp shapes, depending on their age.
fn parse_record_time(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y/%m/%d %H:%M") {
        return Ok(dt);
    }

    anyhow::bail!("unrecognized timestamp: {}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> (Arc<StatsRepository>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        let repo = StatsRepository::open(path.to_str().unwrap()).unwrap();
        (Arc::new(repo), dir)
    }

    const CSV: &str = "\
wins,plays,win_rate,rate,rate_change,wins_total,plays_total,time
3,5,0.6,1100,100,3,5,2024-05-13 22:04:25
2,4,0.5,1150,50,5,9,2024/05/14 21:49
bad,row,with,not,enough,columns
";

    #[test]
    fn imports_rows_and_skips_bad_lines() {
        let (repo, _db_dir) = test_repo();
        let data_dir = tempfile::tempdir().unwrap();
        fs::write(data_dir.path().join("Y9P7BN4JF.csv"), CSV).unwrap();
        fs::write(data_dir.path().join("notes.txt"), "ignored").unwrap();

        let service = ImportService::new(Arc::clone(&repo));
        let summary = service.run(data_dir.path()).unwrap();

        assert_eq!(summary.files, 1);
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.skipped, 1);

        let rows = repo
            .delta_history("Y9P7BN4JF", None, None, None)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rating, 1150);
        assert_eq!(rows[1].wins, 3);
    }

    #[test]
    fn reimport_overwrites_instead_of_duplicating() {
        let (repo, _db_dir) = test_repo();
        let data_dir = tempfile::tempdir().unwrap();
        fs::write(data_dir.path().join("P1.csv"), CSV).unwrap();

        let service = ImportService::new(Arc::clone(&repo));
        service.run(data_dir.path()).unwrap();
        service.run(data_dir.path()).unwrap();

        let rows = repo.delta_history("P1", None, None, None).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
