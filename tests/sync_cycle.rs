use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use maker_versus_stats::api::stats_client::StatsSource;
use maker_versus_stats::config::settings::SyncSettings;
use maker_versus_stats::database::StatsRepository;
use maker_versus_stats::domain::VersusStats;
use maker_versus_stats::errors::FetchError;
use maker_versus_stats::services::sync::SyncService;

/// Returns whatever records it currently holds for the requested pids;
/// players missing from the script are simply absent from the response.
struct ScriptedSource {
    records: Mutex<HashMap<String, VersusStats>>,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    fn set(&self, pid: &str, rating: i64, wins_total: i64, plays_total: i64) {
        self.records.lock().unwrap().insert(
            pid.to_string(),
            VersusStats {
                pid: pid.to_string(),
                name: Some(format!("Player {}", pid)),
                code: None,
                country: None,
                versus_rating: rating,
                versus_won: wins_total,
                versus_plays: plays_total,
            },
        );
    }
}

#[async_trait]
impl StatsSource for ScriptedSource {
    async fn fetch_batch(&self, pids: &[String]) -> Result<Vec<VersusStats>, FetchError> {
        let records = self.records.lock().unwrap();
        Ok(pids.iter().filter_map(|p| records.get(p).cloned()).collect())
    }
}

struct FailingSource;

#[async_trait]
impl StatsSource for FailingSource {
    async fn fetch_batch(&self, _pids: &[String]) -> Result<Vec<VersusStats>, FetchError> {
        Err(FetchError::Network("scripted outage".to_string()))
    }
}

fn settings() -> SyncSettings {
    SyncSettings {
        batch_size: 2,
        concurrency: 2,
        worker_delay_ms: 0,
        inflate_zero_play_wins: true,
    }
}

fn open_repo(dir: &tempfile::TempDir) -> Arc<StatsRepository> {
    let path = dir.path().join("stats.db");
    Arc::new(StatsRepository::open(path.to_str().unwrap()).unwrap())
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

#[tokio::test]
async fn two_day_cycle_produces_snapshot_delta_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    repo.upsert_player("P", None, None, None).unwrap();

    let source = Arc::new(ScriptedSource::new());
    source.set("P", 1000, 0, 0);
    let service = SyncService::new(Arc::clone(&repo), Arc::clone(&source) as _, settings());

    // Day 1: first observation.
    let summary = service.run_cycle_on(day(1)).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);

    let snapshot = repo.latest_snapshot("P").unwrap().unwrap();
    assert_eq!(snapshot.rating, 1000);
    assert_eq!(snapshot.wins_total, 0);
    assert_eq!(snapshot.plays_total, 0);

    let deltas = repo.delta_history("P", None, None, None).unwrap();
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].stat_date, day(1));
    assert_eq!(deltas[0].wins, 0);
    assert_eq!(deltas[0].plays, 0);
    assert_eq!(deltas[0].win_rate, 0.0);
    assert_eq!(deltas[0].rating_change, 0);

    // Nothing existed before day 1's roll.
    assert_eq!(repo.history_count().unwrap(), 0);

    // Day 2: the source moved on.
    source.set("P", 1100, 3, 5);
    let summary = service.run_cycle_on(day(2)).await.unwrap();
    assert_eq!(summary.succeeded, 1);

    let snapshot = repo.latest_snapshot("P").unwrap().unwrap();
    assert_eq!(snapshot.rating, 1100);

    let deltas = repo.delta_history("P", None, None, None).unwrap();
    assert_eq!(deltas.len(), 2);
    let day2 = &deltas[0];
    assert_eq!(day2.stat_date, day(2));
    assert_eq!(day2.wins, 3);
    assert_eq!(day2.plays, 5);
    assert_eq!(day2.win_rate, 0.6);
    assert_eq!(day2.rating_change, 100);
    assert_eq!(day2.wins_total, 3);
    assert_eq!(day2.plays_total, 5);

    // Exactly one history record, archiving day 1's snapshot values.
    let history = repo.history_for("P").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].rating, 1000);
    assert_eq!(history[0].wins_total, 0);
    assert_eq!(history[0].plays_total, 0);
    assert_eq!(history[0].win_rate, 0.0);
}

#[tokio::test]
async fn rerunning_the_same_day_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    repo.upsert_player("P", None, None, None).unwrap();

    let source = Arc::new(ScriptedSource::new());
    source.set("P", 1000, 4, 10);
    let service = SyncService::new(Arc::clone(&repo), Arc::clone(&source) as _, settings());

    service.run_cycle_on(day(1)).await.unwrap();
    source.set("P", 1100, 7, 15);
    service.run_cycle_on(day(2)).await.unwrap();

    let snapshot_before = repo.latest_snapshot("P").unwrap().unwrap();
    let deltas_before = repo.delta_history("P", None, None, None).unwrap();

    // Same day, identical remote response.
    service.run_cycle_on(day(2)).await.unwrap();

    let snapshot_after = repo.latest_snapshot("P").unwrap().unwrap();
    let deltas_after = repo.delta_history("P", None, None, None).unwrap();

    assert_eq!(snapshot_before.rating, snapshot_after.rating);
    assert_eq!(snapshot_before.wins_total, snapshot_after.wins_total);
    assert_eq!(snapshot_before.plays_total, snapshot_after.plays_total);
    assert_eq!(deltas_before, deltas_after);
    assert_eq!(deltas_after.len(), 2);
    assert_eq!(deltas_after[0].wins, 3);
}

#[tokio::test]
async fn history_grows_by_snapshot_count_on_each_roll() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    let source = Arc::new(ScriptedSource::new());
    for pid in ["A", "B", "C"] {
        repo.upsert_player(pid, None, None, None).unwrap();
        source.set(pid, 1500, 10, 20);
    }
    let service = SyncService::new(Arc::clone(&repo), Arc::clone(&source) as _, settings());

    service.run_cycle_on(day(1)).await.unwrap();
    assert_eq!(repo.history_count().unwrap(), 0);
    assert_eq!(repo.snapshot_count().unwrap(), 3);

    service.run_cycle_on(day(2)).await.unwrap();
    assert_eq!(repo.history_count().unwrap(), 3);

    service.run_cycle_on(day(3)).await.unwrap();
    assert_eq!(repo.history_count().unwrap(), 6);
}

#[tokio::test]
async fn failed_batches_are_counted_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    for i in 0..5 {
        repo.upsert_player(&format!("P{}", i), None, None, None)
            .unwrap();
    }
    let service = SyncService::new(Arc::clone(&repo), Arc::new(FailingSource) as _, settings());

    // Every batch fails, but the cycle still completes with a summary.
    let summary = service.run_cycle_on(day(1)).await.unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 5);
    assert_eq!(repo.snapshot_count().unwrap(), 0);
}

#[tokio::test]
async fn players_missing_from_the_response_fail_only_their_batch() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    let source = Arc::new(ScriptedSource::new());
    for pid in ["A", "B", "C"] {
        repo.upsert_player(pid, None, None, None).unwrap();
    }
    // Batches of 2 over [A, B, C]: the [C] batch gets an empty response.
    source.set("A", 1000, 1, 2);
    source.set("B", 1200, 2, 3);
    let service = SyncService::new(Arc::clone(&repo), Arc::clone(&source) as _, settings());

    let summary = service.run_cycle_on(day(1)).await.unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(repo.latest_snapshot("A").unwrap().is_some());
    assert!(repo.latest_snapshot("C").unwrap().is_none());
}

#[tokio::test]
async fn sync_refreshes_player_metadata_opportunistically() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    repo.upsert_player("P", Some("Old Name"), Some("AAA-111"), None)
        .unwrap();

    let source = Arc::new(ScriptedSource::new());
    source.set("P", 1000, 0, 0);
    let service = SyncService::new(Arc::clone(&repo), Arc::clone(&source) as _, settings());
    service.run_cycle_on(day(1)).await.unwrap();

    let player = repo.find_player("P").unwrap().unwrap();
    // Name came with the fetch; the code the fetch omitted is untouched.
    assert_eq!(player.name.as_deref(), Some("Player P"));
    assert_eq!(player.code.as_deref(), Some("AAA-111"));
}
