use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::api::stats_client::StatsSource;
use crate::config::settings::SyncSettings;
use crate::database::{PlayerUpdate, StatsRepository};
use crate::domain::{delta, VersusStats};
use crate::errors::FetchError;
use crate::rate_limiter::WorkerCooldown;

/// Outcome of a full synchronization cycle.
///
/// A cycle that ran to completion always returns one of these, however low
/// the success rate; an aborted cycle returns an error instead, so callers
/// can tell "0% succeeded" apart from "did not finish".
#[derive(Debug)]
pub struct SyncSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// One unit of work for a fetch worker. Numbering is for logging only.
struct Batch {
    number: usize,
    pids: Vec<String>,
}

/// Immutable per-batch result sent from a worker to the aggregator.
struct BatchOutcome {
    number: usize,
    size: usize,
    result: Result<Vec<VersusStats>, FetchError>,
}

/// Drives a full synchronization cycle over the entire player population.
///
/// Fetches run on a bounded worker pool; every store write happens in the
/// aggregator loop on this task, so batch mutations never interleave.
pub struct SyncService {
    repo: Arc<StatsRepository>,
    source: Arc<dyn StatsSource>,
    settings: SyncSettings,
}

impl SyncService {
    pub fn new(
        repo: Arc<StatsRepository>,
        source: Arc<dyn StatsSource>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            repo,
            source,
            settings,
        }
    }

    pub async fn run_cycle(&self) -> Result<SyncSummary> {
        self.run_cycle_on(Local::now().date_naive()).await
    }

    /// Run one cycle, computing deltas against `today`.
    ///
    /// Split out from [`run_cycle`](Self::run_cycle) so tests can replay
    /// consecutive days deterministically.
    pub async fn run_cycle_on(&self, today: NaiveDate) -> Result<SyncSummary> {
        let started = Instant::now();

        let pids = self.repo.player_ids()?;
        if pids.is_empty() {
            anyhow::bail!("No players found to synchronize");
        }

        let total = pids.len();
        let batches = partition_batches(pids, self.settings.batch_size);
        let batch_count = batches.len();
        info!(
            "Processing {} players in {} batches of up to {}",
            total, batch_count, self.settings.batch_size
        );

        // Archive the previous snapshot state before any new write.
        let archived = self
            .repo
            .roll_snapshots(Local::now().naive_local())
            .context("Failed to roll snapshots into history")?;
        info!("Archived {} snapshots to history", archived);

        let mut rx = self.spawn_workers(batches);

        let mut succeeded = 0usize;
        let mut failed = 0usize;

        while let Some(outcome) = rx.recv().await {
            match outcome.result {
                Ok(records) if records.is_empty() => {
                    warn!(
                        "Batch {}/{}: no valid player data in response",
                        outcome.number, batch_count
                    );
                    failed += outcome.size;
                }
                Ok(records) => {
                    let applied = self
                        .apply_records(records, today)
                        .with_context(|| format!("Failed to write batch {}", outcome.number))?;
                    info!(
                        "Batch {}/{} completed: {} players updated",
                        outcome.number, batch_count, applied
                    );
                    succeeded += applied;
                }
                Err(e) => {
                    error!("Batch {}/{} failed: {}", outcome.number, batch_count, e);
                    failed += outcome.size;
                }
            }
        }

        let summary = SyncSummary {
            total,
            succeeded,
            failed,
            elapsed: started.elapsed(),
        };
        log_summary(&summary);
        Ok(summary)
    }

    fn spawn_workers(&self, batches: Vec<Batch>) -> mpsc::Receiver<BatchOutcome> {
        let worker_count = self.settings.concurrency.clamp(1, batches.len().max(1));
        let queue = Arc::new(Mutex::new(VecDeque::from(batches)));
        let (tx, rx) = mpsc::channel(worker_count);

        for _ in 0..worker_count {
            let queue = Arc::clone(&queue);
            let source = Arc::clone(&self.source);
            let tx = tx.clone();
            let delay_ms = self.settings.worker_delay_ms;
            tokio::spawn(run_worker(queue, source, tx, delay_ms));
        }

        rx
    }

    /// Turn one successful batch into store writes: player metadata,
    /// snapshot and today's delta row per record, in a single transaction.
    fn apply_records(&self, records: Vec<VersusStats>, today: NaiveDate) -> Result<usize> {
        let captured_at = Local::now().naive_local();
        let mut updates = Vec::with_capacity(records.len());

        for record in records {
            let basis = self.repo.delta_basis(&record.pid, today)?;
            let row = delta::compute_daily_delta(
                &record.pid,
                today,
                record.cumulative(),
                basis,
                self.settings.inflate_zero_play_wins,
            );
            updates.push(PlayerUpdate { record, delta: row });
        }

        self.repo.apply_batch(&updates, captured_at)?;
        Ok(updates.len())
    }
}

async fn run_worker(
    queue: Arc<Mutex<VecDeque<Batch>>>,
    source: Arc<dyn StatsSource>,
    tx: mpsc::Sender<BatchOutcome>,
    delay_ms: u64,
) {
    let cooldown = WorkerCooldown::new(delay_ms);

    while let Some(batch) = next_batch(&queue) {
        let result = source.fetch_batch(&batch.pids).await;
        let outcome = BatchOutcome {
            number: batch.number,
            size: batch.pids.len(),
            result,
        };

        // A closed channel means the aggregator aborted the cycle.
        if tx.send(outcome).await.is_err() {
            break;
        }

        cooldown.wait().await;
    }
}

fn next_batch(queue: &Mutex<VecDeque<Batch>>) -> Option<Batch> {
    queue.lock().ok()?.pop_front()
}

fn partition_batches(pids: Vec<String>, batch_size: usize) -> Vec<Batch> {
    pids.chunks(batch_size.max(1))
        .enumerate()
        .map(|(idx, chunk)| Batch {
            number: idx + 1,
            pids: chunk.to_vec(),
        })
        .collect()
}

fn log_summary(summary: &SyncSummary) {
    let rate = if summary.total > 0 {
        summary.succeeded as f64 * 100.0 / summary.total as f64
    } else {
        0.0
    };
    info!(
        "Sync cycle finished: {} processed, {} succeeded, {} failed ({:.1}% success) in {:.2}s",
        summary.total,
        summary.succeeded,
        summary.failed,
        rate,
        summary.elapsed.as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{:03}", i)).collect()
    }

    #[test]
    fn partitions_preserve_order_and_number_from_one() {
        let batches = partition_batches(pids(125), 50);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].number, 1);
        assert_eq!(batches[0].pids.len(), 50);
        assert_eq!(batches[2].number, 3);
        assert_eq!(batches[2].pids.len(), 25);
        assert_eq!(batches[0].pids[0], "P000");
        assert_eq!(batches[2].pids[24], "P124");
    }

    #[test]
    fn single_short_batch_keeps_everything() {
        let batches = partition_batches(pids(3), 50);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].pids.len(), 3);
    }
}
