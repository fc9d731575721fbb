pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod http;
pub mod rate_limiter;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

use crate::api::StatsClient;
use crate::cli::Command;
use crate::config::settings::{database_path, AppConfig};
use crate::database::StatsRepository;
use crate::services::import::ImportService;
use crate::services::server::ServerService;
use crate::services::sync::SyncService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_sync() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let repo = Arc::new(StatsRepository::open(&database_path())?);
        let client = StatsClient::new(&config.api)?;
        let service = SyncService::new(repo, Arc::new(client), config.sync.clone());

        // A low success rate is reported, not escalated; only a structural
        // failure aborts with an error.
        service.run_cycle().await.map(|_| ())
    })
}

pub fn handle_import(dir: &str) -> Result<()> {
    let repo = Arc::new(StatsRepository::open(&database_path())?);
    let service = ImportService::new(repo);
    service.run(Path::new(dir)).map(|_| ())
}

pub fn handle_show(player: &str) -> Result<()> {
    let repo = StatsRepository::open(&database_path())?;

    let found = match repo.find_player(player)? {
        Some(p) => Some(p),
        None => repo.search_players(player)?.into_iter().next(),
    };

    let Some(found) = found else {
        println!("No player matching '{}'", player);
        return Ok(());
    };

    println!(
        "{} ({})",
        found.name.as_deref().unwrap_or(&found.pid),
        found.pid
    );

    match repo.latest_snapshot(&found.pid)? {
        Some(snapshot) => println!(
            "  rating {}  wins {}  plays {}  captured {}",
            snapshot.rating, snapshot.wins_total, snapshot.plays_total, snapshot.captured_at
        ),
        None => println!("  no snapshot yet"),
    }

    let deltas = repo.delta_history(&found.pid, None, None, Some(10))?;
    if deltas.is_empty() {
        println!("  no daily stats yet");
        return Ok(());
    }

    println!("  date        wins plays  rate  change");
    for delta in deltas {
        println!(
            "  {}  {:4} {:5} {:5} {:+7}",
            delta.stat_date, delta.wins, delta.plays, delta.rating, delta.rating_change
        );
    }

    Ok(())
}
