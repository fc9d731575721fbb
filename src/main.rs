use anyhow::Result;

use maker_versus_stats::cli::Command;
use maker_versus_stats::{handle_import, handle_serve, handle_show, handle_sync, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port } => handle_serve(*port),
        Command::Sync => handle_sync(),
        Command::Import { dir } => handle_import(dir),
        Command::Show { player } => handle_show(player),
    }
}
