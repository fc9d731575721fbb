use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "versus stats tracking backend")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the backend server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Run one full stats synchronization cycle against the remote API
    Sync,
    /// Bulk-load legacy per-player CSV exports into the database
    Import {
        /// Directory containing <pid>.csv files
        #[arg(short, long, default_value = "data")]
        dir: String,
    },
    /// Print a player's latest snapshot and recent daily stats
    Show {
        /// Player id, or a name/code fragment to search for
        player: String,
    },
}
