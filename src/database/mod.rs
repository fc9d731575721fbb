pub mod connection;
pub mod deltas;
pub mod history;
pub mod models;
pub mod players;
pub mod repository;
pub mod setup;
pub mod snapshots;

pub use connection::{create_pool, get_connection, DbConn, DbPool};
pub use models::*;
pub use repository::{PlayerUpdate, StatsRepository};
