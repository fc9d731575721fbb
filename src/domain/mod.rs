pub mod delta;
pub mod models;

pub use models::*;
