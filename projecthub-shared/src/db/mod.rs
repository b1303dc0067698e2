/// Database layer
///
/// - [`pool`]: SQLite pool creation, health checks, shutdown
/// - [`migrations`]: embedded schema migrations

pub mod migrations;
pub mod pool;

pub use pool::{close_pool, create_pool, health_check, DatabaseConfig};
