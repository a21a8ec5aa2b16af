pub mod manager;
pub mod mapping;
pub mod migrations;
pub mod postgres;
pub mod sqlite;

pub use manager::{DatabaseManager, DatabasePool, DatabaseType};
