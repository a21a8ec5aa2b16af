//! 基础设施层
//!
//! 仓储trait的 PostgreSQL / SQLite 实现、HTTP推送投递、
//! 以及指标与结构化日志的初始化。业务语义都在上层,
//! 这里只做持久化与外设适配。

pub mod database;
pub mod observability;
pub mod push;

pub use database::{DatabaseManager, DatabasePool, DatabaseType};
pub use observability::{MetricsCollector, StructuredLogger};
pub use push::HttpPushProvider;
