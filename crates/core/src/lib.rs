pub mod config;
pub mod effects;
pub mod errors;

pub use config::{AppConfig, ConfigValidator};
pub use errors::{DispatchError, DispatchResult};
