mod app_config;
mod components;
mod validation;

pub use app_config::AppConfig;
pub use components::{
    ApiConfig, DatabaseConfig, DispatcherConfig, NotifierConfig, ObservabilityConfig,
    ReminderConfig, RotationConfig, VerificationConfig,
};
pub use validation::ConfigValidator;
