use serde::{Deserialize, Serialize};

use super::validation::{require_not_empty, require_positive, ConfigValidator};
use crate::errors::{DispatchError, DispatchResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:lineup.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_seconds: 30,
            idle_timeout_seconds: 600,
        }
    }
}

impl ConfigValidator for DatabaseConfig {
    fn validate(&self) -> DispatchResult<()> {
        require_not_empty(&self.url, "database.url")?;
        require_positive(self.max_connections as i64, "database.max_connections")?;
        if self.min_connections > self.max_connections {
            return Err(DispatchError::Configuration(
                "database.min_connections 不能大于 max_connections".to_string(),
            ));
        }
        Ok(())
    }
}

/// 派发引擎后台服务配置: 提醒与预约核验两个周期性扫描共用同一节拍
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    pub enabled: bool,
    pub sweep_interval_seconds: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_seconds: 300,
        }
    }
}

impl ConfigValidator for DispatcherConfig {
    fn validate(&self) -> DispatchResult<()> {
        require_positive(
            self.sweep_interval_seconds as i64,
            "dispatcher.sweep_interval_seconds",
        )
    }
}

/// 轮转排序配置
///
/// order_gap 是插队/排队时在现有排序键两侧留出的间隔,
/// 留白让单点的手工换位无需对整个团队重新编号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    pub order_gap: i64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self { order_gap: 1000 }
    }
}

impl ConfigValidator for RotationConfig {
    fn validate(&self) -> DispatchResult<()> {
        require_positive(self.order_gap, "rotation.order_gap")
    }
}

/// 预约提醒扫描配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    pub batch_size: i64,
    pub lead_minutes: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            lead_minutes: 30,
        }
    }
}

impl ConfigValidator for ReminderConfig {
    fn validate(&self) -> DispatchResult<()> {
        require_positive(self.batch_size, "reminder.batch_size")?;
        require_positive(self.lead_minutes, "reminder.lead_minutes")
    }
}

/// 预约核验超时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub cancel_unverified_after_minutes: i64,
    pub expire_verified_after_minutes: i64,
    pub early_claim_window_minutes: i64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            cancel_unverified_after_minutes: 10,
            expire_verified_after_minutes: 15,
            early_claim_window_minutes: 45,
        }
    }
}

impl ConfigValidator for VerificationConfig {
    fn validate(&self) -> DispatchResult<()> {
        require_positive(
            self.cancel_unverified_after_minutes,
            "verification.cancel_unverified_after_minutes",
        )?;
        require_positive(
            self.expire_verified_after_minutes,
            "verification.expire_verified_after_minutes",
        )?;
        require_positive(
            self.early_claim_window_minutes,
            "verification.early_claim_window_minutes",
        )
    }
}

/// 推送通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub push_url: String,
    pub api_key: String,
    pub send_timeout_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            push_url: "https://fcm.googleapis.com/fcm/send".to_string(),
            api_key: String::new(),
            send_timeout_seconds: 10,
        }
    }
}

impl ConfigValidator for NotifierConfig {
    fn validate(&self) -> DispatchResult<()> {
        require_not_empty(&self.push_url, "notifier.push_url")?;
        require_positive(
            self.send_timeout_seconds as i64,
            "notifier.send_timeout_seconds",
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub cors_enabled: bool,
    pub cors_origins: Vec<String>,
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            request_timeout_seconds: 30,
        }
    }
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> DispatchResult<()> {
        require_not_empty(&self.bind_address, "api.bind_address")?;
        if !self.bind_address.contains(':') {
            return Err(DispatchError::Configuration(format!(
                "api.bind_address 缺少端口: {}",
                self.bind_address
            )));
        }
        require_positive(
            self.request_timeout_seconds as i64,
            "api.request_timeout_seconds",
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
    pub metrics_endpoint: String,
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_endpoint: "/metrics".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ConfigValidator for ObservabilityConfig {
    fn validate(&self) -> DispatchResult<()> {
        require_not_empty(&self.metrics_endpoint, "observability.metrics_endpoint")?;
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(DispatchError::Configuration(format!(
                "observability.log_level 非法: {}",
                self.log_level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_validation() {
        let config = DatabaseConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.url = "".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.min_connections = 20;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_rotation_config_defaults() {
        let config = RotationConfig::default();
        assert_eq!(config.order_gap, 1000);
        assert!(config.validate().is_ok());

        let invalid = RotationConfig { order_gap: 0 };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_verification_config_defaults() {
        let config = VerificationConfig::default();
        assert_eq!(config.cancel_unverified_after_minutes, 10);
        assert_eq!(config.expire_verified_after_minutes, 15);
        assert_eq!(config.early_claim_window_minutes, 45);
    }

    #[test]
    fn test_api_config_rejects_address_without_port() {
        let mut config = ApiConfig::default();
        config.bind_address = "0.0.0.0".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = ObservabilityConfig::default();
        assert!(config.validate().is_ok());
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}
