use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lineup_core::AppConfig;

use crate::app::AppMode;

/// 初始化日志系统
///
/// RUST_LOG存在时优先于命令行的log-level
pub fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 解析运行模式, 并校验配置没有禁用该模式
pub fn parse_app_mode(mode_str: &str, config: &AppConfig) -> Result<AppMode> {
    match mode_str {
        "engine" => {
            if !config.dispatcher.enabled {
                return Err(anyhow::anyhow!("引擎模式被禁用, 请检查配置"));
            }
            Ok(AppMode::Engine)
        }
        "api" => {
            if !config.api.enabled {
                return Err(anyhow::anyhow!("API模式被禁用, 请检查配置"));
            }
            Ok(AppMode::Api)
        }
        "all" => Ok(AppMode::All),
        _ => Err(anyhow::anyhow!("不支持的运行模式: {mode_str}")),
    }
}

/// 等待进程级关闭信号 (Ctrl+C 或 SIGTERM)
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("安装Ctrl+C信号处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("安装SIGTERM信号处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_mode_accepts_known_modes() {
        let config = AppConfig::default();
        assert!(matches!(
            parse_app_mode("engine", &config),
            Ok(AppMode::Engine)
        ));
        assert!(matches!(parse_app_mode("api", &config), Ok(AppMode::Api)));
        assert!(matches!(parse_app_mode("all", &config), Ok(AppMode::All)));
    }

    #[test]
    fn test_parse_app_mode_rejects_unknown_mode() {
        let config = AppConfig::default();
        assert!(parse_app_mode("worker", &config).is_err());
    }

    #[test]
    fn test_parse_app_mode_respects_disabled_components() {
        let mut config = AppConfig::default();
        config.dispatcher.enabled = false;
        assert!(parse_app_mode("engine", &config).is_err());

        let mut config = AppConfig::default();
        config.api.enabled = false;
        assert!(parse_app_mode("api", &config).is_err());
        // all 模式不做校验, 运行时按开关决定启动哪些组件
        assert!(parse_app_mode("all", &config).is_ok());
    }
}
