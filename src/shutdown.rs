use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// 优雅关闭协调器
///
/// 进程内所有长驻组件订阅同一个广播通道, 触发一次即全体退出。
/// 重复触发是无操作。
pub struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    triggered: Arc<RwLock<bool>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            triggered: Arc::new(RwLock::new(false)),
        }
    }

    /// 订阅关闭信号
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// 触发关闭, 广播给所有订阅者
    pub async fn shutdown(&self) {
        let mut triggered = self.triggered.write().await;
        if *triggered {
            debug!("关闭信号已经触发过, 忽略");
            return;
        }
        *triggered = true;

        let subscriber_count = self.shutdown_tx.receiver_count();
        info!(subscriber_count, "发送关闭信号");
        // 没有订阅者时send返回Err, 这里不关心
        let _ = self.shutdown_tx.send(());
    }

    pub async fn is_shutdown(&self) -> bool {
        *self.triggered.read().await
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ShutdownManager {
    fn clone(&self) -> Self {
        Self {
            shutdown_tx: self.shutdown_tx.clone(),
            triggered: Arc::clone(&self.triggered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_shutdown_broadcasts_to_subscriber() {
        let manager = ShutdownManager::new();
        assert!(!manager.is_shutdown().await);

        let mut rx = manager.subscribe();
        manager.shutdown().await;

        let result = timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(result.is_ok());
        assert!(manager.is_shutdown().await);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_notified() {
        let manager = ShutdownManager::new();
        let mut rx1 = manager.subscribe();
        let mut rx2 = manager.subscribe();
        let mut rx3 = manager.subscribe();

        manager.shutdown().await;

        assert!(timeout(Duration::from_millis(100), rx1.recv()).await.is_ok());
        assert!(timeout(Duration::from_millis(100), rx2.recv()).await.is_ok());
        assert!(timeout(Duration::from_millis(100), rx3.recv()).await.is_ok());
    }

    #[tokio::test]
    async fn test_double_shutdown_is_noop() {
        let manager = ShutdownManager::new();
        let mut rx = manager.subscribe();

        manager.shutdown().await;
        manager.shutdown().await;

        // 第二次触发不再发送, 接收端只有一条信号
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_ok());
        let second = timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let manager = ShutdownManager::new();
        let cloned = manager.clone();

        let mut rx = cloned.subscribe();
        manager.shutdown().await;

        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_ok());
        assert!(cloned.is_shutdown().await);
    }
}
