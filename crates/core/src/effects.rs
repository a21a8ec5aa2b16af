use std::future::Future;

use tracing::warn;

use crate::errors::DispatchResult;

/// 尽力而为副作用执行辅助
///
/// 通知推送等非关键副作用统一经由这里执行: 失败记录日志后丢弃,
/// 不会向触发它的业务事务传播
pub async fn best_effort<T, F>(operation: &str, fut: F) -> Option<T>
where
    F: Future<Output = DispatchResult<T>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation = operation, error = %e, "尽力而为操作失败, 已忽略");
            None
        }
    }
}

/// 在后台任务中执行尽力而为副作用, 不阻塞调用方响应
pub fn spawn_best_effort<F>(operation: &'static str, fut: F)
where
    F: Future<Output = DispatchResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        best_effort(operation, fut).await;
    });
}
