use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use lineup_core::effects::best_effort;
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::{DeviceTokenRepository, PushPayload, PushProvider};

/// 通知扇出
///
/// 解析收件人的投递token集合, 发一次组播, 并删除投递方报告为
/// 永久失效的那些token (只删token, 从不删收件人整条记录)。
/// 对触发它的业务事务而言, 投递是尽力而为的: 失败记日志即止。
pub struct NotificationFanout {
    token_repo: Arc<dyn DeviceTokenRepository>,
    provider: Arc<dyn PushProvider>,
    /// 单次投递超时, 防止不可达的投递方拖死一批
    send_timeout: Duration,
}

impl NotificationFanout {
    pub fn new(
        token_repo: Arc<dyn DeviceTokenRepository>,
        provider: Arc<dyn PushProvider>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            token_repo,
            provider,
            send_timeout,
        }
    }

    /// 向一组收件人组播一条通知
    ///
    /// 收件人没有任何token时是记录日志的空操作, 不算错误
    pub async fn notify(
        &self,
        recipient_ids: &[String],
        payload: &PushPayload,
    ) -> DispatchResult<()> {
        let mut tokens = Vec::new();
        for recipient_id in recipient_ids {
            tokens.extend(self.token_repo.tokens_for(recipient_id).await?);
        }

        if tokens.is_empty() {
            debug!(
                recipients = recipient_ids.len(),
                title = %payload.title,
                "收件人没有注册任何投递token, 跳过推送"
            );
            return Ok(());
        }

        let report = tokio::time::timeout(
            self.send_timeout,
            self.provider.send_multicast(&tokens, payload),
        )
        .await
        .map_err(|_| DispatchError::PushDelivery("推送投递超时".to_string()))??;

        info!(
            recipients = recipient_ids.len(),
            tokens = tokens.len(),
            delivered = report.delivered,
            invalid = report.invalid_tokens.len(),
            "推送组播完成"
        );
        counter!("lineup_notifications_sent_total").increment(report.delivered as u64);

        if !report.invalid_tokens.is_empty() {
            warn!(
                count = report.invalid_tokens.len(),
                "清理投递方报告为永久失效的token"
            );
            counter!("lineup_push_tokens_pruned_total")
                .increment(report.invalid_tokens.len() as u64);
            best_effort(
                "prune_invalid_tokens",
                self.token_repo.remove_tokens(&report.invalid_tokens),
            )
            .await;
        }

        Ok(())
    }
}
