use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::{debug, error, info, warn};

use lineup_core::config::ReminderConfig;
use lineup_core::effects::best_effort;
use lineup_core::DispatchResult;
use lineup_domain::{
    ActivityKind, ActivityRecord, ActivityRepository, LeadRepository, PushPayload,
    ReminderRepository,
};

use crate::fanout::NotificationFanout;

/// 预约提醒扫描
///
/// 每轮取到期未处理的提醒, 限量一批; 给被指派的closer推通知,
/// 然后整批置为已处理。置已处理与推送互相独立: 推送失败只记日志,
/// 不拦着置位 (避免重复投递风暴)。
pub struct ReminderSweepService {
    reminder_repo: Arc<dyn ReminderRepository>,
    lead_repo: Arc<dyn LeadRepository>,
    activity_repo: Arc<dyn ActivityRepository>,
    fanout: Arc<NotificationFanout>,
    config: ReminderConfig,
    interval: Duration,
    running: Arc<tokio::sync::RwLock<bool>>,
}

impl ReminderSweepService {
    pub fn new(
        reminder_repo: Arc<dyn ReminderRepository>,
        lead_repo: Arc<dyn LeadRepository>,
        activity_repo: Arc<dyn ActivityRepository>,
        fanout: Arc<NotificationFanout>,
        config: ReminderConfig,
        interval: Duration,
    ) -> Self {
        Self {
            reminder_repo,
            lead_repo,
            activity_repo,
            fanout,
            config,
            interval,
            running: Arc::new(tokio::sync::RwLock::new(false)),
        }
    }

    /// 执行一轮扫描, 返回本轮处理的提醒数
    pub async fn run_once(&self) -> DispatchResult<usize> {
        let now = Utc::now();
        let due = self
            .reminder_repo
            .list_due(now, self.config.batch_size)
            .await?;
        if due.is_empty() {
            return Ok(0);
        }

        info!(count = due.len(), "处理到期的预约提醒");

        for reminder in &due {
            let Some(closer_id) = reminder.closer_id.as_deref() else {
                debug!(
                    reminder_id = %reminder.id,
                    lead_id = %reminder.lead_id,
                    "提醒没有指派closer, 跳过通知"
                );
                continue;
            };

            let customer = match self.lead_repo.get_by_id(&reminder.lead_id).await {
                Ok(Some(lead)) => lead.customer_name,
                Ok(None) => {
                    warn!(lead_id = %reminder.lead_id, "提醒指向的线索不存在");
                    continue;
                }
                Err(e) => {
                    warn!(lead_id = %reminder.lead_id, error = %e, "读取提醒线索失败");
                    continue;
                }
            };

            let payload = PushPayload::new(
                "预约提醒",
                format!(
                    "客户 {customer} 的预约时间: {}",
                    reminder.appointment_time.format("%Y-%m-%d %H:%M UTC")
                ),
            )
            .with_data(serde_json::json!({ "lead_id": reminder.lead_id }));

            // 通知失败不拦截置位, 只记日志
            if best_effort(
                "reminder_notification",
                self.fanout.notify(&[closer_id.to_string()], &payload),
            )
            .await
            .is_some()
            {
                counter!("lineup_reminders_notified_total").increment(1);
            }

            if let Ok(Some(lead)) = self.lead_repo.get_by_id(&reminder.lead_id).await {
                let record =
                    ActivityRecord::new(ActivityKind::ReminderSent, &lead.team_id, "预约提醒已发送")
                        .with_lead(&reminder.lead_id)
                        .with_closer(closer_id);
                best_effort("reminder_activity", self.activity_repo.append(&record)).await;
            }
        }

        // 整批一次写入, 避免半批落库
        let ids: Vec<String> = due.iter().map(|r| r.id.clone()).collect();
        self.reminder_repo.mark_processed_batch(&ids).await?;
        counter!("lineup_reminders_processed_total").increment(ids.len() as u64);

        Ok(ids.len())
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("提醒扫描停止信号已发送");
    }

    pub async fn run(&self, mut shutdown_rx: tokio::sync::broadcast::Receiver<()>) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }
        info!(
            interval_seconds = self.interval.as_secs(),
            batch_size = self.config.batch_size,
            "提醒扫描启动"
        );

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.is_running().await {
                        break;
                    }
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "提醒扫描执行失败");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("收到关闭信号, 提醒扫描退出");
                    break;
                }
            }
        }

        let mut running = self.running.write().await;
        *running = false;
    }
}
