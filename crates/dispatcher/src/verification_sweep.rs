use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use metrics::counter;
use tracing::{debug, error, info, warn};

use lineup_core::config::VerificationConfig;
use lineup_core::effects::best_effort;
use lineup_core::DispatchResult;
use lineup_domain::{
    ActivityKind, ActivityRecord, ActivityRepository, Lead, LeadRepository, LeadStatus,
};

use crate::assignment::AssignmentService;
use crate::selector::DispatchSelector;

/// 一轮核验扫描的结果
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub canceled: usize,
    pub expired: usize,
    pub promoted: usize,
}

/// 预约核验规则服务
///
/// 对预约入口状态的线索应用超时规则:
/// - 未核验且超过预约时间10分钟 → 强制取消
/// - 已核验、超过预约时间15分钟仍未被处理 → 强制过期
/// - 已核验且进入预约前45分钟窗口 → 提前转待派发, 未指派的顺带走一次派发
///
/// 周期扫描全量执行; 处置反应器在事件间隙对所属团队补跑同一套规则
pub struct VerificationService {
    lead_repo: Arc<dyn LeadRepository>,
    activity_repo: Arc<dyn ActivityRepository>,
    selector: Arc<DispatchSelector>,
    assignment: Arc<AssignmentService>,
    config: VerificationConfig,
}

impl VerificationService {
    pub fn new(
        lead_repo: Arc<dyn LeadRepository>,
        activity_repo: Arc<dyn ActivityRepository>,
        selector: Arc<DispatchSelector>,
        assignment: Arc<AssignmentService>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            lead_repo,
            activity_repo,
            selector,
            assignment,
            config,
        }
    }

    /// 全量扫描所有待核验预约
    pub async fn sweep_all(&self) -> DispatchResult<VerificationReport> {
        let leads = self.lead_repo.list_pending_appointments().await?;
        self.apply_rules(leads).await
    }

    /// 只处理一个团队, 供处置事件后的即时补跑
    pub async fn sweep_team(&self, team_id: &str) -> DispatchResult<VerificationReport> {
        let leads = self
            .lead_repo
            .list_pending_appointments()
            .await?
            .into_iter()
            .filter(|lead| lead.team_id == team_id)
            .collect();
        self.apply_rules(leads).await
    }

    async fn apply_rules(&self, leads: Vec<Lead>) -> DispatchResult<VerificationReport> {
        let now = Utc::now();
        let mut report = VerificationReport::default();

        for mut lead in leads {
            let Some(appointment) = lead.scheduled_time else {
                continue;
            };
            if !lead.status.is_appointment_entry() {
                continue;
            }

            if !lead.setter_verified {
                let cancel_at = appointment
                    + ChronoDuration::minutes(self.config.cancel_unverified_after_minutes);
                if now >= cancel_at {
                    self.force_transition(&mut lead, LeadStatus::Canceled, "未核验预约超时取消")
                        .await?;
                    report.canceled += 1;
                }
                continue;
            }

            let expire_at =
                appointment + ChronoDuration::minutes(self.config.expire_verified_after_minutes);
            if now >= expire_at {
                self.force_transition(&mut lead, LeadStatus::Expired, "已核验预约超时未处理")
                    .await?;
                report.expired += 1;
                continue;
            }

            let claim_window =
                appointment - ChronoDuration::minutes(self.config.early_claim_window_minutes);
            if now >= claim_window {
                self.promote(&mut lead).await?;
                report.promoted += 1;
            }
        }

        if report.canceled + report.expired + report.promoted > 0 {
            info!(
                canceled = report.canceled,
                expired = report.expired,
                promoted = report.promoted,
                "核验扫描完成"
            );
        }
        Ok(report)
    }

    async fn force_transition(
        &self,
        lead: &mut Lead,
        to: LeadStatus,
        reason: &str,
    ) -> DispatchResult<()> {
        warn!(
            lead_id = %lead.id,
            from = lead.status.as_str(),
            to = to.as_str(),
            reason,
            "预约核验超时, 强制流转"
        );
        lead.status = to;
        lead.updated_at = Utc::now();
        self.lead_repo.update(lead).await?;
        counter!("lineup_verification_timeouts_total", "outcome" => to.as_str()).increment(1);

        let record = ActivityRecord::new(ActivityKind::VerificationTimeout, &lead.team_id, reason)
            .with_lead(&lead.id);
        best_effort("verification_activity", self.activity_repo.append(&record)).await;
        Ok(())
    }

    /// 进入窗口的已核验预约提前转待派发, 让正常派发提前认领
    async fn promote(&self, lead: &mut Lead) -> DispatchResult<()> {
        debug!(lead_id = %lead.id, "已核验预约进入认领窗口, 提前转待派发");
        lead.status = LeadStatus::WaitingAssignment;
        lead.updated_at = Utc::now();
        self.lead_repo.update(lead).await?;

        if lead.assigned_closer_id.is_none() {
            match self.selector.select_next(&lead.team_id).await? {
                Some(closer) => {
                    *lead = self.assignment.assign(lead.clone(), &closer).await?;
                }
                None => {
                    let record = ActivityRecord::new(
                        ActivityKind::DispatchEscalated,
                        &lead.team_id,
                        "预约进入窗口但无可用closer",
                    )
                    .with_lead(&lead.id);
                    best_effort("escalation_activity", self.activity_repo.append(&record)).await;
                }
            }
        }
        Ok(())
    }
}

/// 核验扫描的周期循环
///
/// start后由tokio定时器驱动, 订阅进程级关闭广播即时退出
pub struct VerificationSweepService {
    service: Arc<VerificationService>,
    interval: Duration,
    running: Arc<tokio::sync::RwLock<bool>>,
}

impl VerificationSweepService {
    pub fn new(service: Arc<VerificationService>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            running: Arc::new(tokio::sync::RwLock::new(false)),
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("核验扫描停止信号已发送");
    }

    pub async fn run(&self, mut shutdown_rx: tokio::sync::broadcast::Receiver<()>) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }
        info!(interval_seconds = self.interval.as_secs(), "核验扫描启动");

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.is_running().await {
                        break;
                    }
                    if let Err(e) = self.service.sweep_all().await {
                        error!(error = %e, "核验扫描执行失败");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("收到关闭信号, 核验扫描退出");
                    break;
                }
            }
        }

        let mut running = self.running.write().await;
        *running = false;
    }
}
