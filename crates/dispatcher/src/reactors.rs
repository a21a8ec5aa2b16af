use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lineup_core::config::ReminderConfig;
use lineup_core::effects::{best_effort, spawn_best_effort};
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::state::{is_valid_transition, pre_disposition_hop};
use lineup_domain::{
    ActivityKind, ActivityRecord, ActivityRepository, Caller, CallerRole, Closer, CloserRepository,
    DeviceTokenRepository, DutyStatus, Lead, LeadDraft, LeadRepository, LeadStatus, PushPayload,
    Reminder, ReminderRepository, TeamLeadStats,
};

use crate::assignment::AssignmentService;
use crate::fanout::NotificationFanout;
use crate::rotation_service::RotationService;
use crate::selector::DispatchSelector;
use crate::verification_sweep::VerificationService;

/// 一次派发尝试的结果
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub lead: Lead,
    pub assigned_closer: Option<Closer>,
    /// 无人可接单, 已记录升级事件等人工介入
    pub escalated: bool,
}

/// 接单结果
#[derive(Debug, Clone, Serialize)]
pub struct AcceptOutcome {
    pub lead: Lead,
    /// 重复接单按幂等处理, 不报错
    pub already_accepted: bool,
}

/// 排班状态变更结果
#[derive(Debug, Clone, Serialize)]
pub struct DutyChangeOutcome {
    pub closer: Closer,
    /// 下线时被回收重派的线索数
    pub reassigned_leads: usize,
}

/// 轮转视图里的一个名次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupSlot {
    pub closer_id: String,
    pub closer_name: String,
    pub lineup_order: Option<i64>,
    pub live_count: i64,
}

/// 团队统计视图
#[derive(Debug, Clone, Serialize)]
pub struct TeamStats {
    pub leads: TeamLeadStats,
    pub lineup: Vec<LineupSlot>,
}

/// 业务事件反应器
///
/// 引擎的写入口: 每个方法对应一个外部事件 (建线索/核验/指派/接单/
/// 处置/改约/排班), 校验权限与状态流转, 串起选择器、指派、轮转与
/// 通知。核心落库失败上抛; 审计与推送一律尽力而为。
pub struct EventReactors {
    lead_repo: Arc<dyn LeadRepository>,
    closer_repo: Arc<dyn CloserRepository>,
    activity_repo: Arc<dyn ActivityRepository>,
    reminder_repo: Arc<dyn ReminderRepository>,
    token_repo: Arc<dyn DeviceTokenRepository>,
    selector: Arc<DispatchSelector>,
    assignment: Arc<AssignmentService>,
    rotation: Arc<RotationService>,
    verification: Arc<VerificationService>,
    fanout: Arc<NotificationFanout>,
    reminder_config: ReminderConfig,
}

impl EventReactors {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lead_repo: Arc<dyn LeadRepository>,
        closer_repo: Arc<dyn CloserRepository>,
        activity_repo: Arc<dyn ActivityRepository>,
        reminder_repo: Arc<dyn ReminderRepository>,
        token_repo: Arc<dyn DeviceTokenRepository>,
        selector: Arc<DispatchSelector>,
        assignment: Arc<AssignmentService>,
        rotation: Arc<RotationService>,
        verification: Arc<VerificationService>,
        fanout: Arc<NotificationFanout>,
        reminder_config: ReminderConfig,
    ) -> Self {
        Self {
            lead_repo,
            closer_repo,
            activity_repo,
            reminder_repo,
            token_repo,
            selector,
            assignment,
            rotation,
            verification,
            fanout,
            reminder_config,
        }
    }

    /// 创建线索; 只有待派发的即时线索当场走轮转
    ///
    /// 预约线索创建时不绑定closer, 等核验后由临近窗口提升、
    /// 人工指派或自主认领接手。即时线索无人可接单时记录升级事件,
    /// 留在无指派状态等人工处理。
    pub async fn create_lead(
        &self,
        caller: &Caller,
        mut draft: LeadDraft,
    ) -> DispatchResult<DispatchOutcome> {
        if draft.setter_id.is_none() {
            draft.setter_id = Some(caller.user_id.clone());
        }
        if draft.team_id.is_none() {
            draft.team_id = caller.team_id.clone();
        }

        let lead = Lead::from_draft(draft)?;
        let lead = self.lead_repo.create(&lead).await?;
        info!(
            lead_id = %lead.id,
            team_id = %lead.team_id,
            dispatch_type = lead.dispatch_type.as_str(),
            status = lead.status.as_str(),
            "线索已创建"
        );
        counter!("lineup_leads_created_total").increment(1);

        let outcome = if lead.status == LeadStatus::WaitingAssignment
            && lead.assigned_closer_id.is_none()
        {
            self.dispatch_lead(lead).await?
        } else {
            DispatchOutcome {
                lead,
                assigned_closer: None,
                escalated: false,
            }
        };
        self.sync_reminder(&outcome.lead).await;
        Ok(outcome)
    }

    /// 对无指派线索走一轮选择+指派; 无人可用记升级事件
    async fn dispatch_lead(&self, lead: Lead) -> DispatchResult<DispatchOutcome> {
        match self.selector.select_next(&lead.team_id).await? {
            Some(closer) => {
                let lead = self.assignment.assign(lead, &closer).await?;
                Ok(DispatchOutcome {
                    lead,
                    assigned_closer: Some(closer),
                    escalated: false,
                })
            }
            None => {
                warn!(
                    lead_id = %lead.id,
                    team_id = %lead.team_id,
                    "团队无可接单closer, 线索待人工介入"
                );
                let record = ActivityRecord::new(
                    ActivityKind::DispatchEscalated,
                    &lead.team_id,
                    "无可接单closer, 派发升级",
                )
                .with_lead(&lead.id);
                best_effort("escalation_activity", self.activity_repo.append(&record)).await;
                Ok(DispatchOutcome {
                    lead,
                    assigned_closer: None,
                    escalated: true,
                })
            }
        }
    }

    /// 核验预约线索; 重复核验幂等
    pub async fn verify_lead(&self, caller: &Caller, lead_id: &str) -> DispatchResult<Lead> {
        if !caller.can_verify() {
            return Err(DispatchError::permission("该角色无权核验线索"));
        }

        let mut lead = self.load_lead(lead_id).await?;
        if lead.setter_verified {
            return Ok(lead);
        }
        if !lead.status.is_appointment_entry() {
            return Err(DispatchError::precondition(format!(
                "只有预约状态的线索可核验, 当前: {}",
                lead.status.as_str()
            )));
        }

        lead.mark_verified(&caller.user_id);
        self.lead_repo.update(&lead).await?;
        info!(lead_id = %lead.id, verified_by = %caller.user_id, "线索已核验");
        counter!("lineup_leads_verified_total").increment(1);

        let record = ActivityRecord::new(ActivityKind::LeadVerified, &lead.team_id, "预约已核验")
            .with_lead(&lead.id);
        best_effort("verify_activity", self.activity_repo.append(&record)).await;

        // 核验后线索开始占名额, 提醒closer工作量变化
        if let Some(closer_id) = lead.assigned_closer_id.clone() {
            let fanout = Arc::clone(&self.fanout);
            let payload = PushPayload::new(
                "预约已核验",
                format!("客户 {} 的预约通过核验", lead.customer_name),
            )
            .with_data(serde_json::json!({ "lead_id": lead.id }));
            spawn_best_effort("verify_notification", async move {
                fanout.notify(&[closer_id], &payload).await
            });
        }

        Ok(lead)
    }

    /// 管理人员手工指派/改派
    ///
    /// 未核验的预约线索不可手工指派 (先核验)。已有指派时记一条改派。
    pub async fn manual_assign(
        &self,
        caller: &Caller,
        lead_id: &str,
        closer_id: &str,
    ) -> DispatchResult<Lead> {
        if !caller.is_supervisor() {
            return Err(DispatchError::permission("只有管理人员可手工指派"));
        }

        let lead = self.load_lead(lead_id).await?;
        if lead.status.is_terminal() {
            return Err(DispatchError::precondition("已归档的线索不可指派"));
        }
        if lead.status.is_appointment_entry() && !lead.setter_verified {
            return Err(DispatchError::precondition("未核验的预约线索不可手工指派"));
        }

        let closer = self.load_closer(closer_id).await?;
        let previous = lead.assigned_closer_id.clone();
        let lead = self.assignment.assign(lead, &closer).await?;

        if let Some(previous_id) = previous.filter(|p| p != closer_id) {
            let record = ActivityRecord::new(
                ActivityKind::LeadReassigned,
                &lead.team_id,
                format!("由 {previous_id} 改派给 {}", closer.name),
            )
            .with_lead(&lead.id)
            .with_closer(&closer.id);
            best_effort("reassign_activity", self.activity_repo.append(&record)).await;
        }

        self.sync_reminder(&lead).await;
        Ok(lead)
    }

    /// 被指派的closer接单; 重复接单幂等
    pub async fn accept_job(&self, caller: &Caller, lead_id: &str) -> DispatchResult<AcceptOutcome> {
        let mut lead = self.load_lead(lead_id).await?;

        if lead.assigned_closer_id.as_deref() != Some(caller.user_id.as_str()) {
            return Err(DispatchError::permission("只有被指派的closer可接单"));
        }
        if lead.status == LeadStatus::Accepted {
            return Ok(AcceptOutcome {
                lead,
                already_accepted: true,
            });
        }
        if !lead.is_claimable() {
            return Err(DispatchError::precondition(format!(
                "当前状态不可接单: {}",
                lead.status.as_str()
            )));
        }
        self.require_transition(lead.status, LeadStatus::Accepted)?;

        lead.status = LeadStatus::Accepted;
        lead.accepted_at = Some(Utc::now());
        lead.updated_at = Utc::now();
        self.lead_repo.update(&lead).await?;
        info!(lead_id = %lead.id, closer_id = %caller.user_id, "线索已接单");
        counter!("lineup_leads_accepted_total").increment(1);

        let record = ActivityRecord::new(ActivityKind::LeadAccepted, &lead.team_id, "closer已接单")
            .with_lead(&lead.id)
            .with_closer(&caller.user_id);
        best_effort("accept_activity", self.activity_repo.append(&record)).await;

        Ok(AcceptOutcome {
            lead,
            already_accepted: false,
        })
    }

    /// 在班closer越过轮转自主认领无指派的线索
    ///
    /// 认领直接进入已接单, 不再走指派+接单两步
    pub async fn self_assign(&self, caller: &Caller, lead_id: &str) -> DispatchResult<Lead> {
        if caller.role != CallerRole::Closer {
            return Err(DispatchError::permission("只有closer可自主认领"));
        }
        let closer = self.load_closer(&caller.user_id).await?;
        if closer.status != DutyStatus::OnDuty {
            return Err(DispatchError::precondition("下班状态不可认领线索"));
        }

        let mut lead = self.load_lead(lead_id).await?;
        if lead.assigned_closer_id.is_some() {
            return Err(DispatchError::precondition("线索已有指派, 不可认领"));
        }
        if !lead.is_claimable() {
            return Err(DispatchError::precondition(format!(
                "当前状态不可认领: {}",
                lead.status.as_str()
            )));
        }

        lead.bind_closer(&closer.id, &closer.name);
        lead.status = LeadStatus::Accepted;
        lead.accepted_at = Some(Utc::now());
        self.lead_repo.update(&lead).await?;
        info!(lead_id = %lead.id, closer_id = %closer.id, "线索被自主认领");
        counter!("lineup_leads_self_assigned_total").increment(1);

        let record = ActivityRecord::new(ActivityKind::LeadAccepted, &lead.team_id, "自主认领")
            .with_lead(&lead.id)
            .with_closer(&closer.id);
        best_effort("self_assign_activity", self.activity_repo.append(&record)).await;

        self.sync_reminder(&lead).await;
        Ok(lead)
    }

    /// 记录处置结果并驱动轮转
    ///
    /// 非处理中状态先补一跳到处理中再落终态; 重复记录同一处置幂等。
    /// 改约结果让线索回到预约管道: 解除指派、核验作废, 等重新核验。
    pub async fn record_disposition(
        &self,
        caller: &Caller,
        lead_id: &str,
        disposition: LeadStatus,
    ) -> DispatchResult<Lead> {
        if !disposition.is_disposition() {
            return Err(DispatchError::precondition(format!(
                "不是合法的处置结果: {}",
                disposition.as_str()
            )));
        }

        let mut lead = self.load_lead(lead_id).await?;
        if lead.status == disposition {
            return Ok(lead);
        }
        if lead.status.is_terminal() {
            return Err(DispatchError::InvalidTransition {
                from: lead.status.as_str().to_string(),
                to: disposition.as_str().to_string(),
            });
        }
        let is_assignee = lead.assigned_closer_id.as_deref() == Some(caller.user_id.as_str());
        if !is_assignee && !caller.is_supervisor() {
            return Err(DispatchError::permission(
                "只有被指派的closer或管理人员可记录处置",
            ));
        }

        if let Some(hop) = pre_disposition_hop(lead.status) {
            self.require_transition(lead.status, hop)?;
            lead.status = hop;
        }
        self.require_transition(lead.status, disposition)?;

        // 轮转要用处置前的指派关系, 先算后写
        let rotation_lead = lead.clone();

        lead.status = disposition;
        lead.updated_at = Utc::now();
        if disposition == LeadStatus::Rescheduled {
            lead.clear_assignment();
            lead.setter_verified = false;
            lead.verified_by = None;
            lead.verified_at = None;
        }
        self.lead_repo.update(&lead).await?;
        info!(
            lead_id = %lead.id,
            disposition = disposition.as_str(),
            by = %caller.user_id,
            "处置结果已记录"
        );
        counter!("lineup_dispositions_total", "disposition" => disposition.as_str()).increment(1);

        let record = ActivityRecord::new(
            ActivityKind::LeadDispositioned,
            &lead.team_id,
            format!("处置结果: {}", disposition.as_str()),
        )
        .with_lead(&lead.id);
        best_effort("disposition_activity", self.activity_repo.append(&record)).await;

        // 轮转写失败不回滚处置, 但要留下带上下文的补位记录
        if let Err(e) = self
            .rotation
            .apply_disposition(&rotation_lead, disposition)
            .await
        {
            warn!(
                lead_id = %lead.id,
                closer_id = ?rotation_lead.assigned_closer_id,
                disposition = disposition.as_str(),
                error = %e,
                "处置后轮转移动失败, 待手工补位"
            );
            let mut record = ActivityRecord::new(
                ActivityKind::RotationMoveFailed,
                &lead.team_id,
                format!("处置 {} 后轮转移动失败: {e}", disposition.as_str()),
            )
            .with_lead(&lead.id);
            if let Some(closer_id) = rotation_lead.assigned_closer_id.as_deref() {
                record = record.with_closer(closer_id);
            }
            best_effort("rotation_failure_activity", self.activity_repo.append(&record)).await;
        }

        // setter是线索来源, 结果同步给他们
        let fanout = Arc::clone(&self.fanout);
        let setter_id = lead.setter_id.clone();
        let payload = PushPayload::new(
            "线索处置结果",
            format!(
                "客户 {} 的线索结果: {}",
                lead.customer_name,
                disposition.as_str()
            ),
        )
        .with_data(serde_json::json!({ "lead_id": lead.id }));
        spawn_best_effort("disposition_notification", async move {
            fanout.notify(&[setter_id], &payload).await
        });

        // 事件间隙顺带跑一轮本团队的核验超时规则
        best_effort(
            "post_disposition_verification",
            self.verification.sweep_team(&lead.team_id),
        )
        .await;

        Ok(lead)
    }

    /// 更新预约时间, 同步覆盖提醒
    pub async fn reschedule(
        &self,
        caller: &Caller,
        lead_id: &str,
        new_time: DateTime<Utc>,
    ) -> DispatchResult<Lead> {
        let mut lead = self.load_lead(lead_id).await?;
        if !lead.status.is_appointment_entry() {
            return Err(DispatchError::precondition(format!(
                "只有预约状态的线索可改时间, 当前: {}",
                lead.status.as_str()
            )));
        }
        let is_setter = lead.setter_id == caller.user_id;
        if !is_setter && !caller.is_supervisor() {
            return Err(DispatchError::permission(
                "只有线索的setter或管理人员可改预约时间",
            ));
        }

        lead.scheduled_time = Some(new_time);
        lead.updated_at = Utc::now();
        self.lead_repo.update(&lead).await?;
        info!(lead_id = %lead.id, new_time = %new_time, "预约时间已更新");

        self.sync_reminder(&lead).await;
        Ok(lead)
    }

    /// 排班状态切换
    ///
    /// 上班: 排到轮转队尾。下班: 名下处理中/预约线索回收重派,
    /// 已接单的跟进不打断。重复切到同一状态幂等。
    pub async fn set_duty(
        &self,
        caller: &Caller,
        closer_id: &str,
        on_duty: bool,
    ) -> DispatchResult<DutyChangeOutcome> {
        if caller.user_id != closer_id && !caller.is_supervisor() {
            return Err(DispatchError::permission("只能修改自己的排班状态"));
        }

        let mut closer = self.load_closer(closer_id).await?;
        let target = if on_duty {
            DutyStatus::OnDuty
        } else {
            DutyStatus::OffDuty
        };
        if closer.status == target {
            // 重复下线仍补扫名下线索, 上次回收中断后重试可以继续推进
            let reassigned = if on_duty {
                0
            } else {
                self.reclaim_leads(&closer).await?
            };
            return Ok(DutyChangeOutcome {
                closer,
                reassigned_leads: reassigned,
            });
        }

        closer.status = target;
        closer.updated_at = Utc::now();
        self.closer_repo.update(&closer).await?;
        info!(closer_id = %closer.id, status = target.as_str(), "排班状态已切换");
        counter!("lineup_duty_changes_total", "status" => target.as_str()).increment(1);

        let record = ActivityRecord::new(
            ActivityKind::DutyChanged,
            &closer.team_id,
            format!("排班切换为 {}", target.as_str()),
        )
        .with_closer(&closer.id);
        best_effort("duty_activity", self.activity_repo.append(&record)).await;

        let reassigned = if on_duty {
            best_effort("rejoin_lineup", self.rotation.rejoin_lineup(&closer)).await;
            0
        } else {
            self.reclaim_leads(&closer).await?
        };

        Ok(DutyChangeOutcome {
            closer,
            reassigned_leads: reassigned,
        })
    }

    /// 下线回收: 处理中的线索退回待派发, 预约线索解绑, 然后各自重派
    ///
    /// 单条失败不打断整批, 扫完统一上报一个批次错误;
    /// 失败的线索仍挂在原closer名下, 重试下线时补扫收尾。
    async fn reclaim_leads(&self, closer: &Closer) -> DispatchResult<usize> {
        let leads = self.lead_repo.list_active_by_closer(&closer.id).await?;
        let total = leads.len();
        let mut reassigned = 0;
        let mut failed = 0;

        for lead in leads {
            match self.reclaim_one(lead, closer).await {
                Ok(true) => reassigned += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(closer_id = %closer.id, error = %e, "下线回收单条线索失败");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(DispatchError::database_operation(format!(
                "closer {} 下线回收部分失败: {failed}/{total} 条线索待重试",
                closer.id
            )));
        }
        Ok(reassigned)
    }

    /// 回收单条线索并重派; 返回是否派到了新closer
    async fn reclaim_one(&self, mut lead: Lead, closer: &Closer) -> DispatchResult<bool> {
        match lead.status {
            LeadStatus::InProcess => {
                lead.status = LeadStatus::WaitingAssignment;
            }
            LeadStatus::Scheduled | LeadStatus::Rescheduled => {}
            // 待派发/已接单的线索保持现状, 不随排班回收
            _ => return Ok(false),
        }
        lead.clear_assignment();
        self.lead_repo.update(&lead).await?;
        info!(
            lead_id = %lead.id,
            closer_id = %closer.id,
            status = lead.status.as_str(),
            "closer下线, 线索已回收"
        );

        let record = ActivityRecord::new(
            ActivityKind::LeadReassigned,
            &lead.team_id,
            "closer下线, 线索回收重派",
        )
        .with_lead(&lead.id)
        .with_closer(&closer.id);
        best_effort("reclaim_activity", self.activity_repo.append(&record)).await;

        let outcome = self.dispatch_lead(lead).await?;
        self.sync_reminder(&outcome.lead).await;
        Ok(outcome.assigned_closer.is_some())
    }

    /// 手工调整轮转位次
    pub async fn reorder_closer(
        &self,
        caller: &Caller,
        closer_id: &str,
        new_order: i64,
    ) -> DispatchResult<()> {
        if !caller.is_supervisor() {
            return Err(DispatchError::permission("只有管理人员可调整轮转位次"));
        }
        self.rotation.reorder(closer_id, new_order).await
    }

    /// 注册推送投递token
    pub async fn register_token(
        &self,
        caller: &Caller,
        closer_id: &str,
        token: &str,
    ) -> DispatchResult<()> {
        if caller.user_id != closer_id && !caller.is_supervisor() {
            return Err(DispatchError::permission("只能管理自己的投递token"));
        }
        if token.trim().is_empty() {
            return Err(DispatchError::precondition("token不能为空"));
        }
        self.token_repo.add(closer_id, token).await
    }

    /// 注销推送投递token
    pub async fn remove_token(
        &self,
        caller: &Caller,
        closer_id: &str,
        token: &str,
    ) -> DispatchResult<()> {
        if caller.user_id != closer_id && !caller.is_supervisor() {
            return Err(DispatchError::permission("只能管理自己的投递token"));
        }
        self.token_repo.remove(closer_id, token).await
    }

    /// 团队统计: 线索聚合 + 当前轮转全景
    pub async fn team_stats(&self, team_id: &str) -> DispatchResult<TeamStats> {
        let leads = self.lead_repo.team_stats(team_id).await?;
        let lineup = self.team_lineup(team_id).await?;
        Ok(TeamStats { leads, lineup })
    }

    /// 当前轮转视图, 选择器排序口径
    pub async fn team_lineup(&self, team_id: &str) -> DispatchResult<Vec<LineupSlot>> {
        let lineup = self.selector.team_lineup(team_id).await?;
        Ok(lineup
            .into_iter()
            .map(|candidate| LineupSlot {
                closer_id: candidate.closer.id.clone(),
                closer_name: candidate.closer.name.clone(),
                lineup_order: candidate.closer.lineup_order,
                live_count: candidate.live_count,
            })
            .collect())
    }

    /// 团队最近动态
    pub async fn team_activity(
        &self,
        team_id: &str,
        limit: i64,
    ) -> DispatchResult<Vec<ActivityRecord>> {
        self.activity_repo.list_recent_by_team(team_id, limit).await
    }

    async fn load_lead(&self, lead_id: &str) -> DispatchResult<Lead> {
        self.lead_repo
            .get_by_id(lead_id)
            .await?
            .ok_or_else(|| DispatchError::LeadNotFound {
                id: lead_id.to_string(),
            })
    }

    async fn load_closer(&self, closer_id: &str) -> DispatchResult<Closer> {
        self.closer_repo
            .get_by_id(closer_id)
            .await?
            .ok_or_else(|| DispatchError::CloserNotFound {
                id: closer_id.to_string(),
            })
    }

    fn require_transition(&self, from: LeadStatus, to: LeadStatus) -> DispatchResult<()> {
        if is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(DispatchError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    /// 带预约时间的线索覆盖式同步提醒; 提醒点已过则不动
    async fn sync_reminder(&self, lead: &Lead) {
        if !lead.status.is_appointment_entry() && lead.status != LeadStatus::Accepted {
            return;
        }
        let Some(reminder) = Reminder::for_lead(lead, self.reminder_config.lead_minutes, Utc::now())
        else {
            return;
        };
        best_effort(
            "reminder_upsert",
            self.reminder_repo.upsert_for_lead(&reminder),
        )
        .await;
    }
}
