use std::sync::Arc;

use metrics::counter;
use tracing::info;

use lineup_core::effects::{best_effort, spawn_best_effort};
use lineup_core::DispatchResult;
use lineup_domain::{
    ActivityKind, ActivityRecord, ActivityRepository, Closer, DispatchType, Lead, LeadRepository,
    LeadStatus, PushPayload,
};

use crate::fanout::NotificationFanout;

/// 指派事务
///
/// 绑定线索与closer并落库; 成功后写一条审计记录、给closer推一条
/// 通知。核心写失败对本次操作是致命的, 向调用方上抛; 通知在后台
/// 发送, 失败不回滚也不影响调用方响应。
pub struct AssignmentService {
    lead_repo: Arc<dyn LeadRepository>,
    activity_repo: Arc<dyn ActivityRepository>,
    fanout: Arc<NotificationFanout>,
}

impl AssignmentService {
    pub fn new(
        lead_repo: Arc<dyn LeadRepository>,
        activity_repo: Arc<dyn ActivityRepository>,
        fanout: Arc<NotificationFanout>,
    ) -> Self {
        Self {
            lead_repo,
            activity_repo,
            fanout,
        }
    }

    /// 把线索指派给closer
    ///
    /// 目标状态: 即时线索、或已核验的预约线索 → 待派发;
    /// 未核验的预约线索只绑定不推进, 状态原地不动
    pub async fn assign(&self, mut lead: Lead, closer: &Closer) -> DispatchResult<Lead> {
        lead.bind_closer(&closer.id, &closer.name);

        let promote = lead.dispatch_type == DispatchType::Immediate
            || (lead.status.is_appointment_entry() && lead.setter_verified);
        if promote {
            lead.status = LeadStatus::WaitingAssignment;
        }

        self.lead_repo.update(&lead).await?;

        info!(
            lead_id = %lead.id,
            closer_id = %closer.id,
            team_id = %lead.team_id,
            status = lead.status.as_str(),
            "线索已指派"
        );
        counter!("lineup_dispatch_assigned_total").increment(1);

        let record = ActivityRecord::new(
            ActivityKind::LeadAssigned,
            &lead.team_id,
            format!("指派给 {}", closer.name),
        )
        .with_lead(&lead.id)
        .with_closer(&closer.id);
        best_effort("assignment_activity", self.activity_repo.append(&record)).await;

        let fanout = Arc::clone(&self.fanout);
        let recipient = closer.id.clone();
        let payload = PushPayload::new(
            "新线索指派",
            format!("客户 {} 已指派给你", lead.customer_name),
        )
        .with_data(serde_json::json!({ "lead_id": lead.id }));
        spawn_best_effort("assignment_notification", async move {
            fanout.notify(&[recipient], &payload).await
        });

        Ok(lead)
    }
}
