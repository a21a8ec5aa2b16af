use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info};

use lineup_core::effects::best_effort;
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::rotation::{back_order, classify_disposition, front_order, DispositionClass};
use lineup_domain::{
    ActivityKind, ActivityRecord, ActivityRepository, Closer, CloserRepository, Lead, LeadStatus,
};

/// 轮转位次服务
///
/// 对 `lineup_order` 做读-改-写: 读团队现有位次, 算出前沿/后沿,
/// 单独写回。并发移动之间接受末写胜出, 不加锁。
pub struct RotationService {
    closer_repo: Arc<dyn CloserRepository>,
    activity_repo: Arc<dyn ActivityRepository>,
    order_gap: i64,
}

impl RotationService {
    pub fn new(
        closer_repo: Arc<dyn CloserRepository>,
        activity_repo: Arc<dyn ActivityRepository>,
        order_gap: i64,
    ) -> Self {
        Self {
            closer_repo,
            activity_repo,
            order_gap,
        }
    }

    /// 处置结果驱动的轮转
    ///
    /// 异常结果 (取消/改约) 插到队首, 让刚受挫的closer优先拿下一条;
    /// 完成结果 (成交/未成交/征信失败) 排到队尾, 标准轮转。
    /// 非处置状态不动位次。
    pub async fn apply_disposition(
        &self,
        lead: &Lead,
        disposition: LeadStatus,
    ) -> DispatchResult<Option<i64>> {
        let Some(closer_id) = lead.assigned_closer_id.as_deref() else {
            debug!(lead_id = %lead.id, "线索无指派closer, 处置不触发轮转");
            return Ok(None);
        };
        let Some(class) = classify_disposition(disposition) else {
            return Ok(None);
        };

        let reason = format!("处置结果: {}", disposition.as_str());
        let new_order = match class {
            DispositionClass::Exception => {
                let mut closer = self.load(closer_id).await?;
                closer.record_exception(disposition.as_str());
                self.closer_repo.update(&closer).await?;
                self.move_to_front(&closer, &reason).await?
            }
            DispositionClass::Completion => {
                let closer = self.load(closer_id).await?;
                self.move_to_back(&closer, &reason).await?
            }
        };

        Ok(Some(new_order))
    }

    /// 插到团队队首: min(现有位次) - gap
    pub async fn move_to_front(&self, closer: &Closer, reason: &str) -> DispatchResult<i64> {
        let orders = self.closer_repo.team_orders(&closer.team_id).await?;
        let new_order = front_order(&orders, self.order_gap);
        self.write_order(closer, new_order, "front", reason).await?;
        Ok(new_order)
    }

    /// 排到团队队尾: max(现有位次) + gap
    pub async fn move_to_back(&self, closer: &Closer, reason: &str) -> DispatchResult<i64> {
        let orders = self.closer_repo.team_orders(&closer.team_id).await?;
        let new_order = back_order(&orders, self.order_gap);
        self.write_order(closer, new_order, "back", reason).await?;
        Ok(new_order)
    }

    /// 重新上班一律排到队尾, 不回历史位置
    pub async fn rejoin_lineup(&self, closer: &Closer) -> DispatchResult<i64> {
        self.move_to_back(closer, "重新上班").await
    }

    /// 手工换位, 直接写指定位次 (gap留白就是为这种单点换位准备的)
    pub async fn reorder(&self, closer_id: &str, new_order: i64) -> DispatchResult<()> {
        let closer = self.load(closer_id).await?;
        self.write_order(&closer, new_order, "manual", "手工调整位次")
            .await
    }

    async fn load(&self, closer_id: &str) -> DispatchResult<Closer> {
        self.closer_repo
            .get_by_id(closer_id)
            .await?
            .ok_or_else(|| DispatchError::CloserNotFound {
                id: closer_id.to_string(),
            })
    }

    async fn write_order(
        &self,
        closer: &Closer,
        new_order: i64,
        direction: &'static str,
        reason: &str,
    ) -> DispatchResult<()> {
        self.closer_repo
            .update_lineup_order(&closer.id, new_order)
            .await?;

        info!(
            closer_id = %closer.id,
            team_id = %closer.team_id,
            previous_order = ?closer.lineup_order,
            new_order,
            direction,
            reason,
            "轮转位次已更新"
        );
        counter!("lineup_rotation_moves_total", "direction" => direction).increment(1);

        let record = ActivityRecord::new(
            ActivityKind::RotationMoved,
            &closer.team_id,
            format!(
                "位次 {:?} -> {new_order} ({reason})",
                closer.lineup_order
            ),
        )
        .with_closer(&closer.id);
        best_effort("rotation_activity", self.activity_repo.append(&record)).await;

        Ok(())
    }
}
