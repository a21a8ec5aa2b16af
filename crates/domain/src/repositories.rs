//! 仓储层接口
//!
//! 持久化技术在引擎范围之外, 引擎只依赖这里的异步trait。
//! PostgreSQL / SQLite 实现在 infrastructure crate,
//! 测试用的内存实现在 testing-utils crate。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lineup_core::DispatchResult;

use crate::models::{ActivityRecord, Closer, Lead, Reminder};

/// 线索仓储
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create(&self, lead: &Lead) -> DispatchResult<Lead>;

    async fn get_by_id(&self, id: &str) -> DispatchResult<Option<Lead>>;

    /// 全量覆盖写, 以 `lead.id` 定位
    async fn update(&self, lead: &Lead) -> DispatchResult<()>;

    async fn list_by_team(&self, team_id: &str) -> DispatchResult<Vec<Lead>>;

    /// closer名下处于活跃状态的线索 (含未核验预约)
    async fn list_active_by_closer(&self, closer_id: &str) -> DispatchResult<Vec<Lead>>;

    /// 有效工作量: 活跃线索数, 其中未核验的预约线索不计入
    ///
    /// 未核验预约随时可能被超时取消, 不占容量名额
    async fn live_assignment_count(&self, closer_id: &str) -> DispatchResult<i64>;

    /// 所有处于预约入口状态且带预约时间的线索, 供核验超时扫描用
    async fn list_pending_appointments(&self) -> DispatchResult<Vec<Lead>>;

    /// 团队维度的聚合统计
    async fn team_stats(&self, team_id: &str) -> DispatchResult<TeamLeadStats>;
}

/// Closer仓储
#[async_trait]
pub trait CloserRepository: Send + Sync {
    async fn create(&self, closer: &Closer) -> DispatchResult<Closer>;

    async fn get_by_id(&self, id: &str) -> DispatchResult<Option<Closer>>;

    async fn update(&self, closer: &Closer) -> DispatchResult<()>;

    /// 角色回收时删除
    async fn delete(&self, id: &str) -> DispatchResult<()>;

    async fn list_by_team(&self, team_id: &str) -> DispatchResult<Vec<Closer>>;

    async fn list_on_duty(&self, team_id: &str) -> DispatchResult<Vec<Closer>>;

    /// 团队当前全部已设置的位次值, 轮转前沿/后沿计算的输入
    async fn team_orders(&self, team_id: &str) -> DispatchResult<Vec<i64>>;

    /// 单独写位次, 读-改-写语义, 接受末写胜出
    async fn update_lineup_order(&self, closer_id: &str, order: i64) -> DispatchResult<()>;
}

/// 审计记录仓储, 只追加
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn append(&self, record: &ActivityRecord) -> DispatchResult<()>;

    /// 团队最近的记录, 新的在前
    async fn list_recent_by_team(
        &self,
        team_id: &str,
        limit: i64,
    ) -> DispatchResult<Vec<ActivityRecord>>;
}

/// 预约提醒仓储
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// 按 lead_id 幂等覆盖: 已有待处理提醒则更新时间, 否则插入
    async fn upsert_for_lead(&self, reminder: &Reminder) -> DispatchResult<()>;

    async fn get_by_lead(&self, lead_id: &str) -> DispatchResult<Option<Reminder>>;

    /// 到期且未处理的提醒, 按提醒时间升序, 限量一批
    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> DispatchResult<Vec<Reminder>>;

    /// 整批置为已处理, 一次写入避免半批落库
    async fn mark_processed_batch(&self, reminder_ids: &[String]) -> DispatchResult<()>;
}

/// 推送投递目标仓储, 一行一个 (closer, token)
#[async_trait]
pub trait DeviceTokenRepository: Send + Sync {
    async fn add(&self, closer_id: &str, token: &str) -> DispatchResult<()>;

    async fn remove(&self, closer_id: &str, token: &str) -> DispatchResult<()>;

    async fn tokens_for(&self, closer_id: &str) -> DispatchResult<Vec<String>>;

    /// 按token值删除, 供投递方报告永久失效后清理
    async fn remove_tokens(&self, tokens: &[String]) -> DispatchResult<()>;
}

/// 团队线索统计
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TeamLeadStats {
    pub total_leads: i64,
    pub by_status: HashMap<String, i64>,
    /// 活跃线索按closer的分布
    pub by_closer: HashMap<String, i64>,
}
