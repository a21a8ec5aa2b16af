//! 调派引擎的指标采集
//!
//! 基于metrics crate注册并持有各项指标句柄,
//! 热路径上的细粒度计数仍由各服务直接用宏打点

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use tracing::info;

/// 指标采集器, 持有预注册的指标句柄
pub struct MetricsCollector {
    // 线索流转
    leads_created_total: Counter,
    dispatch_duration: Histogram,
    dispatch_escalations_total: Counter,

    // 轮转与容量
    lineup_depth: Gauge,
    on_duty_closers: Gauge,

    // 基础设施
    database_operation_duration: Histogram,
    push_send_duration: Histogram,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let leads_created_total = counter!("lineup_leads_created_total");
        let dispatch_duration = histogram!("lineup_dispatch_duration_seconds");
        let dispatch_escalations_total = counter!("lineup_dispatch_escalations_total");

        let lineup_depth = gauge!("lineup_depth");
        let on_duty_closers = gauge!("lineup_on_duty_closers");

        let database_operation_duration = histogram!("lineup_database_operation_duration_seconds");
        let push_send_duration = histogram!("lineup_push_send_duration_seconds");

        Self {
            leads_created_total,
            dispatch_duration,
            dispatch_escalations_total,
            lineup_depth,
            on_duty_closers,
            database_operation_duration,
            push_send_duration,
        }
    }

    /// 记录一次线索创建
    pub fn record_lead_created(&self, team_id: &str, dispatch_type: &str) {
        self.leads_created_total.increment(1);

        info!(
            team_id = team_id,
            dispatch_type = dispatch_type,
            "线索创建已计数"
        );
    }

    /// 记录一次调派耗时
    pub fn record_dispatch(&self, duration_seconds: f64) {
        self.dispatch_duration.record(duration_seconds);
    }

    /// 记录一次调派升级(无可用closer)
    pub fn record_dispatch_escalation(&self, team_id: &str) {
        self.dispatch_escalations_total.increment(1);

        info!(team_id = team_id, "调派升级已计数");
    }

    /// 更新团队排队深度
    pub fn update_lineup_depth(&self, depth: f64) {
        self.lineup_depth.set(depth);
    }

    /// 更新在岗closer数量
    pub fn update_on_duty_closers(&self, count: f64) {
        self.on_duty_closers.set(count);
    }

    /// 记录数据库操作耗时
    pub fn record_database_operation(&self, duration_seconds: f64) {
        self.database_operation_duration.record(duration_seconds);
    }

    /// 记录推送投递耗时
    pub fn record_push_send(&self, duration_seconds: f64) {
        self.push_send_duration.record(duration_seconds);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
