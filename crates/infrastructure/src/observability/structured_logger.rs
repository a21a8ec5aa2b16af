//! 结构化日志工具
//!
//! 关键业务事件的统一打点入口, 字段名保持稳定供日志平台检索

use tracing::{error, info, warn};

/// 结构化日志工具
pub struct StructuredLogger;

impl StructuredLogger {
    /// 线索创建
    pub fn log_lead_created(lead_id: &str, team_id: &str, dispatch_type: &str, setter_id: &str) {
        info!(
            event = "lead_created",
            lead.id = lead_id,
            lead.team_id = team_id,
            lead.dispatch_type = dispatch_type,
            lead.setter_id = setter_id,
            "线索已创建"
        );
    }

    /// 线索调派成功
    pub fn log_lead_dispatched(lead_id: &str, closer_id: &str, closer_name: &str) {
        info!(
            event = "lead_dispatched",
            lead.id = lead_id,
            closer.id = closer_id,
            closer.name = closer_name,
            "线索已调派"
        );
    }

    /// 调派升级: 团队无可用closer
    pub fn log_dispatch_escalated(lead_id: &str, team_id: &str) {
        warn!(
            event = "dispatch_escalated",
            lead.id = lead_id,
            lead.team_id = team_id,
            "无可用closer, 线索等待人工处理"
        );
    }

    /// 处置结果记录
    pub fn log_disposition(lead_id: &str, closer_id: &str, from_status: &str, to_status: &str) {
        info!(
            event = "lead_disposition",
            lead.id = lead_id,
            closer.id = closer_id,
            lead.from_status = from_status,
            lead.to_status = to_status,
            "处置结果已记录"
        );
    }

    /// closer值班状态变化
    pub fn log_duty_changed(closer_id: &str, on_duty: bool, reassigned: usize) {
        info!(
            event = "duty_changed",
            closer.id = closer_id,
            closer.on_duty = on_duty,
            reassigned_leads = reassigned,
            "值班状态已变更"
        );
    }

    /// 核验超时处理
    pub fn log_verification_timeout(lead_id: &str, outcome: &str) {
        warn!(
            event = "verification_timeout",
            lead.id = lead_id,
            outcome = outcome,
            "预约核验超时处理"
        );
    }

    /// 系统级错误
    pub fn log_system_error(component: &str, operation: &str, error: &dyn std::error::Error) {
        error!(
            event = "system_error",
            error.component = component,
            error.operation = operation,
            error.message = %error,
            "系统错误"
        );
    }
}
