//! 轮转策略的纯函数部分
//!
//! 位次计算与候选人比较器不做任何I/O, 便于独立测试;
//! 读写位次的服务层在 dispatcher crate。

use std::cmp::Ordering;

use crate::models::{Closer, LeadStatus};

/// 处置结果的轮转分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionClass {
    /// 异常结果 (取消/改约): 负责人插到队首, 优先拿下一条好线索
    Exception,
    /// 完成结果 (成交/未成交/征信失败): 标准轮转, 排到队尾
    Completion,
}

/// 终态对应的轮转分类; 非处置状态返回 None
pub fn classify_disposition(status: LeadStatus) -> Option<DispositionClass> {
    match status {
        LeadStatus::Canceled | LeadStatus::Rescheduled => Some(DispositionClass::Exception),
        LeadStatus::Sold | LeadStatus::NoSale | LeadStatus::CreditFail => {
            Some(DispositionClass::Completion)
        }
        _ => None,
    }
}

/// 队首位次: 团队现有最小位次再往前一个间隔
///
/// 团队位次为空时以0为基准
pub fn front_order(team_orders: &[i64], gap: i64) -> i64 {
    team_orders.iter().min().copied().unwrap_or(0) - gap
}

/// 队尾位次: 团队现有最大位次再往后一个间隔
pub fn back_order(team_orders: &[i64], gap: i64) -> i64 {
    team_orders.iter().max().copied().unwrap_or(0) + gap
}

/// 派发候选人: closer加上其当前有效工作量
#[derive(Debug, Clone)]
pub struct Candidate {
    pub closer: Closer,
    pub live_count: i64,
}

/// 候选人比较器
///
/// 位次升序 (缺失排队尾), 同位次按工作量升序, 再按姓名,
/// 最后按id兜底保证全序 — 两个不同候选人永不相等
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    a.closer
        .order_key()
        .cmp(&b.closer.order_key())
        .then_with(|| a.live_count.cmp(&b.live_count))
        .then_with(|| a.closer.name.cmp(&b.closer.name))
        .then_with(|| a.closer.id.cmp(&b.closer.id))
}
