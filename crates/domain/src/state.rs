//! 线索状态机
//!
//! 合法流转用显式表列出, 反应器里不做字符串比较。
//! `WaitingAssignment` 与 `Scheduled`/`Rescheduled` 是并行入口;
//! 处置终态只能从 `InProcess` 进入, `Accepted` 等状态先经过
//! 隐式的推进一跳 (见 `pre_disposition_hop`)。

use crate::models::LeadStatus;

/// 状态流转是否合法
///
/// 同状态到同状态恒为真, 便于幂等重放
pub fn is_valid_transition(from: LeadStatus, to: LeadStatus) -> bool {
    use LeadStatus::*;

    if from == to {
        return true;
    }

    match (from, to) {
        // 即时入口: 接单或直接推进
        (WaitingAssignment, Accepted) => true,
        (WaitingAssignment, InProcess) => true,
        // 预约入口: 提前转待派发 / 接单 / 推进 / 超时强转
        (Scheduled, WaitingAssignment) => true,
        (Scheduled, Accepted) => true,
        (Scheduled, InProcess) => true,
        (Scheduled, Canceled) => true,
        (Scheduled, Expired) => true,
        (Rescheduled, WaitingAssignment) => true,
        (Rescheduled, Accepted) => true,
        (Rescheduled, InProcess) => true,
        (Rescheduled, Canceled) => true,
        (Rescheduled, Expired) => true,
        // 接单后推进
        (Accepted, InProcess) => true,
        // 值班下线回收: 重派失败的线索退回待派发
        (InProcess, WaitingAssignment) => true,
        // 跟进中记录处置结果
        (InProcess, Sold) => true,
        (InProcess, NoSale) => true,
        (InProcess, Canceled) => true,
        (InProcess, Rescheduled) => true,
        (InProcess, CreditFail) => true,
        _ => false,
    }
}

/// 记录处置前的隐式推进一跳
///
/// 处置只从 `InProcess` 落终态; 线索停在更早的活跃状态时,
/// 返回需要先补的中间状态
pub fn pre_disposition_hop(current: LeadStatus) -> Option<LeadStatus> {
    use LeadStatus::*;
    match current {
        Accepted | WaitingAssignment | Scheduled | Rescheduled => Some(InProcess),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LeadStatus::*;

    #[test]
    fn test_same_status_is_idempotent() {
        for status in [WaitingAssignment, Scheduled, Accepted, InProcess, Sold] {
            assert!(is_valid_transition(status, status));
        }
    }

    #[test]
    fn test_entry_transitions() {
        assert!(is_valid_transition(WaitingAssignment, Accepted));
        assert!(is_valid_transition(Scheduled, WaitingAssignment));
        assert!(is_valid_transition(Rescheduled, WaitingAssignment));
        assert!(is_valid_transition(Scheduled, Accepted));
    }

    #[test]
    fn test_dispositions_only_from_in_process() {
        assert!(is_valid_transition(InProcess, Sold));
        assert!(is_valid_transition(InProcess, NoSale));
        assert!(is_valid_transition(InProcess, Rescheduled));
        assert!(is_valid_transition(InProcess, CreditFail));
        assert!(!is_valid_transition(Accepted, Sold));
        assert!(!is_valid_transition(WaitingAssignment, Sold));
    }

    #[test]
    fn test_duty_off_revert() {
        assert!(is_valid_transition(InProcess, WaitingAssignment));
        assert!(!is_valid_transition(Accepted, WaitingAssignment));
    }

    #[test]
    fn test_timeout_transitions() {
        assert!(is_valid_transition(Scheduled, Canceled));
        assert!(is_valid_transition(Scheduled, Expired));
        assert!(is_valid_transition(Rescheduled, Expired));
        assert!(!is_valid_transition(WaitingAssignment, Expired));
    }

    #[test]
    fn test_terminal_states_are_sinks() {
        for terminal in [Sold, NoSale, Canceled, CreditFail, Expired] {
            assert!(!is_valid_transition(terminal, WaitingAssignment));
            assert!(!is_valid_transition(terminal, Accepted));
            assert!(!is_valid_transition(terminal, InProcess));
        }
        // Rescheduled 是处置结果同时也是预约入口, 可以重新进入流程
        assert!(is_valid_transition(Rescheduled, InProcess));
    }

    #[test]
    fn test_pre_disposition_hop() {
        assert_eq!(pre_disposition_hop(Accepted), Some(InProcess));
        assert_eq!(pre_disposition_hop(WaitingAssignment), Some(InProcess));
        assert_eq!(pre_disposition_hop(Scheduled), Some(InProcess));
        assert_eq!(pre_disposition_hop(InProcess), None);
        assert_eq!(pre_disposition_hop(Sold), None);
    }
}
