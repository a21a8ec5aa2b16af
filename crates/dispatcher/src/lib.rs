//! 派发与轮转引擎
//!
//! 事件反应器是对外入口: 每次触发都从持久化数据重新计算决策,
//! 进程内不保存共享状态。控制流: 反应器 → 派发选择器 → 指派事务 →
//! 通知扇出; 轮转策略由处置/值班事件直接驱动, 与派发相互独立。

pub mod assignment;
pub mod fanout;
pub mod reactors;
pub mod reminder_sweep;
pub mod rotation_service;
pub mod selector;
pub mod verification_sweep;

pub use assignment::AssignmentService;
pub use fanout::NotificationFanout;
pub use reactors::{
    AcceptOutcome, DispatchOutcome, DutyChangeOutcome, EventReactors, LineupSlot, TeamStats,
};
pub use reminder_sweep::ReminderSweepService;
pub use rotation_service::RotationService;
pub use selector::DispatchSelector;
pub use verification_sweep::{VerificationReport, VerificationService, VerificationSweepService};
