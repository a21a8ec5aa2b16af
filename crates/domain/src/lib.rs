pub mod models;
pub mod ports;
pub mod repositories;
pub mod rotation;
pub mod state;

pub use models::{
    ActivityKind, ActivityRecord, Caller, CallerRole, Closer, DispatchType, DutyStatus, Lead,
    LeadDraft, LeadStatus, Reminder,
};
pub use ports::{PushPayload, PushProvider, PushReport};
pub use repositories::{
    ActivityRepository, CloserRepository, DeviceTokenRepository, LeadRepository,
    ReminderRepository, TeamLeadStats,
};
