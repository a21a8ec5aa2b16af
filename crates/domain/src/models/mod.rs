mod activity;
mod caller;
mod closer;
mod lead;
mod reminder;

pub use activity::{ActivityKind, ActivityRecord};
pub use caller::{Caller, CallerRole};
pub use closer::{Closer, DutyStatus};
pub use lead::{live_assignment_count, DispatchType, Lead, LeadDraft, LeadStatus};
pub use reminder::Reminder;
