mod sqlite_activity_repository;
mod sqlite_closer_repository;
mod sqlite_device_token_repository;
mod sqlite_lead_repository;
mod sqlite_reminder_repository;

pub use sqlite_activity_repository::SqliteActivityRepository;
pub use sqlite_closer_repository::SqliteCloserRepository;
pub use sqlite_device_token_repository::SqliteDeviceTokenRepository;
pub use sqlite_lead_repository::SqliteLeadRepository;
pub use sqlite_reminder_repository::SqliteReminderRepository;
