mod postgres_activity_repository;
mod postgres_closer_repository;
mod postgres_device_token_repository;
mod postgres_lead_repository;
mod postgres_reminder_repository;

pub use postgres_activity_repository::PostgresActivityRepository;
pub use postgres_closer_repository::PostgresCloserRepository;
pub use postgres_device_token_repository::PostgresDeviceTokenRepository;
pub use postgres_lead_repository::PostgresLeadRepository;
pub use postgres_reminder_repository::PostgresReminderRepository;
