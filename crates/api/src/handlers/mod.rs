pub mod closers;
pub mod health;
pub mod leads;
pub mod metrics;
pub mod teams;
