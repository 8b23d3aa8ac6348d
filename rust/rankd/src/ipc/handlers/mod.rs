pub mod backup_exchange;
pub mod core;
pub mod marks;
pub mod ranking;
pub mod reports;
pub mod students;
pub mod subjects;
pub mod term;
