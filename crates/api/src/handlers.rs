pub mod reports;
pub mod schedule;
