pub mod availability;
pub mod calendar;
pub mod period;
pub mod roster;
pub mod schedule;
