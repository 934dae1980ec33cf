pub mod error_handling;
pub mod save_guard;
