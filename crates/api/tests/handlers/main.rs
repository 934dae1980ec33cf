#[path = "../test_utils.rs"]
mod test_utils;

mod config_test;
mod middleware_test;
mod reports_test;
mod schedule_test;
