//! # ClassCal Core
//!
//! Domain types and the pure scheduling engine: weekly slot grids, the
//! availability-checked swap engine, the save/versioning policy, session
//! enumeration and attendance forecasting. Persistence and transport live in
//! the `classcal-db` and `classcal-api` crates; the seams they plug into are
//! [`store::CalendarStore`] and [`solver::DraftSolver`].

pub mod editor;
pub mod errors;
pub mod forecast;
pub mod grid;
pub mod models;
pub mod service;
pub mod sessions;
pub mod solver;
pub mod store;
pub mod swap;
pub mod versioning;
