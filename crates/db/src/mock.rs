//! Test doubles for the storage and solver seams.

pub mod memory;
pub mod solver;

pub use memory::InMemoryStore;
pub use solver::MockSolver;
