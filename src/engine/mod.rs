// src/engine/mod.rs

//! Run orchestration.
//!
//! - [`attempt`]: the `RunAttempt` record, its `Stage`s and `StageOutcome`s.
//! - [`coordinator`]: the `Coordinator` that drives lock, service and job in
//!   strict sequence and guarantees cleanup once the lock is held.

pub mod attempt;
pub mod coordinator;

pub use attempt::{RunAttempt, Stage, StageOutcome};
pub use coordinator::{Coordinator, CoordinatorOptions};
