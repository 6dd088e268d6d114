pub mod evaluator;
pub mod types;

pub use evaluator::{evaluate, Evaluation};
pub use types::{DashboardStats, Direction, Signal, SignalDraft, SignalStatus, SignalUpdate, ValidatedDraft};

#[cfg(test)]
mod types_tests;
