//! Job admission and coalescing for gitpress.
//!
//! Owns the per-target bookkeeping that guarantees at most one build runs at
//! a time per target while the most recent push is never starved.

pub mod controller;
pub mod handle;

pub use controller::JobController;
pub use handle::{JobHandle, JobOutcome, JobUpdate};
