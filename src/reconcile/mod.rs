//! Reconcile module orchestrator following the RSB module specification.
//!
//! The corrective arithmetic that keeps the header overlay from obscuring
//! appended content once the stream outgrows the container.

mod core;

pub use core::{reconcile, Correction, Measure};
