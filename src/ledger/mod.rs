//! Ledger construction.
//!
//! Groups timesheet records into the consultant → project → activity
//! ledger consumed by the renderer.

pub mod aggregator;

pub use aggregator::*;
