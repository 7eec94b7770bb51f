//! Analysis modules.
//!
//! Pure aggregation over already-parsed stories; no I/O happens here.

pub mod aggregator;

pub use aggregator::*;
