//! # N-body simulation engine
//!
//! GPU-based gravitational N-body integration using a compute shader over a
//! double-buffered body store.

pub mod simulation;

pub use simulation::*;
