//! Subcommand implementations.
//!
//! Batch commands return the core `Outcome` so `main` can turn per-entry
//! failures into the exit status.

pub mod blob;
pub mod completions;
pub mod install;
pub mod keygen;
pub mod sign;
pub mod validate;
