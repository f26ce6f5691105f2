//! The `cubicgen` command-line generator.
//!
//! Loads a world folder, generates and populates a region of cubes on a
//! worker pool and reports a determinism digest.

pub mod batch;
pub mod platform;
