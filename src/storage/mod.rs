//! On-disk artifacts.
//!
//! This module owns the fixed file names of a provisioned chain and how
//! they are written.

pub mod artifacts;
