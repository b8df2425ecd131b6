//! Test infrastructure for the tenant closure engine.
//!
//! Fixtures build known hierarchies; assertions check the structural
//! properties every consistent closure table must satisfy.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
