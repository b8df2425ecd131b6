//! Core traits and shared types.
//!
//! - [`Backend`] - Database driver abstraction
//! - [`DiagnosticSink`] - Where closure operations report what they did
//! - [`RepairReport`] - Row counts written by a repair
//!
//! # Transactions
//!
//! No closure operation opens, commits or rolls back a transaction. Every
//! mutating operation takes the caller's transaction as a parameter, so a
//! caller can insert a tenant row, its closure edges, and a role grant
//! atomically. Correctness under concurrent moves depends on the isolation the
//! caller's transaction provides; two overlapping moves on intersecting
//! subtrees need an application-level lock or serializable isolation.

pub mod backend;
pub mod diagnostics;
pub mod report;

pub use backend::{Backend, BackendCapability, BackendKind};
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use report::RepairReport;
