//! Atelier - workflow and assignment engine for a studio CRM.
//!
//! Clients submit work requests, managers triage them into projects and
//! tasks, developers claim and complete tasks on a kanban board. This crate
//! holds the state machines and ordering invariants behind that flow; the
//! surrounding web layer handles auth, templates and file serving.

pub mod api;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod services;

pub use error::{AtelierError, Result};

// Re-export all domain types from atelier-types
pub use atelier_types::*;
