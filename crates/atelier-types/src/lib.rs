//! Shared domain types for the atelier CRM engine.
//!
//! These types describe the entities the workflow engine operates on:
//! client requests, projects, tasks, checkpoints and chat messages, plus
//! the authenticated principal the surrounding layer hands to the engine.
//!
//! # Features
//!
//! - `sqlx`: Enables `sqlx::FromRow` derive for database integration.

pub mod checkpoint;
pub mod comment;
pub mod ids;
pub mod project;
pub mod request;
pub mod task;
pub mod user;

pub use checkpoint::*;
pub use comment::*;
pub use ids::*;
pub use project::*;
pub use request::*;
pub use task::*;
pub use user::*;
