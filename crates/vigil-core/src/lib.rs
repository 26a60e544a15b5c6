//! Core types and error definitions for the Vigil coordination service.
//!
//! This crate holds the types shared across all Vigil crates: the error
//! taxonomy, the task record state machine, the agent fleet enum, and
//! the wire types exchanged over the coordination bus.
//!
//! # Main types
//!
//! - [`VigilError`] — Unified error enum for all Vigil subsystems.
//! - [`VigilResult`] — Convenience alias for `Result<T, VigilError>`.
//! - [`TaskRecord`] / [`TaskStatus`] — Externally observable task state.
//! - [`AgentKind`] — The fixed fleet of assessment agents.
//! - [`AgentDelegation`] — One agent's sub-task within a session.
//! - [`CompletionNotification`] — Message an agent publishes on finish.
//! - [`SubmitRequest`] — A caller's assessment request.

pub mod agent;
pub mod delegation;
pub mod error;
pub mod task;

pub use agent::AgentKind;
pub use delegation::{
    AgentDelegation, CompletionNotification, DelegationStatus, Priority, SubmitRequest,
};
pub use error::{VigilError, VigilResult};
pub use task::{TaskRecord, TaskStatus};
