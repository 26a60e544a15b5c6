//! Coordination store: key-value records plus pub/sub channels.
//!
//! The store is the only shared mutable resource in the system. The
//! [`KvStore`] and [`MessageBus`] traits are the seam behind which a
//! networked backend would sit; [`MemoryStore`] is the in-process
//! default. [`TaskStore`] layers the task-record contract on top.

pub mod kv;
pub mod task_store;

pub use kv::{KvStore, MemoryStore, MessageBus, Subscription};
pub use task_store::{TaskStore, DEFAULT_TASK_TTL};

/// Store key holding one agent's sub-task config for a session.
pub fn delegation_key(session_id: uuid::Uuid, agent: vigil_core::AgentKind) -> String {
    format!("manager:{session_id}:task:{agent}")
}

/// Channel carrying completion notifications for a session.
pub fn notification_channel(session_id: uuid::Uuid) -> String {
    format!("manager:{session_id}:notifications")
}
