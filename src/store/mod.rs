//! Rule storage ports
//!
//! The engine depends only on the repository traits defined here; concrete
//! stores are collaborators. This module ships the in-memory reference
//! implementation, a relational implementation lives with the embedding
//! adapter.
//!
//! ## Priority invariant
//!
//! Priorities form a dense total order, unique per table. Repositories must
//! never expose a quiescent state with duplicate priorities; the cascading
//! shifts that keep the invariant are driven by
//! [`crate::service::PriorityResolver`] inside its per-table critical
//! section.

pub mod memory;
pub mod repository;

pub use memory::{MemoryAdminRuleStore, MemoryRuleStore};
pub use repository::{AdminRuleRepository, PriorityRepository, RuleRepository};
