//! Authorization decisions
//!
//! Computes ALLOW/DENY decisions and their attached constraints from the
//! rule store:
//!
//! - [`engine::RuleAuthorizationEngine`] selects matching rules (role-OR,
//!   CIDR-aware) and applies priority order; a lower-priority DENY always
//!   beats a higher-numbered ALLOW
//! - [`combine`] merges several simultaneously-applicable ALLOW grants into
//!   one coherent [`AccessInfo`]
//! - [`summary`] builds the per-workspace allow/forbid view with wildcard
//!   absorption
//! - [`cache::CachingAuthorization`] memoizes decisions with event-driven
//!   invalidation and join-on-miss semantics

pub mod cache;
pub mod combine;
pub mod engine;
pub mod request;
pub mod summary;

pub use cache::CachingAuthorization;
pub use engine::{AuthorizationService, RuleAuthorizationEngine};
pub use request::{
    AccessInfo, AccessRequest, AccessSummary, AccessSummaryRequest, AdminAccessInfo,
    AdminAccessRequest,
};
pub use summary::WorkspaceAccessSummary;
