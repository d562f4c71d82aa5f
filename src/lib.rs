//! GeoGate
//!
//! A rule-based access control engine for GIS servers. Decides, per request,
//! whether a subject may use a workspace or layer and under which constraints
//! (styles, attributes, CQL filters, geographic areas).
//!
//! ## Features
//!
//! - **Priority-ordered rules** with wildcard fields and CIDR-scoped
//!   matching; the lowest-priority match is authoritative
//! - **Grant composition** merging the ALLOW rules contributed by each of a
//!   user's roles into one coherent decision
//! - **Workspace visibility summaries** with wildcard absorption, for
//!   catalog-wide UI checks in one call
//! - **Event-invalidated decision cache** keyed by the full request
//! - **Flexible configuration** via TOML files and environment variables
//!
//! ## Decision Model
//!
//! ```text
//! request → matching rules (ascending priority) → winner
//!           DENY winner: denied
//!           ALLOW winner: merge per-role ALLOW contributions
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use geogate::authorization::{AccessRequest, AuthorizationService, RuleAuthorizationEngine};
//! use geogate::store::{MemoryAdminRuleStore, MemoryRuleStore};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), geogate::error::AccessError> {
//! let engine = RuleAuthorizationEngine::new(
//!     Arc::new(MemoryRuleStore::new()),
//!     Arc::new(MemoryAdminRuleStore::new()),
//! );
//! let request = AccessRequest::new()
//!     .with_user("alice")
//!     .with_role("EDITOR")
//!     .with_workspace("topp")
//!     .with_layer("states");
//! let info = engine.get_access_info(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod service;
pub mod store;

// Re-export main types
pub use authorization::{
    AccessInfo, AccessRequest, AuthorizationService, CachingAuthorization,
    RuleAuthorizationEngine,
};
pub use config::{AppConfig, load_config};
pub use error::{AccessError, RuleError, StoreError};
pub use model::{AdminRule, Rule, RuleId};
pub use service::{AdminRuleAdminService, RuleAdminService};
