//! Domain model
//!
//! Core value types shared by the rule store, the matcher and the
//! authorization engine: prioritized rules, their identifiers, IPv4 address
//! ranges, layer constraints and spatial limits.

pub mod address;
pub mod admin_rule;
pub mod area;
pub mod layer;
pub mod limits;
pub mod rule;

pub use address::IpAddressRange;
pub use admin_rule::{AdminGrantType, AdminRule, AdminRuleIdentifier};
pub use area::AllowedArea;
pub use layer::{AttributeAccess, LayerAttribute, LayerDetails};
pub use limits::{CatalogMode, RuleLimits, SpatialFilterType};
pub use rule::{GrantType, InsertPosition, Rule, RuleId, RuleIdentifier};
