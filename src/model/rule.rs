//! Data-access rules
//!
//! A [`Rule`] is a prioritized access-control entry: the identifier says who
//! and what it applies to, the priority says when it wins, and the optional
//! limits/details say what an ALLOW actually grants.

use crate::model::address::IpAddressRange;
use crate::model::layer::LayerDetails;
use crate::model::limits::RuleLimits;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, store-assigned rule id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(i64);

impl RuleId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a matching rule grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Allow,
    Deny,
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantType::Allow => write!(f, "allow"),
            GrantType::Deny => write!(f, "deny"),
        }
    }
}

/// How a requested priority is interpreted at insert time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    /// Use the requested value exactly, shifting any occupant out of the way
    #[default]
    Fixed,
    /// Requested value is an offset from the current minimum priority
    FromStart,
    /// Requested value is an offset from the current maximum priority + 1
    FromEnd,
}

/// The matching identity of a data-access rule
///
/// Every criterion is optional: `None` is the wildcard and matches anything.
/// Together with the grant type this forms the uniqueness key among rules;
/// no two rules may share the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleIdentifier {
    pub access: GrantType,
    pub instance_name: Option<String>,
    pub username: Option<String>,
    pub rolename: Option<String>,
    pub service: Option<String>,
    pub request: Option<String>,
    pub subfield: Option<String>,
    pub workspace: Option<String>,
    pub layer: Option<String>,
    pub address_range: Option<IpAddressRange>,
}

impl RuleIdentifier {
    /// An all-wildcard identifier with the given grant
    pub fn new(access: GrantType) -> Self {
        Self {
            access,
            instance_name: None,
            username: None,
            rolename: None,
            service: None,
            request: None,
            subfield: None,
            workspace: None,
            layer: None,
            address_range: None,
        }
    }

    pub fn allow() -> Self {
        Self::new(GrantType::Allow)
    }

    pub fn deny() -> Self {
        Self::new(GrantType::Deny)
    }

    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_rolename(mut self, rolename: impl Into<String>) -> Self {
        self.rolename = Some(rolename.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    pub fn with_subfield(mut self, subfield: impl Into<String>) -> Self {
        self.subfield = Some(subfield.into());
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_address_range(mut self, range: IpAddressRange) -> Self {
        self.address_range = Some(range);
        self
    }
}

/// A prioritized data-access rule
///
/// `id` is `None` until the store assigns one at insert. Priorities form a
/// dense total order per table; the lower the number the earlier the rule is
/// evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: Option<RuleId>,
    pub priority: i64,
    pub identifier: RuleIdentifier,
    pub limits: Option<RuleLimits>,
    pub layer_details: Option<LayerDetails>,
}

impl Rule {
    pub fn new(identifier: RuleIdentifier) -> Self {
        Self {
            id: None,
            priority: 0,
            identifier,
            limits: None,
            layer_details: None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_limits(mut self, limits: RuleLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_layer_details(mut self, details: LayerDetails) -> Self {
        self.layer_details = Some(details);
        self
    }

    pub fn grant(&self) -> GrantType {
        self.identifier.access
    }
}
