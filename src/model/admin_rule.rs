//! Workspace administration rules
//!
//! AdminRules govern workspace administration rights rather than data access.
//! They carry a coarser grant (ADMIN or USER) and a smaller identifier, but
//! share the priority and wildcard semantics of data-access rules.

use crate::model::address::IpAddressRange;
use crate::model::rule::RuleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a matching admin rule grants on a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminGrantType {
    /// Full administration rights on the workspace
    Admin,
    /// Regular user rights on the workspace
    User,
}

impl fmt::Display for AdminGrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminGrantType::Admin => write!(f, "admin"),
            AdminGrantType::User => write!(f, "user"),
        }
    }
}

/// The matching identity of an admin rule
///
/// Same wildcard semantics as [`crate::model::RuleIdentifier`]: `None`
/// matches anything. The (grant, identifier) pair is unique per table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminRuleIdentifier {
    pub access: AdminGrantType,
    pub username: Option<String>,
    pub rolename: Option<String>,
    pub workspace: Option<String>,
    pub address_range: Option<IpAddressRange>,
}

impl AdminRuleIdentifier {
    pub fn new(access: AdminGrantType) -> Self {
        Self {
            access,
            username: None,
            rolename: None,
            workspace: None,
            address_range: None,
        }
    }

    pub fn admin() -> Self {
        Self::new(AdminGrantType::Admin)
    }

    pub fn user() -> Self {
        Self::new(AdminGrantType::User)
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_rolename(mut self, rolename: impl Into<String>) -> Self {
        self.rolename = Some(rolename.into());
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_address_range(mut self, range: IpAddressRange) -> Self {
        self.address_range = Some(range);
        self
    }
}

/// A prioritized workspace-administration rule
#[derive(Debug, Clone, PartialEq)]
pub struct AdminRule {
    pub id: Option<RuleId>,
    pub priority: i64,
    pub identifier: AdminRuleIdentifier,
}

impl AdminRule {
    pub fn new(identifier: AdminRuleIdentifier) -> Self {
        Self {
            id: None,
            priority: 0,
            identifier,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn grant(&self) -> AdminGrantType {
        self.identifier.access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_serde_round_trip() {
        let identifier = AdminRuleIdentifier::admin()
            .with_rolename("WS_ADMIN")
            .with_workspace("topp");
        let json = serde_json::to_string(&identifier).unwrap();
        let back: AdminRuleIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(identifier, back);
    }
}
