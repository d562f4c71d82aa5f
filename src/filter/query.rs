//! Whole-rule filters and store queries

use crate::filter::predicate::{AddressFilter, TextFilter};
use crate::model::{AdminGrantType, AdminRuleIdentifier, GrantType, RuleIdentifier};
use serde::{Deserialize, Serialize};

/// Filter over the nine criteria of a data-access rule identifier
///
/// An all-default filter matches every rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct RuleFilter {
    /// Restrict to one grant type (`None` = both)
    pub grant: Option<GrantType>,
    pub instance_name: TextFilter,
    pub username: TextFilter,
    pub rolename: TextFilter,
    pub service: TextFilter,
    pub request: TextFilter,
    pub subfield: TextFilter,
    pub workspace: TextFilter,
    pub layer: TextFilter,
    pub source_address: AddressFilter,
}

impl RuleFilter {
    /// A filter that matches every rule
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, identifier: &RuleIdentifier) -> bool {
        if let Some(grant) = self.grant
            && grant != identifier.access
        {
            return false;
        }
        self.instance_name
            .matches(identifier.instance_name.as_deref())
            && self.username.matches(identifier.username.as_deref())
            && self.rolename.matches(identifier.rolename.as_deref())
            && self.service.matches(identifier.service.as_deref())
            && self.request.matches(identifier.request.as_deref())
            && self.subfield.matches(identifier.subfield.as_deref())
            && self.workspace.matches(identifier.workspace.as_deref())
            && self.layer.matches(identifier.layer.as_deref())
            && self
                .source_address
                .matches(identifier.address_range.as_ref())
    }
}

/// Filter over admin-rule identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct AdminRuleFilter {
    pub grant: Option<AdminGrantType>,
    pub username: TextFilter,
    pub rolename: TextFilter,
    pub workspace: TextFilter,
    pub source_address: AddressFilter,
}

impl AdminRuleFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, identifier: &AdminRuleIdentifier) -> bool {
        if let Some(grant) = self.grant
            && grant != identifier.access
        {
            return false;
        }
        self.username.matches(identifier.username.as_deref())
            && self.rolename.matches(identifier.rolename.as_deref())
            && self.workspace.matches(identifier.workspace.as_deref())
            && self
                .source_address
                .matches(identifier.address_range.as_ref())
    }
}

/// Offset/limit pagination over a priority-ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Pagination {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

/// A store query: filter plus optional pagination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct RuleQuery {
    pub filter: RuleFilter,
    pub page: Option<Pagination>,
}

impl RuleQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: RuleFilter) -> Self {
        Self { filter, page: None }
    }

    pub fn with_page(mut self, page: Pagination) -> Self {
        self.page = Some(page);
        self
    }
}

/// A store query over admin rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct AdminRuleQuery {
    pub filter: AdminRuleFilter,
    pub page: Option<Pagination>,
}

impl AdminRuleQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: AdminRuleFilter) -> Self {
        Self { filter, page: None }
    }

    pub fn with_page(mut self, page: Pagination) -> Self {
        self.page = Some(page);
        self
    }
}
