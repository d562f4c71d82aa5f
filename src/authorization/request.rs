//! Decision requests and responses
//!
//! Requests are immutable value types with structural equality: the caching
//! decorator uses the full request as its cache key.

use crate::error::AddressError;
use crate::model::address::require_ipv4;
use crate::model::{AllowedArea, CatalogMode, GrantType, LayerAttribute, RuleId};
use crate::authorization::summary::WorkspaceAccessSummary;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, Ipv4Addr};

/// A data-access decision request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct AccessRequest {
    pub user: Option<String>,
    pub roles: BTreeSet<String>,
    pub source_address: Option<Ipv4Addr>,
    pub instance: Option<String>,
    pub service: Option<String>,
    pub request: Option<String>,
    pub subfield: Option<String>,
    pub workspace: Option<String>,
    pub layer: Option<String>,
}

impl AccessRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Set the client source address; IPv6 fails explicitly
    pub fn with_source_address(mut self, address: IpAddr) -> Result<Self, AddressError> {
        self.source_address = Some(require_ipv4(address)?);
        Ok(self)
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
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
}

/// The composed outcome of a data-access decision
#[derive(Debug, Clone, PartialEq)]
pub struct AccessInfo {
    pub grant: GrantType,
    pub admin_rights: bool,
    pub area: Option<AllowedArea>,
    pub clip_area: Option<AllowedArea>,
    pub catalog_mode: Option<CatalogMode>,
    pub default_style: Option<String>,
    pub cql_filter_read: Option<String>,
    pub cql_filter_write: Option<String>,
    pub attributes: BTreeSet<LayerAttribute>,
    pub allowed_styles: BTreeSet<String>,
    /// Rules that produced this decision, for cache-eviction correlation
    pub matching_rule_ids: BTreeSet<RuleId>,
}

impl AccessInfo {
    /// The default-deny decision (no rule matched)
    pub fn deny_all() -> Self {
        Self {
            grant: GrantType::Deny,
            admin_rights: false,
            area: None,
            clip_area: None,
            catalog_mode: None,
            default_style: None,
            cql_filter_read: None,
            cql_filter_write: None,
            attributes: BTreeSet::new(),
            allowed_styles: BTreeSet::new(),
            matching_rule_ids: BTreeSet::new(),
        }
    }

    /// A DENY produced by a specific rule
    pub fn denied_by(id: RuleId) -> Self {
        Self {
            matching_rule_ids: BTreeSet::from([id]),
            ..Self::deny_all()
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.grant == GrantType::Allow
    }
}

/// A workspace-administration decision request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct AdminAccessRequest {
    pub user: Option<String>,
    pub roles: BTreeSet<String>,
    pub source_address: Option<Ipv4Addr>,
    pub workspace: Option<String>,
}

impl AdminAccessRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_source_address(mut self, address: IpAddr) -> Result<Self, AddressError> {
        self.source_address = Some(require_ipv4(address)?);
        Ok(self)
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }
}

/// The outcome of a workspace-administration decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccessInfo {
    pub admin: bool,
    /// The authoritative rule, absent when no rule matched
    pub matching_rule: Option<RuleId>,
}

impl AdminAccessInfo {
    pub fn not_admin() -> Self {
        Self {
            admin: false,
            matching_rule: None,
        }
    }
}

/// A request for the per-workspace visibility summary of one user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct AccessSummaryRequest {
    pub user: Option<String>,
    pub roles: BTreeSet<String>,
}

impl AccessSummaryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }
}

/// Per-workspace visibility summaries for one user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessSummary {
    workspaces: BTreeMap<String, WorkspaceAccessSummary>,
}

impl AccessSummary {
    pub fn new(workspaces: BTreeMap<String, WorkspaceAccessSummary>) -> Self {
        Self { workspaces }
    }

    pub fn workspace(&self, name: &str) -> Option<&WorkspaceAccessSummary> {
        self.workspaces.get(name)
    }

    pub fn workspaces(&self) -> impl Iterator<Item = &WorkspaceAccessSummary> {
        self.workspaces.values()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }
}
