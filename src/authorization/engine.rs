//! Decision engine
//!
//! Resolves access requests against the rule store. Candidate rules are
//! fetched ascending by priority; the lowest-priority match is authoritative.
//! A DENY winner short-circuits; otherwise each requested role contributes
//! its first matching ALLOW rule and the contributions merge via
//! [`combine_allow`](crate::authorization::combine::combine_allow).

use crate::authorization::combine::combine_allow;
use crate::authorization::request::{
    AccessInfo, AccessRequest, AccessSummary, AccessSummaryRequest, AdminAccessInfo,
    AdminAccessRequest,
};
use crate::authorization::summary::build_access_summary;
use crate::error::AccessResult;
use crate::filter::{AddressFilter, AdminRuleFilter, AdminRuleQuery, RuleFilter, RuleQuery, TextFilter};
use crate::model::{AdminGrantType, GrantType, Rule, RuleId};
use crate::store::{AdminRuleRepository, RuleRepository};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::debug;

/// The authorization port consumed by callers (and wrapped by the cache)
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Resolve the effective grant for one request
    async fn get_access_info(&self, request: &AccessRequest) -> AccessResult<AccessInfo>;

    /// Resolve workspace-administration rights for one request
    async fn get_admin_authorization(
        &self,
        request: &AdminAccessRequest,
    ) -> AccessResult<AdminAccessInfo>;

    /// Per-workspace visibility summary for a user and their roles
    async fn get_user_access_summary(
        &self,
        request: &AccessSummaryRequest,
    ) -> AccessResult<AccessSummary>;
}

/// Rule-store backed implementation of [`AuthorizationService`]
pub struct RuleAuthorizationEngine {
    rules: Arc<dyn RuleRepository>,
    admin_rules: Arc<dyn AdminRuleRepository>,
}

impl RuleAuthorizationEngine {
    pub fn new(rules: Arc<dyn RuleRepository>, admin_rules: Arc<dyn AdminRuleRepository>) -> Self {
        Self { rules, admin_rules }
    }

    /// Map one request field onto its matching filter: a concrete value
    /// matches rules naming that value or rules with a wildcard; an absent
    /// value matches wildcard rules only.
    fn field_filter(value: Option<&String>) -> TextFilter {
        match value {
            Some(value) => TextFilter::name(value.clone()).including_default(true),
            None => TextFilter::wildcard_only(),
        }
    }

    fn roles_filter(roles: &BTreeSet<String>) -> TextFilter {
        if roles.is_empty() {
            TextFilter::wildcard_only()
        } else {
            TextFilter::names(roles.iter().cloned()).including_default(true)
        }
    }

    fn address_filter(address: Option<Ipv4Addr>) -> AddressFilter {
        match address {
            Some(address) => AddressFilter::Matches(address),
            None => AddressFilter::Default,
        }
    }

    fn rule_filter(request: &AccessRequest) -> RuleFilter {
        RuleFilter {
            grant: None,
            instance_name: Self::field_filter(request.instance.as_ref()),
            username: Self::field_filter(request.user.as_ref()),
            rolename: Self::roles_filter(&request.roles),
            service: Self::field_filter(request.service.as_ref()),
            request: Self::field_filter(request.request.as_ref()),
            subfield: Self::field_filter(request.subfield.as_ref()),
            workspace: Self::field_filter(request.workspace.as_ref()),
            layer: Self::field_filter(request.layer.as_ref()),
            source_address: Self::address_filter(request.source_address),
        }
    }

    /// One contributing ALLOW rule per requested role: the role's first
    /// matching candidate, kept only when it is an ALLOW. With no roles the
    /// global winner is the sole contributor.
    fn allow_contributors(candidates: &[Rule], roles: &BTreeSet<String>) -> Vec<Rule> {
        let mut seen: BTreeSet<RuleId> = BTreeSet::new();
        let mut contributors: Vec<Rule> = Vec::new();

        let mut consider = |rule: &Rule| {
            if rule.grant() == GrantType::Allow
                && let Some(id) = rule.id
                && seen.insert(id)
            {
                contributors.push(rule.clone());
            }
        };

        if roles.is_empty() {
            if let Some(winner) = candidates.first() {
                consider(winner);
            }
        } else {
            for role in roles {
                let first = candidates.iter().find(|rule| {
                    rule.identifier
                        .rolename
                        .as_deref()
                        .is_none_or(|name| name == role)
                });
                if let Some(rule) = first {
                    consider(rule);
                }
            }
        }

        contributors.sort_by_key(|rule| rule.priority);
        contributors
    }

    async fn resolve_admin_rights(&self, request: &AccessRequest) -> AccessResult<bool> {
        let Some(workspace) = &request.workspace else {
            return Ok(false);
        };
        let filter = AdminRuleFilter {
            grant: None,
            username: Self::field_filter(request.user.as_ref()),
            rolename: Self::roles_filter(&request.roles),
            workspace: TextFilter::name(workspace.clone()).including_default(true),
            source_address: Self::address_filter(request.source_address),
        };
        let candidates = self.admin_rules.find_all(&AdminRuleQuery::filtered(filter)).await?;
        Ok(candidates
            .first()
            .is_some_and(|rule| rule.identifier.access == AdminGrantType::Admin))
    }
}

#[async_trait]
impl AuthorizationService for RuleAuthorizationEngine {
    async fn get_access_info(&self, request: &AccessRequest) -> AccessResult<AccessInfo> {
        let query = RuleQuery::filtered(Self::rule_filter(request));
        let candidates = self.rules.find_all(&query).await?;
        debug!(
            user = request.user.as_deref().unwrap_or("-"),
            workspace = request.workspace.as_deref().unwrap_or("*"),
            layer = request.layer.as_deref().unwrap_or("*"),
            candidates = candidates.len(),
            "resolving access"
        );

        let Some(winner) = candidates.first() else {
            return Ok(AccessInfo::deny_all());
        };
        if winner.grant() == GrantType::Deny {
            let info = match winner.id {
                Some(id) => AccessInfo::denied_by(id),
                None => AccessInfo::deny_all(),
            };
            return Ok(info);
        }

        let contributors = Self::allow_contributors(&candidates, &request.roles);
        if contributors.is_empty() {
            return Ok(AccessInfo::deny_all());
        }
        let mut info = combine_allow(&contributors);
        info.admin_rights = self.resolve_admin_rights(request).await?;
        Ok(info)
    }

    async fn get_admin_authorization(
        &self,
        request: &AdminAccessRequest,
    ) -> AccessResult<AdminAccessInfo> {
        let filter = AdminRuleFilter {
            grant: None,
            username: Self::field_filter(request.user.as_ref()),
            rolename: Self::roles_filter(&request.roles),
            workspace: Self::field_filter(request.workspace.as_ref()),
            source_address: Self::address_filter(request.source_address),
        };
        let candidates = self
            .admin_rules
            .find_all(&AdminRuleQuery::filtered(filter))
            .await?;

        let Some(winner) = candidates.first() else {
            return Ok(AdminAccessInfo::not_admin());
        };
        Ok(AdminAccessInfo {
            admin: winner.identifier.access == AdminGrantType::Admin,
            matching_rule: winner.id,
        })
    }

    async fn get_user_access_summary(
        &self,
        request: &AccessSummaryRequest,
    ) -> AccessResult<AccessSummary> {
        // Every workspace and layer is in scope; only the subject narrows
        // the candidate set.
        let rule_filter = RuleFilter {
            username: Self::field_filter(request.user.as_ref()),
            rolename: Self::roles_filter(&request.roles),
            ..RuleFilter::any()
        };
        let admin_filter = AdminRuleFilter {
            username: Self::field_filter(request.user.as_ref()),
            rolename: Self::roles_filter(&request.roles),
            ..AdminRuleFilter::any()
        };

        let rules = self.rules.find_all(&RuleQuery::filtered(rule_filter)).await?;
        let admin_rules = self
            .admin_rules
            .find_all(&AdminRuleQuery::filtered(admin_filter))
            .await?;
        debug!(
            user = request.user.as_deref().unwrap_or("-"),
            rules = rules.len(),
            admin_rules = admin_rules.len(),
            "building access summary"
        );
        Ok(build_access_summary(&rules, &admin_rules))
    }
}
