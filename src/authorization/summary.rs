//! Per-workspace visibility summaries
//!
//! Aggregates all rules applicable to a user into one allow/forbid view per
//! workspace. Layer sets absorb to `{"*"}` the moment a wildcard is added,
//! regardless of insertion order.

use crate::model::{AdminGrantType, AdminRule, GrantType, Rule};
use crate::authorization::request::AccessSummary;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// The wildcard entry in allowed/forbidden layer sets (and the bucket for
/// rules that name no workspace)
pub const ANY: &str = "*";

/// Allowed/forbidden layer sets for one workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceAccessSummary {
    workspace: String,
    allowed: BTreeSet<String>,
    forbidden: BTreeSet<String>,
    admin_access: Option<AdminGrantType>,
}

impl WorkspaceAccessSummary {
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            allowed: BTreeSet::new(),
            forbidden: BTreeSet::new(),
            admin_access: None,
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    pub fn forbidden(&self) -> &BTreeSet<String> {
        &self.forbidden
    }

    pub fn admin_access(&self) -> Option<AdminGrantType> {
        self.admin_access
    }

    /// Add a layer to the allowed set
    ///
    /// Adding `*` collapses the set to `{"*"}`; further additions to a
    /// collapsed set are no-ops. Order independent.
    pub fn add_allowed(&mut self, layer: impl Into<String>) -> &mut Self {
        Self::absorbing_insert(&mut self.allowed, layer.into());
        self
    }

    /// Add a layer to the forbidden set, with the same absorption rule
    pub fn add_forbidden(&mut self, layer: impl Into<String>) -> &mut Self {
        Self::absorbing_insert(&mut self.forbidden, layer.into());
        self
    }

    /// Set the workspace admin grant if none has been recorded yet
    ///
    /// The aggregator feeds admin rules in ascending priority, so the first
    /// recorded grant is the authoritative one.
    pub fn record_admin_access(&mut self, grant: AdminGrantType) -> &mut Self {
        self.admin_access.get_or_insert(grant);
        self
    }

    fn absorbing_insert(set: &mut BTreeSet<String>, layer: String) {
        if set.contains(ANY) {
            return;
        }
        if layer == ANY {
            set.clear();
        }
        set.insert(layer);
    }

    /// Resolve the visibility of one layer
    ///
    /// Precedence: an exact forbid beats everything, an exact allow beats a
    /// wildcard forbid, a wildcard forbid beats a wildcard allow, and
    /// nothing is visible by default.
    pub fn can_see_layer(&self, layer: &str) -> bool {
        if self.forbidden.contains(layer) {
            return false;
        }
        if self.allowed.contains(layer) {
            return true;
        }
        if self.forbidden.contains(ANY) {
            return false;
        }
        self.allowed.contains(ANY)
    }

    pub fn is_admin(&self) -> bool {
        self.admin_access == Some(AdminGrantType::Admin)
    }

    pub fn is_user(&self) -> bool {
        matches!(
            self.admin_access,
            Some(AdminGrantType::Admin) | Some(AdminGrantType::User)
        )
    }
}

/// Build the per-workspace summary map from pre-matched rules
///
/// Both slices must already be filtered to the requesting user/roles and
/// sorted ascending by priority. Rules that name no workspace land in the
/// `*` bucket.
pub fn build_access_summary(rules: &[Rule], admin_rules: &[AdminRule]) -> AccessSummary {
    let mut workspaces: BTreeMap<String, WorkspaceAccessSummary> = BTreeMap::new();

    for rule in rules {
        let workspace = rule.identifier.workspace.as_deref().unwrap_or(ANY);
        let layer = rule.identifier.layer.as_deref().unwrap_or(ANY);
        let summary = workspaces
            .entry(workspace.to_string())
            .or_insert_with(|| WorkspaceAccessSummary::new(workspace));
        match rule.grant() {
            GrantType::Allow => summary.add_allowed(layer),
            GrantType::Deny => summary.add_forbidden(layer),
        };
        trace!(workspace, layer, grant = %rule.grant(), "summary accumulated rule");
    }

    for rule in admin_rules {
        let workspace = rule.identifier.workspace.as_deref().unwrap_or(ANY);
        workspaces
            .entry(workspace.to_string())
            .or_insert_with(|| WorkspaceAccessSummary::new(workspace))
            .record_admin_access(rule.grant());
    }

    AccessSummary::new(workspaces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdminRuleIdentifier, RuleIdentifier};

    fn summary_with(allowed: &[&str], forbidden: &[&str]) -> WorkspaceAccessSummary {
        let mut summary = WorkspaceAccessSummary::new("ws");
        for layer in allowed {
            summary.add_allowed(*layer);
        }
        for layer in forbidden {
            summary.add_forbidden(*layer);
        }
        summary
    }

    #[test]
    fn test_wildcard_absorbs_allowed_set() {
        let summary = summary_with(&["L1", "L2", "*"], &[]);
        assert_eq!(
            summary.allowed().iter().collect::<Vec<_>>(),
            vec![&"*".to_string()]
        );
    }

    #[test]
    fn test_wildcard_absorption_is_order_independent() {
        let first = summary_with(&["*", "L1", "L2"], &[]);
        let second = summary_with(&["L1", "L2", "*"], &[]);
        assert_eq!(first.allowed(), second.allowed());
        assert_eq!(first.allowed().len(), 1);
    }

    #[test]
    fn test_exact_allow_beats_wildcard_forbid() {
        let summary = summary_with(&["L1"], &["*"]);
        assert!(summary.can_see_layer("L1"));
        assert!(!summary.can_see_layer("L2"));
    }

    #[test]
    fn test_exact_forbid_beats_wildcard_allow() {
        let summary = summary_with(&["*"], &["L1"]);
        assert!(!summary.can_see_layer("L1"));
        assert!(summary.can_see_layer("L2"));
    }

    #[test]
    fn test_exact_forbid_beats_exact_allow() {
        let summary = summary_with(&["L1"], &["L1", "L2"]);
        assert!(!summary.can_see_layer("L1"));
        assert!(!summary.can_see_layer("L2"));
    }

    #[test]
    fn test_nothing_is_visible_by_default() {
        let summary = summary_with(&[], &[]);
        assert!(!summary.can_see_layer("anything"));
    }

    #[test]
    fn test_admin_flags() {
        let mut summary = WorkspaceAccessSummary::new("ws");
        assert!(!summary.is_admin());
        assert!(!summary.is_user());

        summary.record_admin_access(AdminGrantType::User);
        assert!(!summary.is_admin());
        assert!(summary.is_user());

        // First recorded grant stays authoritative
        summary.record_admin_access(AdminGrantType::Admin);
        assert!(!summary.is_admin());
    }

    #[test]
    fn test_build_groups_by_workspace_with_wildcard_bucket() {
        let rules = vec![
            Rule::new(
                RuleIdentifier::allow()
                    .with_workspace("topp")
                    .with_layer("states"),
            )
            .with_priority(1),
            Rule::new(RuleIdentifier::deny().with_workspace("topp")).with_priority(2),
            Rule::new(RuleIdentifier::allow()).with_priority(3),
        ];
        let admin_rules = vec![
            AdminRule::new(AdminRuleIdentifier::admin().with_workspace("topp")).with_priority(1),
        ];

        let summary = build_access_summary(&rules, &admin_rules);

        let topp = summary.workspace("topp").unwrap();
        assert!(topp.allowed().contains("states"));
        assert!(topp.forbidden().contains("*"));
        assert!(topp.is_admin());

        let wildcard = summary.workspace("*").unwrap();
        assert!(wildcard.allowed().contains("*"));
        assert!(!wildcard.is_user());
    }
}
