//! Grant composition
//!
//! When several ALLOW rules apply to one request (one per applicable role),
//! their constraints merge into a single coherent grant:
//!
//! - styles: set union, a `*` on either side collapses the result to `{"*"}`
//! - attributes: per-name merge taking the stricter access level; a name
//!   absent on one constrained side counts as NONE for that side
//! - catalog mode: a rule's own baseline escalates against its explicit
//!   limits with the larger-wins operator; across rules the stricter wins
//! - CQL filters: `(a) AND (b)` when both sides are present
//! - areas: geometric intersection, grouped by spatial filter type
//!   (INTERSECT feeds `area`, CLIP feeds `clip_area`)

use crate::authorization::request::AccessInfo;
use crate::model::{
    AllowedArea, AttributeAccess, CatalogMode, GrantType, LayerAttribute, Rule,
    SpatialFilterType,
};
use std::collections::{BTreeMap, BTreeSet};

/// The wildcard style entry
const ANY_STYLE: &str = "*";

/// Merge an ordered set of contributing ALLOW rules into one grant
///
/// Contributors must be sorted ascending by priority; the first one is the
/// authoritative rule for single-valued fields such as the default style.
pub fn combine_allow(contributors: &[Rule]) -> AccessInfo {
    let mut info = AccessInfo {
        grant: GrantType::Allow,
        ..AccessInfo::deny_all()
    };

    let mut styles: Option<BTreeSet<String>> = None;
    let mut attributes: Option<BTreeSet<LayerAttribute>> = None;

    for rule in contributors {
        if let Some(id) = rule.id {
            info.matching_rule_ids.insert(id);
        }

        let details = rule.layer_details.as_ref();
        let limits = rule.limits.as_ref();

        if info.default_style.is_none() {
            info.default_style = details.and_then(|d| d.default_style.clone());
        }

        styles = Some(merge_styles(
            styles,
            details.map(|d| &d.allowed_styles),
        ));
        attributes = merge_attributes(attributes, details.map(|d| &d.attributes));

        info.cql_filter_read = and_cql(
            info.cql_filter_read.take(),
            details.and_then(|d| d.cql_filter_read.clone()),
        );
        info.cql_filter_write = and_cql(
            info.cql_filter_write.take(),
            details.and_then(|d| d.cql_filter_write.clone()),
        );

        // A rule's baseline mode escalates against its own explicit limits
        // (larger wins); the cross-rule composition below is stricter-wins.
        let rule_mode = merge_rule_catalog_mode(
            details.and_then(|d| d.catalog_mode),
            limits.and_then(|l| l.catalog_mode),
        );
        info.catalog_mode = match (info.catalog_mode, rule_mode) {
            (Some(a), Some(b)) => Some(a.stricter(b)),
            (a, b) => a.or(b),
        };

        for (area, filter_type) in rule_areas(rule) {
            match filter_type {
                SpatialFilterType::Intersect => {
                    info.area = intersect(info.area.take(), area);
                }
                SpatialFilterType::Clip => {
                    info.clip_area = intersect(info.clip_area.take(), area);
                }
            }
        }
    }

    info.allowed_styles = styles.unwrap_or_default();
    info.attributes = attributes.unwrap_or_default();
    info
}

/// Union with `*` absorption; a contributor without a style restriction
/// counts as `{"*"}`
fn merge_styles(
    merged: Option<BTreeSet<String>>,
    next: Option<&BTreeSet<String>>,
) -> BTreeSet<String> {
    let next_set: BTreeSet<String> = match next {
        Some(set) if !set.is_empty() => set.clone(),
        _ => BTreeSet::from([ANY_STYLE.to_string()]),
    };
    let Some(merged) = merged else {
        return next_set;
    };
    if merged.contains(ANY_STYLE) || next_set.contains(ANY_STYLE) {
        return BTreeSet::from([ANY_STYLE.to_string()]);
    }
    merged.union(&next_set).cloned().collect()
}

/// Per-name stricter merge; an empty attribute set means the contributing
/// rule leaves attribute access unconstrained and passes the other side
/// through
fn merge_attributes(
    merged: Option<BTreeSet<LayerAttribute>>,
    next: Option<&BTreeSet<LayerAttribute>>,
) -> Option<BTreeSet<LayerAttribute>> {
    let next = match next {
        Some(set) if !set.is_empty() => set,
        _ => return merged,
    };
    let Some(merged) = merged else {
        return Some(next.clone());
    };

    let mut by_name: BTreeMap<&str, &LayerAttribute> = BTreeMap::new();
    for attribute in &merged {
        by_name.insert(attribute.name.as_str(), attribute);
    }

    let mut result: BTreeSet<LayerAttribute> = BTreeSet::new();
    for attribute in next {
        let access = match by_name.remove(attribute.name.as_str()) {
            Some(other) => attribute.access.stricter(other.access),
            // Present on one constrained side only: NONE on the other
            None => AttributeAccess::None,
        };
        result.insert(LayerAttribute {
            name: attribute.name.clone(),
            data_type: attribute.data_type.clone(),
            access,
        });
    }
    // Leftovers from the merged side are absent on the next side
    for attribute in by_name.into_values() {
        result.insert(LayerAttribute {
            name: attribute.name.clone(),
            data_type: attribute.data_type.clone(),
            access: AttributeAccess::None,
        });
    }
    Some(result)
}

/// `(a) AND (b)` when both sides are present, pass-through otherwise
fn and_cql(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(format!("({a}) AND ({b})")),
        (a, b) => a.or(b),
    }
}

fn merge_rule_catalog_mode(
    baseline: Option<CatalogMode>,
    limits: Option<CatalogMode>,
) -> Option<CatalogMode> {
    match (baseline, limits) {
        (Some(a), Some(b)) => Some(a.larger(b)),
        (a, b) => a.or(b),
    }
}

fn rule_areas(rule: &Rule) -> Vec<(&AllowedArea, SpatialFilterType)> {
    let mut areas = Vec::new();
    if let Some(details) = &rule.layer_details
        && let Some(area) = &details.allowed_area
    {
        areas.push((area, details.spatial_filter_type));
    }
    if let Some(limits) = &rule.limits
        && let Some(area) = &limits.allowed_area
    {
        areas.push((area, limits.spatial_filter_type));
    }
    areas
}

fn intersect(merged: Option<AllowedArea>, next: &AllowedArea) -> Option<AllowedArea> {
    match merged {
        None => Some(next.clone()),
        Some(current) => Some(current.intersection(next)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LayerDetails, RuleId, RuleIdentifier, RuleLimits};

    fn allow_rule(id: i64, priority: i64) -> Rule {
        Rule {
            id: Some(RuleId::new(id)),
            priority,
            identifier: RuleIdentifier::allow(),
            limits: None,
            layer_details: None,
        }
    }

    #[test]
    fn test_style_union() {
        let a = allow_rule(1, 1).with_layer_details(
            LayerDetails::new()
                .with_allowed_style("polygon")
                .with_allowed_style("line"),
        );
        let b = allow_rule(2, 2)
            .with_layer_details(LayerDetails::new().with_allowed_style("point"));

        let info = combine_allow(&[a, b]);
        let styles: Vec<_> = info.allowed_styles.iter().map(String::as_str).collect();
        assert_eq!(styles, vec!["line", "point", "polygon"]);
    }

    #[test]
    fn test_style_wildcard_absorbs() {
        let a = allow_rule(1, 1)
            .with_layer_details(LayerDetails::new().with_allowed_style("polygon"));
        let b = allow_rule(2, 2).with_layer_details(LayerDetails::new().with_allowed_style("*"));

        let info = combine_allow(&[a, b]);
        assert_eq!(info.allowed_styles.len(), 1);
        assert!(info.allowed_styles.contains("*"));
    }

    #[test]
    fn test_unrestricted_contributor_absorbs_styles() {
        // No layer details at all = no style restriction = "*"
        let a = allow_rule(1, 1)
            .with_layer_details(LayerDetails::new().with_allowed_style("polygon"));
        let b = allow_rule(2, 2);

        let info = combine_allow(&[a, b]);
        assert!(info.allowed_styles.contains("*"));
    }

    #[test]
    fn test_attribute_stricter_merge() {
        let a = allow_rule(1, 1).with_layer_details(
            LayerDetails::new()
                .with_attribute(LayerAttribute::new("geom", AttributeAccess::ReadWrite))
                .with_attribute(LayerAttribute::new("name", AttributeAccess::ReadOnly)),
        );
        let b = allow_rule(2, 2).with_layer_details(
            LayerDetails::new()
                .with_attribute(LayerAttribute::new("geom", AttributeAccess::ReadOnly))
                .with_attribute(LayerAttribute::new("owner", AttributeAccess::ReadWrite)),
        );

        let info = combine_allow(&[a, b]);
        let access: BTreeMap<&str, AttributeAccess> = info
            .attributes
            .iter()
            .map(|a| (a.name.as_str(), a.access))
            .collect();
        assert_eq!(access["geom"], AttributeAccess::ReadOnly);
        // Present on one side only: NONE
        assert_eq!(access["name"], AttributeAccess::None);
        assert_eq!(access["owner"], AttributeAccess::None);
    }

    #[test]
    fn test_attributes_pass_through_unconstrained_side() {
        let a = allow_rule(1, 1).with_layer_details(
            LayerDetails::new()
                .with_attribute(LayerAttribute::new("geom", AttributeAccess::ReadOnly)),
        );
        let b = allow_rule(2, 2);

        let info = combine_allow(&[a, b]);
        assert_eq!(info.attributes.len(), 1);
        let geom = info.attributes.iter().next().unwrap();
        assert_eq!(geom.access, AttributeAccess::ReadOnly);
    }

    #[test]
    fn test_cql_and_combination() {
        let a = allow_rule(1, 1)
            .with_layer_details(LayerDetails::new().with_cql_filter_read("state = 'NY'"));
        let b = allow_rule(2, 2)
            .with_layer_details(LayerDetails::new().with_cql_filter_read("pop > 1000"));

        let info = combine_allow(&[a, b]);
        assert_eq!(
            info.cql_filter_read.as_deref(),
            Some("(state = 'NY') AND (pop > 1000)")
        );
        assert!(info.cql_filter_write.is_none());
    }

    #[test]
    fn test_cql_pass_through() {
        let a = allow_rule(1, 1)
            .with_layer_details(LayerDetails::new().with_cql_filter_write("editable = true"));
        let b = allow_rule(2, 2);

        let info = combine_allow(&[a, b]);
        assert_eq!(info.cql_filter_write.as_deref(), Some("editable = true"));
    }

    #[test]
    fn test_catalog_mode_stricter_across_rules() {
        let a = allow_rule(1, 1)
            .with_limits(RuleLimits::new().with_catalog_mode(CatalogMode::Challenge));
        let b = allow_rule(2, 2).with_limits(RuleLimits::new().with_catalog_mode(CatalogMode::Hide));

        let info = combine_allow(&[a, b]);
        assert_eq!(info.catalog_mode, Some(CatalogMode::Hide));
    }

    #[test]
    fn test_catalog_mode_larger_within_one_rule() {
        // Baseline HIDE escalated by explicit CHALLENGE limits: larger wins
        let rule = allow_rule(1, 1)
            .with_layer_details(LayerDetails::new().with_catalog_mode(CatalogMode::Hide))
            .with_limits(RuleLimits::new().with_catalog_mode(CatalogMode::Challenge));

        let info = combine_allow(&[rule]);
        assert_eq!(info.catalog_mode, Some(CatalogMode::Challenge));
    }

    #[test]
    fn test_areas_intersect_by_filter_type() {
        let square = AllowedArea::from_wkt("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
        let shifted = AllowedArea::from_wkt("POLYGON((5 5, 15 5, 15 15, 5 15, 5 5))").unwrap();
        let clip = AllowedArea::from_wkt("POLYGON((0 0, 4 0, 4 4, 0 4, 0 0))").unwrap();

        let a = allow_rule(1, 1).with_limits(RuleLimits::new().with_allowed_area(square));
        let b = allow_rule(2, 2).with_limits(RuleLimits::new().with_allowed_area(shifted));
        let c = allow_rule(3, 3).with_limits(
            RuleLimits::new()
                .with_allowed_area(clip)
                .with_spatial_filter_type(SpatialFilterType::Clip),
        );

        let info = combine_allow(&[a, b, c]);
        assert!(info.area.is_some());
        assert!(!info.area.as_ref().unwrap().is_empty());
        assert!(info.clip_area.is_some());
    }

    #[test]
    fn test_default_style_from_first_contributor() {
        let a = allow_rule(1, 1)
            .with_layer_details(LayerDetails::new().with_default_style("primary"));
        let b = allow_rule(2, 2)
            .with_layer_details(LayerDetails::new().with_default_style("secondary"));

        let info = combine_allow(&[a, b]);
        assert_eq!(info.default_style.as_deref(), Some("primary"));
    }

    #[test]
    fn test_rule_ids_are_collected() {
        let info = combine_allow(&[allow_rule(7, 1), allow_rule(9, 2)]);
        let ids: Vec<i64> = info.matching_rule_ids.iter().map(|id| id.value()).collect();
        assert_eq!(ids, vec![7, 9]);
    }
}
