//! Layer constraints
//!
//! Per-layer detail attached to ALLOW rules: style whitelists, per-attribute
//! access levels, CQL read/write filters and the spatial/catalog constraints.

use crate::model::area::AllowedArea;
use crate::model::limits::{CatalogMode, SpatialFilterType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Access level granted on a single layer attribute
///
/// Total order: `None < ReadOnly < ReadWrite`. Combining grants takes the
/// stricter (smaller) level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AttributeAccess {
    #[default]
    None,
    ReadOnly,
    ReadWrite,
}

impl AttributeAccess {
    /// The stricter of two levels
    pub fn stricter(self, other: Self) -> Self {
        self.min(other)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            AttributeAccess::None => "none",
            AttributeAccess::ReadOnly => "read_only",
            AttributeAccess::ReadWrite => "read_write",
        }
    }
}

impl fmt::Display for AttributeAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named layer attribute with its granted access level
///
/// Ordered by name so attribute sets have a stable iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerAttribute {
    pub name: String,
    pub data_type: Option<String>,
    pub access: AttributeAccess,
}

impl LayerAttribute {
    pub fn new(name: impl Into<String>, access: AttributeAccess) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            access,
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// Per-layer constraints carried by an ALLOW rule
///
/// Empty `allowed_styles` means no style restriction. An empty attribute set
/// means attribute access is unconstrained by this rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerDetails {
    pub default_style: Option<String>,
    pub allowed_styles: BTreeSet<String>,
    pub attributes: BTreeSet<LayerAttribute>,
    pub cql_filter_read: Option<String>,
    pub cql_filter_write: Option<String>,
    pub allowed_area: Option<AllowedArea>,
    pub spatial_filter_type: SpatialFilterType,
    pub catalog_mode: Option<CatalogMode>,
}

impl LayerDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_style(mut self, style: impl Into<String>) -> Self {
        self.default_style = Some(style.into());
        self
    }

    pub fn with_allowed_style(mut self, style: impl Into<String>) -> Self {
        self.allowed_styles.insert(style.into());
        self
    }

    pub fn with_attribute(mut self, attribute: LayerAttribute) -> Self {
        self.attributes.insert(attribute);
        self
    }

    pub fn with_cql_filter_read(mut self, filter: impl Into<String>) -> Self {
        self.cql_filter_read = Some(filter.into());
        self
    }

    pub fn with_cql_filter_write(mut self, filter: impl Into<String>) -> Self {
        self.cql_filter_write = Some(filter.into());
        self
    }

    pub fn with_allowed_area(mut self, area: AllowedArea) -> Self {
        self.allowed_area = Some(area);
        self
    }

    pub fn with_spatial_filter_type(mut self, filter_type: SpatialFilterType) -> Self {
        self.spatial_filter_type = filter_type;
        self
    }

    pub fn with_catalog_mode(mut self, mode: CatalogMode) -> Self {
        self.catalog_mode = Some(mode);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_access_order() {
        assert!(AttributeAccess::None < AttributeAccess::ReadOnly);
        assert!(AttributeAccess::ReadOnly < AttributeAccess::ReadWrite);
    }

    #[test]
    fn test_stricter_takes_minimum() {
        assert_eq!(
            AttributeAccess::ReadWrite.stricter(AttributeAccess::ReadOnly),
            AttributeAccess::ReadOnly
        );
        assert_eq!(
            AttributeAccess::ReadOnly.stricter(AttributeAccess::None),
            AttributeAccess::None
        );
        assert_eq!(
            AttributeAccess::ReadWrite.stricter(AttributeAccess::ReadWrite),
            AttributeAccess::ReadWrite
        );
    }

    #[test]
    fn test_attributes_ordered_by_name() {
        let details = LayerDetails::new()
            .with_attribute(LayerAttribute::new("b", AttributeAccess::ReadOnly))
            .with_attribute(LayerAttribute::new("a", AttributeAccess::ReadWrite));
        let names: Vec<_> = details.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
