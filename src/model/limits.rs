//! Spatial and catalog limits
//!
//! `RuleLimits` restricts an ALLOW grant to a geographic area and controls
//! how the catalog answers for layers the caller cannot fully see.

use crate::model::area::AllowedArea;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the allowed area is applied to query results
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SpatialFilterType {
    /// Features are filtered to those intersecting the area
    #[default]
    Intersect,
    /// Feature geometries are clipped to the area
    Clip,
}

impl fmt::Display for SpatialFilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialFilterType::Intersect => write!(f, "intersect"),
            SpatialFilterType::Clip => write!(f, "clip"),
        }
    }
}

/// How the server catalog responds when access to a resource is restricted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMode {
    /// Restricted resources are hidden entirely
    Hide,
    /// Restricted resources trigger an authentication challenge
    Challenge,
    /// Mixed: listed but protected
    Mixed,
}

impl CatalogMode {
    /// Strictness rank: `Hide > Mixed > Challenge`
    fn strictness(self) -> u8 {
        match self {
            CatalogMode::Hide => 2,
            CatalogMode::Mixed => 1,
            CatalogMode::Challenge => 0,
        }
    }

    /// Openness rank: `Challenge > Mixed > Hide`
    fn openness(self) -> u8 {
        match self {
            CatalogMode::Challenge => 2,
            CatalogMode::Mixed => 1,
            CatalogMode::Hide => 0,
        }
    }

    /// Combine two simultaneously-applicable modes, the stricter wins
    ///
    /// Used when several rules of equal standing each constrain the same
    /// grant: `Hide` beats `Mixed` beats `Challenge`.
    pub fn stricter(self, other: Self) -> Self {
        if other.strictness() > self.strictness() {
            other
        } else {
            self
        }
    }

    /// Escalate a rule's baseline mode against its own explicit limits,
    /// the larger (more open) wins
    ///
    /// This is the opposite scale from [`CatalogMode::stricter`]: `Challenge`
    /// beats `Mixed` beats `Hide`. The two combinators belong to different
    /// composition contexts and must not be swapped.
    pub fn larger(self, other: Self) -> Self {
        if other.openness() > self.openness() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for CatalogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogMode::Hide => write!(f, "hide"),
            CatalogMode::Challenge => write!(f, "challenge"),
            CatalogMode::Mixed => write!(f, "mixed"),
        }
    }
}

/// Spatial and catalog limits attached to a rule
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleLimits {
    pub allowed_area: Option<AllowedArea>,
    pub spatial_filter_type: SpatialFilterType,
    pub catalog_mode: Option<CatalogMode>,
}

impl RuleLimits {
    pub fn new() -> Self {
        Self::default()
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
    use rstest::rstest;

    #[rstest]
    #[case(CatalogMode::Hide, CatalogMode::Challenge, CatalogMode::Hide)]
    #[case(CatalogMode::Challenge, CatalogMode::Hide, CatalogMode::Hide)]
    #[case(CatalogMode::Mixed, CatalogMode::Challenge, CatalogMode::Mixed)]
    #[case(CatalogMode::Hide, CatalogMode::Mixed, CatalogMode::Hide)]
    #[case(CatalogMode::Mixed, CatalogMode::Mixed, CatalogMode::Mixed)]
    fn test_stricter(#[case] a: CatalogMode, #[case] b: CatalogMode, #[case] expected: CatalogMode) {
        assert_eq!(a.stricter(b), expected);
    }

    #[rstest]
    #[case(CatalogMode::Hide, CatalogMode::Challenge, CatalogMode::Challenge)]
    #[case(CatalogMode::Challenge, CatalogMode::Hide, CatalogMode::Challenge)]
    #[case(CatalogMode::Mixed, CatalogMode::Hide, CatalogMode::Mixed)]
    #[case(CatalogMode::Challenge, CatalogMode::Mixed, CatalogMode::Challenge)]
    fn test_larger(#[case] a: CatalogMode, #[case] b: CatalogMode, #[case] expected: CatalogMode) {
        assert_eq!(a.larger(b), expected);
    }

    #[test]
    fn test_stricter_and_larger_disagree() {
        // The two combinators are distinct scales, not one scale reversed
        // around Mixed only: on (Hide, Challenge) they pick opposite ends.
        let stricter = CatalogMode::Hide.stricter(CatalogMode::Challenge);
        let larger = CatalogMode::Hide.larger(CatalogMode::Challenge);
        assert_eq!(stricter, CatalogMode::Hide);
        assert_eq!(larger, CatalogMode::Challenge);
    }
}
