//! Allowed-area geometry
//!
//! Thin wrapper over the `geo` ecosystem: rules carry a polygonal allowed
//! area parsed from WKT, and composing two grants intersects their areas.
//! The geometry algorithms themselves live in `geo`; this module only
//! normalizes input and maps failures to explicit errors.

use crate::error::GeometryError;
use geo::{BooleanOps, Geometry, MultiPolygon};
use wkt::{ToWkt, TryFromWkt};

/// A polygonal allowed area attached to a rule
#[derive(Debug, Clone, PartialEq)]
pub struct AllowedArea {
    area: MultiPolygon<f64>,
}

impl AllowedArea {
    /// Parse an allowed area from WKT
    ///
    /// Accepts `POLYGON` and `MULTIPOLYGON`; any other geometry type is an
    /// explicit [`GeometryError::UnsupportedGeometry`], and malformed WKT is
    /// [`GeometryError::InvalidWkt`] rather than a silent wildcard.
    pub fn from_wkt(wkt: &str) -> Result<Self, GeometryError> {
        let geometry =
            Geometry::<f64>::try_from_wkt_str(wkt).map_err(|e| GeometryError::InvalidWkt {
                wkt: wkt.to_string(),
                reason: e.to_string(),
            })?;
        match geometry {
            Geometry::Polygon(polygon) => Ok(Self {
                area: MultiPolygon(vec![polygon]),
            }),
            Geometry::MultiPolygon(area) => Ok(Self { area }),
            other => Err(GeometryError::UnsupportedGeometry(
                geometry_kind(&other).to_string(),
            )),
        }
    }

    /// Wrap an already-built multipolygon
    pub fn from_multi_polygon(area: MultiPolygon<f64>) -> Self {
        Self { area }
    }

    /// Geometric intersection with another allowed area
    pub fn intersection(&self, other: &AllowedArea) -> AllowedArea {
        Self {
            area: self.area.intersection(&other.area),
        }
    }

    /// True when the area contains no polygons (fully restricted)
    pub fn is_empty(&self) -> bool {
        self.area.0.is_empty()
    }

    pub fn multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.area
    }

    /// Render back to WKT
    pub fn to_wkt_string(&self) -> String {
        self.area.wkt_string()
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
