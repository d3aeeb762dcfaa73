//! # Section Data Structures
//!
//! A [`Section`] is one outline [`Boundary`] plus zero or more hollow
//! boundaries. Boundaries are produced only by the validator
//! ([`crate::validation`]), so holding a `Boundary` means holding a closed,
//! planar ring.
//!
//! ## Structure
//!
//! ```text
//! Section
//! ├── outline: Boundary (closed, planar, defines the section plane)
//! └── hollows: Vec<Boundary> (each inside the outline, pairwise disjoint)
//! ```
//!
//! Boundaries own a deep copy of the curve they were built from, so later
//! edits in the geometry source never leak into a Section.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{polygon, BoundingBox, Curve, Plane, Point2};

/// Stable identity of a boundary in the geometry source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryId(pub Uuid);

impl BoundaryId {
    /// Fresh random identifier
    pub fn new() -> Self {
        BoundaryId(Uuid::new_v4())
    }
}

impl Default for BoundaryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, closed, planar boundary ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Identity in the geometry source
    pub id: BoundaryId,

    /// Human-readable label used in errors ("outline", "hollow #2")
    pub label: String,

    /// Deep copy of the source curve
    pub curve: Curve,

    /// Section plane the ring is expressed in
    pub plane: Plane,

    /// Ring vertices in plane coordinates (closing point not repeated)
    pub ring: Vec<Point2>,

    /// Bounding box of the ring
    pub bbox: BoundingBox,

    /// Curve length
    pub length: f64,

    /// Curve degree (fingerprint metadata)
    pub degree: u32,

    /// Curve span count (fingerprint metadata)
    pub span_count: usize,

    pub closed: bool,
    pub planar: bool,
}

impl Boundary {
    /// Unsigned enclosed area of the ring
    pub fn area(&self) -> f64 {
        polygon::signed_area(&self.ring).abs()
    }

    /// Area centroid of the ring
    pub fn centroid(&self) -> Point2 {
        polygon::centroid(&self.ring).unwrap_or_else(|| self.bbox.center())
    }

    /// The ring as a geo polygon without holes
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(ring_to_line_string(&self.ring), Vec::new())
    }
}

pub(crate) fn ring_to_line_string(ring: &[Point2]) -> geo::LineString<f64> {
    geo::LineString::from(ring.iter().map(|p| geo::Coord::from(*p)).collect::<Vec<_>>())
}

/// Outline plus hollows, owned by value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub outline: Boundary,
    pub hollows: Vec<Boundary>,
}

impl Section {
    /// Section with no hollows
    pub fn solid(outline: Boundary) -> Self {
        Section {
            outline,
            hollows: Vec::new(),
        }
    }

    pub fn has_hollows(&self) -> bool {
        !self.hollows.is_empty()
    }

    pub fn plane(&self) -> &Plane {
        &self.outline.plane
    }

    /// All boundaries, outline first
    pub fn boundaries(&self) -> impl Iterator<Item = &Boundary> {
        std::iter::once(&self.outline).chain(self.hollows.iter())
    }

    pub fn hollow(&self, id: BoundaryId) -> Option<&Boundary> {
        self.hollows.iter().find(|h| h.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AccuracyMode;
    use crate::validation::validate_outline;

    #[test]
    fn test_boundary_area_and_centroid() {
        let outline = validate_outline(
            BoundaryId::new(),
            &Curve::rectangle(10.0, 20.0, 40.0, 60.0),
            AccuracyMode::Fast,
        )
        .unwrap();
        assert!((outline.area() - 2400.0).abs() < 1e-9);
        let c = outline.centroid();
        assert!((c.x - 30.0).abs() < 1e-9);
        assert!((c.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_solid_section_has_only_outline() {
        let outline = validate_outline(BoundaryId::new(), &Curve::rectangle(0.0, 0.0, 10.0, 10.0), AccuracyMode::Fast)
            .unwrap();
        let mut section = Section::solid(outline);
        assert!(!section.has_hollows());
        assert!(section.hollow(BoundaryId::new()).is_none());
        assert_eq!(section.boundaries().count(), 1);
    }

    #[test]
    fn test_boundary_id_serialization() {
        let id = BoundaryId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: BoundaryId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
