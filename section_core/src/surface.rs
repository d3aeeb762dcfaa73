//! # Planar Surface Construction
//!
//! Builds the polygon-with-holes the integrator works on: the outline minus
//! the union of all hollows, computed in one boolean operation. The result
//! must be exactly one region; anything else is reported as
//! [`SectionError::SurfaceConstructionFailed`] and never retried.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use geo::BooleanOps;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};
use crate::geometry::polygon::{self, RingMoments};
use crate::geometry::{BoundingBox, Curve, Point2, TOLERANCE};
use crate::section::{Boundary, Section};

/// Optional wall-clock limit for bounded stages
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub fn new(limit: Option<Duration>) -> Self {
        Deadline {
            started: Instant::now(),
            limit,
        }
    }

    /// A deadline that never expires
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Fail with [`SectionError::Timeout`] once the limit has passed
    pub fn check(&self, stage: &str) -> CalcResult<()> {
        match self.limit {
            Some(limit) if self.started.elapsed() > limit => Err(SectionError::Timeout {
                stage: stage.to_string(),
                limit_ms: limit.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }
}

/// One polygon with holes, in section plane coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Outer ring, counter-clockwise
    pub exterior: Vec<Point2>,
    /// Hole rings, clockwise
    pub holes: Vec<Vec<Point2>>,
}

impl Surface {
    /// Surface from rings of any orientation
    pub fn new(exterior: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        Surface {
            exterior: oriented(exterior, true),
            holes: holes.into_iter().map(|h| oriented(h, false)).collect(),
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.exterior)
    }

    /// Signed moments of the whole surface about `origin` (holes subtract)
    pub fn moments(&self, origin: Point2) -> RingMoments {
        let mut total = polygon::ring_moments(&self.exterior, origin);
        for hole in &self.holes {
            total.accumulate(&polygon::ring_moments(hole, origin));
        }
        total
    }

    pub fn area(&self) -> f64 {
        let origin = self.bbox().map(|b| b.center()).unwrap_or_default();
        self.moments(origin).area
    }

    /// All rings, exterior first
    pub fn rings(&self) -> impl Iterator<Item = &Vec<Point2>> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }
}

fn oriented(mut ring: Vec<Point2>, counter_clockwise: bool) -> Vec<Point2> {
    if (polygon::signed_area(&ring) > 0.0) != counter_clockwise {
        ring.reverse();
    }
    ring
}

/// Build the surface for a section: outline minus the union of the hollows.
pub fn build_surface(section: &Section, deadline: &Deadline) -> CalcResult<Surface> {
    for boundary in section.boundaries() {
        check_simple(boundary)?;
    }

    if !section.has_hollows() {
        return Ok(Surface::new(section.outline.ring.clone(), Vec::new()));
    }

    let outer = geo::MultiPolygon::new(vec![section.outline.to_polygon()]);
    let voids = geo::MultiPolygon::new(section.hollows.iter().map(Boundary::to_polygon).collect());
    let computed = panic::catch_unwind(AssertUnwindSafe(|| outer.difference(&voids)))
        .map_err(|_| SectionError::surface_failed("boolean difference panicked"))?;
    deadline.check("surface construction")?;

    let mut regions = computed.0.into_iter();
    let region = match (regions.next(), regions.next()) {
        (Some(region), None) => region,
        (None, _) => return Err(SectionError::surface_failed("boolean difference produced no region")),
        (Some(_), Some(_)) => {
            return Err(SectionError::surface_failed(format!(
                "boolean difference produced {} disjoint regions",
                regions.count() + 2
            )))
        }
    };

    let (exterior, interiors) = region.into_inner();
    let surface = Surface::new(
        ring_from_line_string(&exterior),
        interiors.iter().map(ring_from_line_string).collect(),
    );
    debug!(
        "Built surface with {} exterior vertices and {} holes",
        surface.exterior.len(),
        surface.holes.len()
    );
    Ok(surface)
}

fn check_simple(boundary: &Boundary) -> CalcResult<()> {
    // tessellated circles are simple by construction
    if matches!(boundary.curve, Curve::Circle { .. }) {
        return Ok(());
    }
    if !polygon::is_simple(&boundary.ring, TOLERANCE * 1e-3) {
        return Err(SectionError::surface_failed(format!(
            "{} is self-intersecting",
            boundary.label
        )));
    }
    Ok(())
}

fn ring_from_line_string(line: &geo::LineString<f64>) -> Vec<Point2> {
    let points: Vec<Point2> = line.coords().map(|c| Point2::from(*c)).collect();
    polygon::clean_ring(&points, f64::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Curve;
    use crate::section::BoundaryId;
    use crate::settings::AccuracyMode;
    use crate::validation::{validate_hollow, validate_outline};

    fn section_with_hollow() -> Section {
        let outline =
            validate_outline(BoundaryId::new(), &Curve::rectangle(0.0, 0.0, 100.0, 60.0), AccuracyMode::Fast).unwrap();
        let hollow = validate_hollow(
            BoundaryId::new(),
            "hollow #1",
            &Curve::centered_rectangle(50.0, 30.0, 40.0, 20.0),
            &outline,
            AccuracyMode::Fast,
        )
        .unwrap();
        Section {
            outline,
            hollows: vec![hollow],
        }
    }

    #[test]
    fn test_solid_surface_is_outline() {
        let outline =
            validate_outline(BoundaryId::new(), &Curve::rectangle(0.0, 0.0, 10.0, 5.0), AccuracyMode::Fast).unwrap();
        let surface = build_surface(&Section::solid(outline), &Deadline::unbounded()).unwrap();
        assert!(surface.holes.is_empty());
        assert!((surface.area() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_surface_with_hole() {
        let surface = build_surface(&section_with_hollow(), &Deadline::unbounded()).unwrap();
        assert_eq!(surface.holes.len(), 1);
        assert!(polygon::signed_area(&surface.exterior) > 0.0);
        assert!(polygon::signed_area(&surface.holes[0]) < 0.0);
        assert!((surface.area() - (6000.0 - 800.0)).abs() < 1e-6);
    }

    #[test]
    fn test_self_intersecting_outline_fails() {
        use crate::geometry::Point3;
        // bow tie
        let curve = Curve::closed_polyline([
            Point3::xy(0.0, 0.0),
            Point3::xy(10.0, 10.0),
            Point3::xy(10.0, 0.0),
            Point3::xy(0.0, 10.0),
        ]);
        let outline = validate_outline(BoundaryId::new(), &curve, AccuracyMode::Fast).unwrap();
        let err = build_surface(&Section::solid(outline), &Deadline::unbounded()).unwrap_err();
        assert_eq!(err.error_code(), "SURFACE_CONSTRUCTION_FAILED");
    }

    #[test]
    fn test_zero_deadline_times_out() {
        let deadline = Deadline::new(Some(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        let err = deadline.check("meshing").unwrap_err();
        assert_eq!(err.error_code(), "TIMEOUT");
    }
}
