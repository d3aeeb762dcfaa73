//! # Boundary Validation
//!
//! Turns raw [`Curve`]s into validated [`Boundary`] values.
//!
//! - [`validate_outline`] checks closure and planarity and fixes the section plane.
//! - [`validate_hollow`] additionally checks coplanarity with the outline and
//!   containment inside it.
//! - [`validate_hollows`] runs a whole list, rejecting hollows that fail or that
//!   touch an earlier accepted hollow, and keeps going.
//!
//! ## Containment
//!
//! A hollow is tested against the outline in stages, cheapest first:
//!
//! 1. bounding box (outline box inflated by [`TOLERANCE`])
//! 2. hollow centroid must not be outside the outline
//! 3. sampled points along the hollow (dense and strict in high accuracy,
//!    sparse with one outlier allowed in fast mode)
//! 4. boolean difference `outline - hollow` as a sanity check
//!
//! The boolean kernel can fail on awkward input. That outcome is
//! [`DifferenceCheck::Unavailable`], which rejects in high accuracy and is
//! logged and tolerated in fast mode.
//!
//! ## Example
//!
//! ```rust
//! use section_core::geometry::Curve;
//! use section_core::section::BoundaryId;
//! use section_core::settings::AccuracyMode;
//! use section_core::validation::{validate_hollows, validate_outline};
//!
//! let outline = validate_outline(BoundaryId::new(), &Curve::rectangle(0.0, 0.0, 100.0, 100.0), AccuracyMode::Fast).unwrap();
//! let hollows = vec![
//!     (BoundaryId::new(), Curve::centered_rectangle(50.0, 50.0, 20.0, 20.0)),
//!     (BoundaryId::new(), Curve::centered_rectangle(150.0, 50.0, 20.0, 20.0)),
//! ];
//! let result = validate_hollows(&hollows, &outline, AccuracyMode::Fast);
//! assert_eq!(result.accepted.len(), 1);
//! assert_eq!(result.rejected.len(), 1);
//! ```

use std::panic::{self, AssertUnwindSafe};

use geo::{Area, BooleanOps};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};
use crate::geometry::polygon::{self, Containment};
use crate::geometry::{point_in_ring, BoundingBox, Curve, Plane, Point3, Resolution, TOLERANCE};
use crate::section::{Boundary, BoundaryId};
use crate::settings::AccuracyMode;

/// Outcome of the boolean difference sanity check
#[derive(Debug, Clone, PartialEq)]
pub enum DifferenceCheck {
    /// Difference computed and plausible
    Passed,
    /// Difference computed but the result is implausible
    Failed(String),
    /// Boolean kernel could not produce a result
    Unavailable(String),
}

/// A hollow that did not make it into the section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedHollow {
    /// Position in the input list
    pub index: usize,
    pub id: BoundaryId,
    pub error: SectionError,
}

/// Result of validating a list of hollows against an outline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HollowValidation {
    /// Hollows that passed, in input order
    pub accepted: Vec<Boundary>,
    /// Hollows that were dropped, with the reason
    pub rejected: Vec<RejectedHollow>,
}

/// Validate the outline curve and fix the section plane from it.
pub fn validate_outline(id: BoundaryId, curve: &Curve, mode: AccuracyMode) -> CalcResult<Boundary> {
    build_boundary(id, "outline", curve, None, mode)
}

/// Validate one hollow against the outline.
///
/// Does not look at other hollows; see [`validate_hollows`].
pub fn validate_hollow(
    id: BoundaryId,
    label: &str,
    curve: &Curve,
    outline: &Boundary,
    mode: AccuracyMode,
) -> CalcResult<Boundary> {
    let hollow = build_boundary(id, label, curve, Some(&outline.plane), mode)?;
    check_inside_outline(&hollow, outline, mode)?;
    Ok(hollow)
}

/// Validate every hollow, dropping the ones that fail.
///
/// A hollow that touches, overlaps or contains an already accepted hollow is
/// rejected with [`SectionError::IntersectsOtherHollow`].
pub fn validate_hollows(
    candidates: &[(BoundaryId, Curve)],
    outline: &Boundary,
    mode: AccuracyMode,
) -> HollowValidation {
    let mut result = HollowValidation::default();
    for (index, (id, curve)) in candidates.iter().enumerate() {
        let label = format!("hollow #{}", index + 1);
        let checked = validate_hollow(*id, &label, curve, outline, mode).and_then(|hollow| {
            result
                .accepted
                .iter()
                .try_for_each(|other| check_hollow_pair(&hollow, other))
                .map(|_| hollow)
        });
        match checked {
            Ok(hollow) => result.accepted.push(hollow),
            Err(error) => {
                warn!("Dropping {}: {}", label, error);
                result.rejected.push(RejectedHollow { index, id: *id, error });
            }
        }
    }
    result
}

/// Reject `candidate` if it intersects or overlaps `existing`.
pub fn check_hollow_pair(candidate: &Boundary, existing: &Boundary) -> CalcResult<()> {
    let overlap = polygon::rings_intersect(&candidate.ring, &existing.ring, TOLERANCE)
        || point_in_ring(&candidate.centroid(), &existing.ring, TOLERANCE) != Containment::Outside
        || point_in_ring(&existing.centroid(), &candidate.ring, TOLERANCE) != Containment::Outside;
    if overlap {
        return Err(SectionError::IntersectsOtherHollow {
            boundary: candidate.label.clone(),
            other: existing.label.clone(),
        });
    }
    Ok(())
}

/// Run the boolean difference `outline - hollow` and judge the result.
pub fn difference_check(outline: &Boundary, hollow: &Boundary) -> DifferenceCheck {
    let outer = outline.to_polygon();
    let inner = hollow.to_polygon();
    let computed = panic::catch_unwind(AssertUnwindSafe(|| outer.difference(&inner)));
    let remainder = match computed {
        Ok(multi) => multi,
        Err(_) => return DifferenceCheck::Unavailable("boolean difference panicked".to_string()),
    };
    if remainder.0.is_empty() {
        return DifferenceCheck::Failed("difference is empty".to_string());
    }
    let remainder_area = remainder.unsigned_area();
    if !remainder_area.is_finite() {
        return DifferenceCheck::Unavailable("difference area is not finite".to_string());
    }
    let outline_area = outline.area();
    if remainder_area > outline_area + TOLERANCE {
        return DifferenceCheck::Failed(format!(
            "difference area {:.6} exceeds outline area {:.6}",
            remainder_area, outline_area
        ));
    }
    DifferenceCheck::Passed
}

fn check_inside_outline(hollow: &Boundary, outline: &Boundary, mode: AccuracyMode) -> CalcResult<()> {
    if !outline.bbox.inflate(TOLERANCE).contains_box(&hollow.bbox) {
        return Err(SectionError::outside_outline(
            &hollow.label,
            "bounding box exceeds the outline",
        ));
    }

    if point_in_ring(&hollow.centroid(), &outline.ring, TOLERANCE) == Containment::Outside {
        return Err(SectionError::outside_outline(&hollow.label, "centroid is outside"));
    }

    let plane = &outline.plane;
    let outside = hollow
        .curve
        .sample(Resolution::containment_probe(mode))
        .filter(|p| point_in_ring(&plane.project(p), &outline.ring, TOLERANCE) == Containment::Outside)
        .count();
    let allowed = match mode {
        AccuracyMode::High => 0,
        AccuracyMode::Fast => 1,
    };
    if outside > allowed {
        return Err(SectionError::outside_outline(
            &hollow.label,
            format!("{} sampled points outside", outside),
        ));
    }

    match (difference_check(outline, hollow), mode) {
        (DifferenceCheck::Passed, _) => Ok(()),
        (DifferenceCheck::Failed(reason), _) => Err(SectionError::outside_outline(&hollow.label, reason)),
        (DifferenceCheck::Unavailable(reason), AccuracyMode::High) => {
            Err(SectionError::outside_outline(&hollow.label, reason))
        }
        (DifferenceCheck::Unavailable(reason), AccuracyMode::Fast) => {
            debug!("Skipping difference check for {}: {}", hollow.label, reason);
            Ok(())
        }
    }
}

fn build_boundary(
    id: BoundaryId,
    label: &str,
    curve: &Curve,
    section_plane: Option<&Plane>,
    mode: AccuracyMode,
) -> CalcResult<Boundary> {
    if !curve.is_finite() {
        return Err(SectionError::invalid_input(
            label,
            "non-finite coordinate",
            "Boundary coordinates must be finite numbers",
        ));
    }

    let gap = curve.closing_gap();
    if gap > TOLERANCE {
        return Err(SectionError::NotClosed {
            boundary: label.to_string(),
            gap,
        });
    }

    let points = curve.tessellate(mode);
    let own_plane = fit_plane(&points);
    let deviation = max_deviation(&own_plane, &points);
    if deviation > TOLERANCE {
        return Err(SectionError::NotPlanar {
            boundary: label.to_string(),
            deviation,
        });
    }

    let plane = match section_plane {
        Some(plane) => {
            let off_plane = max_deviation(plane, &points);
            if off_plane > TOLERANCE {
                return Err(SectionError::NotPlanar {
                    boundary: label.to_string(),
                    deviation: off_plane,
                });
            }
            *plane
        }
        None => own_plane,
    };

    let projected: Vec<_> = points.iter().map(|p| plane.project(p)).collect();
    let ring = polygon::clean_ring(&projected, f64::EPSILON);
    let bbox = BoundingBox::from_points(&ring).ok_or_else(|| SectionError::NotClosed {
        boundary: label.to_string(),
        gap,
    })?;

    debug!("Validated {} ({} vertices, length {:.3})", label, ring.len(), curve.length());

    Ok(Boundary {
        id,
        label: label.to_string(),
        curve: curve.clone(),
        plane,
        ring,
        bbox,
        length: curve.length(),
        degree: curve.degree(),
        span_count: curve.span_count(),
        closed: true,
        planar: true,
    })
}

/// Plane through the vertex mean with the Newell normal of the points
fn fit_plane(points: &[Point3]) -> Plane {
    let n = points.len().max(1) as f64;
    let sum = points.iter().fold(Point3::new(0.0, 0.0, 0.0), |acc, p| acc.add(p));
    let origin = sum.scale(1.0 / n);

    let mut normal = Point3::new(0.0, 0.0, 0.0);
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    Plane::from_normal(origin, normal)
}

fn max_deviation(plane: &Plane, points: &[Point3]) -> f64 {
    points.iter().map(|p| plane.distance(p).abs()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline() -> Boundary {
        validate_outline(BoundaryId::new(), &Curve::rectangle(0.0, 0.0, 100.0, 80.0), AccuracyMode::High).unwrap()
    }

    #[test]
    fn test_open_polyline_rejected() {
        let curve = Curve::Polyline {
            points: vec![Point3::xy(0.0, 0.0), Point3::xy(10.0, 0.0), Point3::xy(10.0, 10.0)],
        };
        let err = validate_outline(BoundaryId::new(), &curve, AccuracyMode::Fast).unwrap_err();
        assert_eq!(err.error_code(), "NOT_CLOSED");
    }

    #[test]
    fn test_nan_coordinates_rejected() {
        let curve = Curve::closed_polyline([
            Point3::xy(0.0, 0.0),
            Point3::xy(f64::NAN, 0.0),
            Point3::xy(10.0, 10.0),
            Point3::xy(0.0, 10.0),
        ]);
        let err = validate_outline(BoundaryId::new(), &curve, AccuracyMode::Fast).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err = validate_outline(BoundaryId::new(), &Curve::circle(f64::NAN, 0.0, 5.0), AccuracyMode::High).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_non_planar_rejected() {
        let curve = Curve::closed_polyline([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 5.0),
            Point3::new(0.0, 10.0, 0.0),
        ]);
        let err = validate_outline(BoundaryId::new(), &curve, AccuracyMode::Fast).unwrap_err();
        assert_eq!(err.error_code(), "NOT_PLANAR");
    }

    #[test]
    fn test_outline_in_world_xy_keeps_coordinates() {
        let outline = outline();
        assert_eq!(outline.ring.len(), 4);
        assert!((outline.bbox.min.x - 0.0).abs() < 1e-12);
        assert!((outline.bbox.max.x - 100.0).abs() < 1e-12);
        assert!((outline.bbox.max.y - 80.0).abs() < 1e-12);
        assert!(outline.closed && outline.planar);
    }

    #[test]
    fn test_tilted_outline_is_planar() {
        // square in the plane x = 5
        let curve = Curve::closed_polyline([
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(5.0, 10.0, 0.0),
            Point3::new(5.0, 10.0, 10.0),
            Point3::new(5.0, 0.0, 10.0),
        ]);
        let outline = validate_outline(BoundaryId::new(), &curve, AccuracyMode::Fast).unwrap();
        assert!((outline.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hollow_inside_accepted_both_modes() {
        let outline = outline();
        for mode in [AccuracyMode::Fast, AccuracyMode::High] {
            let hollow = validate_hollow(
                BoundaryId::new(),
                "hollow #1",
                &Curve::centered_rectangle(50.0, 40.0, 40.0, 20.0),
                &outline,
                mode,
            );
            assert!(hollow.is_ok(), "{:?}", hollow);
        }
    }

    #[test]
    fn test_hollow_bbox_exceeding_outline_rejected_both_modes() {
        let outline = outline();
        for mode in [AccuracyMode::Fast, AccuracyMode::High] {
            let err = validate_hollow(
                BoundaryId::new(),
                "hollow #1",
                &Curve::rectangle(90.0, 10.0, 20.0, 20.0),
                &outline,
                mode,
            )
            .unwrap_err();
            assert_eq!(err.error_code(), "OUTSIDE_OUTLINE");
        }
    }

    #[test]
    fn test_hollow_in_notch_rejected() {
        // L-shaped outline; the hollow sits in the missing corner
        let l_shape = Curve::closed_polyline([
            Point3::xy(0.0, 0.0),
            Point3::xy(100.0, 0.0),
            Point3::xy(100.0, 20.0),
            Point3::xy(20.0, 20.0),
            Point3::xy(20.0, 100.0),
            Point3::xy(0.0, 100.0),
        ]);
        let outline = validate_outline(BoundaryId::new(), &l_shape, AccuracyMode::Fast).unwrap();
        let err = validate_hollow(
            BoundaryId::new(),
            "hollow #1",
            &Curve::centered_rectangle(60.0, 60.0, 20.0, 20.0),
            &outline,
            AccuracyMode::Fast,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "OUTSIDE_OUTLINE");
    }

    #[test]
    fn test_hollow_off_section_plane_rejected() {
        let outline = outline();
        let curve = Curve::Circle {
            center: Point3::new(50.0, 40.0, 3.0),
            radius: 5.0,
        };
        let err = validate_hollow(BoundaryId::new(), "hollow #1", &curve, &outline, AccuracyMode::Fast).unwrap_err();
        assert_eq!(err.error_code(), "NOT_PLANAR");
    }

    #[test]
    fn test_coincident_hollows_second_rejected() {
        let outline = outline();
        let curve = Curve::centered_rectangle(50.0, 40.0, 20.0, 20.0);
        let first = BoundaryId::new();
        let second = BoundaryId::new();
        let result = validate_hollows(
            &[(first, curve.clone()), (second, curve)],
            &outline,
            AccuracyMode::High,
        );
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].id, first);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].id, second);
        assert_eq!(result.rejected[0].error.error_code(), "INTERSECTS_OTHER_HOLLOW");
    }

    #[test]
    fn test_nested_hollow_rejected() {
        let outline = outline();
        let result = validate_hollows(
            &[
                (BoundaryId::new(), Curve::centered_rectangle(50.0, 40.0, 40.0, 40.0)),
                (BoundaryId::new(), Curve::circle(50.0, 40.0, 5.0)),
            ],
            &outline,
            AccuracyMode::Fast,
        );
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.rejected[0].index, 1);
    }

    #[test]
    fn test_disjoint_hollows_accepted() {
        let outline = outline();
        let result = validate_hollows(
            &[
                (BoundaryId::new(), Curve::circle(25.0, 40.0, 10.0)),
                (BoundaryId::new(), Curve::circle(75.0, 40.0, 10.0)),
            ],
            &outline,
            AccuracyMode::High,
        );
        assert_eq!(result.accepted.len(), 2);
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_difference_check_passes_for_inner_hollow() {
        let outline = outline();
        let hollow =
            validate_hollow(BoundaryId::new(), "h", &Curve::circle(50.0, 40.0, 10.0), &outline, AccuracyMode::Fast)
                .unwrap();
        assert_eq!(difference_check(&outline, &hollow), DifferenceCheck::Passed);
    }
}
