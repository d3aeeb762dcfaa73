//! # Ring Operations
//!
//! Pure functions over closed polygon rings. A ring is a slice of
//! [`Point2`] with the closing segment implied (last point connects back to
//! the first; the first point is *not* repeated).
//!
//! ## Closed-Form Moments
//!
//! For a ring with vertices `(xᵢ, yᵢ)` and `cᵢ = xᵢ·yᵢ₊₁ − xᵢ₊₁·yᵢ`:
//!
//! ```text
//! A   = ½   Σ cᵢ
//! Sx  = 1/6  Σ (yᵢ + yᵢ₊₁) cᵢ          (first moment about the x axis)
//! Sy  = 1/6  Σ (xᵢ + xᵢ₊₁) cᵢ
//! Ixx = 1/12 Σ (yᵢ² + yᵢyᵢ₊₁ + yᵢ₊₁²) cᵢ
//! Iyy = 1/12 Σ (xᵢ² + xᵢxᵢ₊₁ + xᵢ₊₁²) cᵢ
//! Ixy = 1/24 Σ (xᵢyᵢ₊₁ + 2xᵢyᵢ + 2xᵢ₊₁yᵢ₊₁ + xᵢ₊₁yᵢ) cᵢ
//! ```
//!
//! All values are signed: counter-clockwise rings are positive.

use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use super::point::Point2;

/// Classification of a point against a closed ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Containment {
    Inside,
    Outside,
    OnBoundary,
}

/// Signed area and moments of a ring about a reference origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RingMoments {
    pub area: f64,
    pub sx: f64,
    pub sy: f64,
    pub ixx: f64,
    pub iyy: f64,
    pub ixy: f64,
}

impl RingMoments {
    /// Flip all signs (used to force a ring's orientation)
    pub fn negated(self) -> Self {
        RingMoments {
            area: -self.area,
            sx: -self.sx,
            sy: -self.sy,
            ixx: -self.ixx,
            iyy: -self.iyy,
            ixy: -self.ixy,
        }
    }

    pub fn accumulate(&mut self, other: &RingMoments) {
        self.area += other.area;
        self.sx += other.sx;
        self.sy += other.sy;
        self.ixx += other.ixx;
        self.iyy += other.iyy;
        self.ixy += other.ixy;
    }
}

/// Iterate over the ring's segments, including the closing one
pub fn segments(ring: &[Point2]) -> impl Iterator<Item = (Point2, Point2)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Signed area (positive for counter-clockwise rings)
pub fn signed_area(ring: &[Point2]) -> f64 {
    segments(ring).map(|(a, b)| a.cross(&b)).sum::<f64>() * 0.5
}

/// Perimeter including the closing segment
pub fn length(ring: &[Point2]) -> f64 {
    segments(ring).map(|(a, b)| a.distance(&b)).sum()
}

/// Closed-form signed moments of a ring about `origin`
pub fn ring_moments(ring: &[Point2], origin: Point2) -> RingMoments {
    let mut m = RingMoments::default();
    for (a, b) in segments(ring) {
        let (x0, y0) = (a.x - origin.x, a.y - origin.y);
        let (x1, y1) = (b.x - origin.x, b.y - origin.y);
        let c = x0 * y1 - x1 * y0;
        m.area += c;
        m.sx += (y0 + y1) * c;
        m.sy += (x0 + x1) * c;
        m.ixx += (y0 * y0 + y0 * y1 + y1 * y1) * c;
        m.iyy += (x0 * x0 + x0 * x1 + x1 * x1) * c;
        m.ixy += (x0 * y1 + 2.0 * x0 * y0 + 2.0 * x1 * y1 + x1 * y0) * c;
    }
    m.area /= 2.0;
    m.sx /= 6.0;
    m.sy /= 6.0;
    m.ixx /= 12.0;
    m.iyy /= 12.0;
    m.ixy /= 24.0;
    m
}

/// Area centroid of a ring; falls back to the vertex mean for degenerate rings
pub fn centroid(ring: &[Point2]) -> Option<Point2> {
    if ring.is_empty() {
        return None;
    }
    let origin = ring[0];
    let m = ring_moments(ring, origin);
    if m.area.abs() > f64::EPSILON {
        return Some(Point2::new(origin.x + m.sy / m.area, origin.y + m.sx / m.area));
    }
    let n = ring.len() as f64;
    let (sx, sy) = ring.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}

/// Shortest distance from `p` to segment `ab`
pub fn point_segment_distance(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b.sub(a);
    let len2 = ab.dot(&ab);
    if len2 <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (p.sub(a).dot(&ab) / len2).clamp(0.0, 1.0);
    p.distance(&a.lerp(b, t))
}

/// Classify `p` against a ring (winding-number test).
///
/// Points within `tolerance` of any edge are [`Containment::OnBoundary`].
pub fn point_in_ring(p: &Point2, ring: &[Point2], tolerance: f64) -> Containment {
    if ring.len() < 3 {
        return Containment::Outside;
    }
    let mut winding = 0i32;
    for (a, b) in segments(ring) {
        if point_segment_distance(p, &a, &b) <= tolerance {
            return Containment::OnBoundary;
        }
        let side = b.sub(&a).cross(&p.sub(&a));
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    if winding != 0 {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

fn orientation(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    b.sub(a).cross(&c.sub(a))
}

/// Shortest distance between segments `ab` and `cd` (zero if they cross)
pub fn segment_distance(a: &Point2, b: &Point2, c: &Point2, d: &Point2) -> f64 {
    let d1 = orientation(a, b, c);
    let d2 = orientation(a, b, d);
    let d3 = orientation(c, d, a);
    let d4 = orientation(c, d, b);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0)) {
        return 0.0;
    }
    point_segment_distance(a, c, d)
        .min(point_segment_distance(b, c, d))
        .min(point_segment_distance(c, a, b))
        .min(point_segment_distance(d, a, b))
}

fn segment_bbox(a: &Point2, b: &Point2) -> BoundingBox {
    BoundingBox::new(
        Point2::new(a.x.min(b.x), a.y.min(b.y)),
        Point2::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

/// True if any segment of `first` comes within `tolerance` of any segment of `second`
pub fn rings_intersect(first: &[Point2], second: &[Point2], tolerance: f64) -> bool {
    let (Some(ba), Some(bb)) = (BoundingBox::from_points(first), BoundingBox::from_points(second)) else {
        return false;
    };
    if !ba.intersects(&bb, tolerance) {
        return false;
    }
    let second_segments: Vec<(Point2, Point2, BoundingBox)> = segments(second)
        .map(|(c, d)| (c, d, segment_bbox(&c, &d)))
        .collect();
    segments(first).any(|(a, b)| {
        let sa = segment_bbox(&a, &b);
        if !sa.intersects(&bb, tolerance) {
            return false;
        }
        second_segments
            .iter()
            .any(|(c, d, sb)| sa.intersects(sb, tolerance) && segment_distance(&a, &b, c, d) <= tolerance)
    })
}

/// True if no two non-adjacent segments of the ring touch or cross
pub fn is_simple(ring: &[Point2], tolerance: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let segs: Vec<(Point2, Point2, BoundingBox)> = segments(ring)
        .map(|(a, b)| (a, b, segment_bbox(&a, &b)))
        .collect();
    for i in 0..n {
        for j in (i + 2)..n {
            // first and last segments share the closing vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a, b, ba) = &segs[i];
            let (c, d, bb) = &segs[j];
            if ba.intersects(bb, tolerance) && segment_distance(a, b, c, d) <= tolerance {
                return false;
            }
        }
    }
    true
}

/// Drop consecutive duplicates and a repeated closing point
pub fn clean_ring(points: &[Point2], tolerance: f64) -> Vec<Point2> {
    let mut ring: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        match ring.last() {
            Some(last) if last.distance(p) <= tolerance => {}
            _ => ring.push(*p),
        }
    }
    while ring.len() > 1 && ring[0].distance(&ring[ring.len() - 1]) <= tolerance {
        ring.pop();
    }
    ring
}
