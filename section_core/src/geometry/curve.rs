//! # Boundary Curves
//!
//! [`Curve`] is the geometry handed over by the external geometry source.
//! Two representations are supported:
//!
//! - **Polyline**: degree 1, one span per segment. Closed when the last point
//!   repeats the first (within tolerance).
//! - **Circle**: lies in the plane `z = center.z`. Reported as degree 2 with
//!   4 spans, matching the usual rational quadratic representation.
//!
//! ## Sampling vs. Tessellation
//!
//! - [`Curve::sample`] yields a lazy, restartable sequence of points spaced
//!   evenly by arc length. The validator uses it for containment probes and
//!   the integrator for dense extreme-fiber search.
//! - [`Curve::tessellate`] yields the ring used for integration. Polylines
//!   keep their exact vertices, so straight-edged sections integrate exactly.
//!
//! ## JSON Example
//!
//! ```json
//! { "type": "Polyline", "points": [ {"x": 0, "y": 0}, {"x": 100, "y": 0},
//!                                   {"x": 100, "y": 50}, {"x": 0, "y": 0} ] }
//! { "type": "Circle", "center": {"x": 50, "y": 25}, "radius": 10 }
//! ```

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::point::Point3;
use crate::settings::AccuracyMode;

/// Hard cap on the number of points any sampling produces
pub const MAX_SAMPLES: usize = 20_000;

/// Sampling density: at least `min_points`, otherwise one point per `spacing`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub min_points: usize,
    pub spacing: f64,
}

impl Resolution {
    pub fn new(min_points: usize, spacing: f64) -> Self {
        Resolution { min_points, spacing }
    }

    /// Sampling used to check a hollow against the outline
    pub fn containment_probe(mode: AccuracyMode) -> Self {
        match mode {
            AccuracyMode::High => Resolution::new(50, 1.0),
            AccuracyMode::Fast => Resolution::new(8, 10.0),
        }
    }

    /// Sampling used to search for the extreme fibers
    pub fn dense(mode: AccuracyMode) -> Self {
        match mode {
            AccuracyMode::High => Resolution::new(400, 0.25),
            AccuracyMode::Fast => Resolution::new(100, 2.0),
        }
    }

    /// Polygon sides used when tessellating a circle
    pub fn tessellation(mode: AccuracyMode) -> Self {
        match mode {
            AccuracyMode::High => Resolution::new(256, 0.5),
            AccuracyMode::Fast => Resolution::new(64, 2.0),
        }
    }

    /// Number of points for a curve of the given length
    pub fn count(&self, length: f64) -> usize {
        let by_length = if self.spacing > 0.0 && length.is_finite() {
            (length / self.spacing).ceil() as usize
        } else {
            0
        };
        self.min_points.max(by_length).clamp(1, MAX_SAMPLES)
    }
}

/// A boundary curve as supplied by the geometry source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Curve {
    /// Straight segments through the given points
    Polyline { points: Vec<Point3> },
    /// Full circle parallel to the world XY plane
    Circle { center: Point3, radius: f64 },
}

impl Curve {
    /// Closed polyline through the given points (the closing point is added)
    pub fn closed_polyline(points: impl IntoIterator<Item = Point3>) -> Self {
        let mut points: Vec<Point3> = points.into_iter().collect();
        if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
            if first != *last {
                points.push(first);
            }
        }
        Curve::Polyline { points }
    }

    /// Axis-aligned rectangle in the world XY plane with its lower-left corner at `(x, y)`
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Curve::closed_polyline([
            Point3::xy(x, y),
            Point3::xy(x + width, y),
            Point3::xy(x + width, y + height),
            Point3::xy(x, y + height),
        ])
    }

    /// Rectangle centred on `(cx, cy)`
    pub fn centered_rectangle(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Curve::rectangle(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Regular polygon with `sides` vertices on a circle of `radius`
    pub fn regular_polygon(cx: f64, cy: f64, radius: f64, sides: usize) -> Self {
        let sides = sides.max(3);
        Curve::closed_polyline((0..sides).map(|i| {
            let a = TAU * i as f64 / sides as f64;
            Point3::xy(cx + radius * a.cos(), cy + radius * a.sin())
        }))
    }

    /// Circle in the world XY plane
    pub fn circle(cx: f64, cy: f64, radius: f64) -> Self {
        Curve::Circle {
            center: Point3::xy(cx, cy),
            radius,
        }
    }

    /// Polynomial degree of the curve representation
    pub fn degree(&self) -> u32 {
        match self {
            Curve::Polyline { .. } => 1,
            Curve::Circle { .. } => 2,
        }
    }

    /// True if every defining coordinate is finite
    pub fn is_finite(&self) -> bool {
        match self {
            Curve::Polyline { points } => points.iter().all(Point3::is_finite),
            Curve::Circle { center, radius } => center.is_finite() && radius.is_finite(),
        }
    }

    /// Number of spans (segments) of the curve representation
    pub fn span_count(&self) -> usize {
        match self {
            Curve::Polyline { points } => points.len().saturating_sub(1),
            Curve::Circle { .. } => 4,
        }
    }

    /// Total curve length
    pub fn length(&self) -> f64 {
        match self {
            Curve::Polyline { points } => points.windows(2).map(|w| w[0].distance(&w[1])).sum(),
            Curve::Circle { radius, .. } => TAU * radius.abs(),
        }
    }

    /// Distance between start and end point (zero for circles)
    pub fn closing_gap(&self) -> f64 {
        match self {
            Curve::Polyline { points } => match (points.first(), points.last()) {
                (Some(first), Some(last)) if points.len() > 1 => first.distance(last),
                _ => f64::INFINITY,
            },
            Curve::Circle { radius, .. } => {
                if *radius > 0.0 {
                    0.0
                } else {
                    f64::INFINITY
                }
            }
        }
    }

    /// Model-space bounding box as `(min, max)`
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        match self {
            Curve::Polyline { points } => {
                let first = *points.first()?;
                Some(points.iter().fold((first, first), |(lo, hi), p| {
                    (
                        Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                        Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
                    )
                }))
            }
            Curve::Circle { center, radius } => {
                let r = radius.abs();
                Some((
                    Point3::new(center.x - r, center.y - r, center.z),
                    Point3::new(center.x + r, center.y + r, center.z),
                ))
            }
        }
    }

    /// Lazily sample the curve at the given resolution.
    ///
    /// The sampler is finite, yields evenly spaced points by arc length and
    /// can be restarted by cloning it or calling `sample` again.
    pub fn sample(&self, resolution: Resolution) -> CurveSampler<'_> {
        let count = resolution.count(self.length());
        let cumulative = match self {
            Curve::Polyline { points } => {
                let mut acc = Vec::with_capacity(points.len());
                let mut total = 0.0;
                acc.push(0.0);
                for w in points.windows(2) {
                    total += w[0].distance(&w[1]);
                    acc.push(total);
                }
                acc
            }
            Curve::Circle { .. } => Vec::new(),
        };
        CurveSampler {
            curve: self,
            cumulative,
            count,
            index: 0,
            segment: 0,
        }
    }

    /// Vertices of the integration ring (closing point not repeated for circles)
    pub fn tessellate(&self, mode: AccuracyMode) -> Vec<Point3> {
        match self {
            Curve::Polyline { points } => points.clone(),
            Curve::Circle { center, radius } => {
                let n = Resolution::tessellation(mode).count(self.length()).max(8);
                (0..n)
                    .map(|i| circle_point(center, *radius, i as f64 / n as f64))
                    .collect()
            }
        }
    }
}

fn circle_point(center: &Point3, radius: f64, t: f64) -> Point3 {
    let a = TAU * t;
    Point3::new(center.x + radius * a.cos(), center.y + radius * a.sin(), center.z)
}

/// Lazy arc-length sampler over a [`Curve`]
#[derive(Debug, Clone)]
pub struct CurveSampler<'a> {
    curve: &'a Curve,
    cumulative: Vec<f64>,
    count: usize,
    index: usize,
    segment: usize,
}

impl Iterator for CurveSampler<'_> {
    type Item = Point3;

    fn next(&mut self) -> Option<Point3> {
        if self.index >= self.count {
            return None;
        }
        let t = self.index as f64 / self.count as f64;
        self.index += 1;
        match self.curve {
            Curve::Circle { center, radius } => Some(circle_point(center, *radius, t)),
            Curve::Polyline { points } => {
                let first = *points.first()?;
                let total = self.cumulative.last().copied().unwrap_or(0.0);
                if points.len() < 2 || total <= 0.0 {
                    return Some(first);
                }
                let s = t * total;
                while self.segment + 2 < self.cumulative.len() && self.cumulative[self.segment + 1] < s {
                    self.segment += 1;
                }
                let start = self.cumulative[self.segment];
                let seg_len = self.cumulative[self.segment + 1] - start;
                let local = if seg_len > 0.0 { (s - start) / seg_len } else { 0.0 };
                Some(points[self.segment].lerp(&points[self.segment + 1], local))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CurveSampler<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_curves() {
        assert!(Curve::rectangle(0.0, 0.0, 10.0, 5.0).is_finite());
        assert!(!Curve::rectangle(0.0, f64::NAN, 10.0, 5.0).is_finite());
        assert!(!Curve::circle(0.0, 0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_rectangle_is_closed() {
        let rect = Curve::rectangle(0.0, 0.0, 100.0, 50.0);
        assert_eq!(rect.closing_gap(), 0.0);
        assert_eq!(rect.span_count(), 4);
        assert_eq!(rect.degree(), 1);
        assert!((rect.length() - 300.0).abs() < 1e-12);
    }

    #[test]
    fn test_open_polyline_gap() {
        let open = Curve::Polyline {
            points: vec![Point3::xy(0.0, 0.0), Point3::xy(10.0, 0.0), Point3::xy(10.0, 10.0)],
        };
        assert!((open.closing_gap() - 200.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_resolution_count() {
        let res = Resolution::new(8, 10.0);
        assert_eq!(res.count(20.0), 8);
        assert_eq!(res.count(205.0), 21);
        assert_eq!(Resolution::new(1, 1e-9).count(1.0e6), MAX_SAMPLES);
    }

    #[test]
    fn test_polyline_sampling_even_spacing() {
        let rect = Curve::rectangle(0.0, 0.0, 10.0, 10.0);
        let pts: Vec<Point3> = rect.sample(Resolution::new(8, 100.0)).collect();
        assert_eq!(pts.len(), 8);
        // 40 units of perimeter, 5 units apart
        assert_eq!(pts[0], Point3::xy(0.0, 0.0));
        assert!((pts[1].x - 5.0).abs() < 1e-12);
        assert!((pts[2].x - 10.0).abs() < 1e-12 && pts[2].y.abs() < 1e-12);
        assert!((pts[3].y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_sampler_is_restartable() {
        let circle = Curve::circle(0.0, 0.0, 5.0);
        let sampler = circle.sample(Resolution::new(12, 100.0));
        assert_eq!(sampler.len(), 12);
        let first: Vec<Point3> = sampler.clone().collect();
        let second: Vec<Point3> = sampler.collect();
        assert_eq!(first, second);
        for p in &first {
            assert!((p.x.hypot(p.y) - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_circle_tessellation_scales_with_mode() {
        let circle = Curve::circle(0.0, 0.0, 10.0);
        let fast = circle.tessellate(AccuracyMode::Fast);
        let high = circle.tessellate(AccuracyMode::High);
        assert_eq!(fast.len(), 64);
        assert_eq!(high.len(), 256);
    }

    #[test]
    fn test_serialization() {
        let circle = Curve::circle(1.0, 2.0, 3.0);
        let json = serde_json::to_string(&circle).unwrap();
        assert!(json.contains("\"type\":\"Circle\""));
        let back: Curve = serde_json::from_str(&json).unwrap();
        assert_eq!(circle, back);

        let parsed: Curve = serde_json::from_str(
            r#"{"type":"Polyline","points":[{"x":0,"y":0},{"x":1,"y":0},{"x":0,"y":1},{"x":0,"y":0}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.span_count(), 3);
    }
}
