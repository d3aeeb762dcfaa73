//! Points, vectors and the section plane

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether two directions are parallel
const PARALLEL_TOLERANCE: f64 = 1e-9;

/// A point (or vector) in the section plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn sub(&self, other: &Point2) -> Point2 {
        Point2::new(self.x - other.x, self.y - other.y)
    }

    pub fn lerp(&self, other: &Point2, t: f64) -> Point2 {
        Point2::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    pub fn midpoint(&self, other: &Point2) -> Point2 {
        self.lerp(other, 0.5)
    }

    /// z-component of the cross product
    pub fn cross(&self, other: &Point2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn dot(&self, other: &Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl From<Point2> for geo::Coord<f64> {
    fn from(p: Point2) -> Self {
        geo::coord! { x: p.x, y: p.y }
    }
}

impl From<geo::Coord<f64>> for Point2 {
    fn from(c: geo::Coord<f64>) -> Self {
        Point2::new(c.x, c.y)
    }
}

/// A point (or vector) in model space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    /// Point in the world XY plane
    pub const fn xy(x: f64, y: f64) -> Self {
        Point3 { x, y, z: 0.0 }
    }

    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(&self, other: &Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(&self, s: f64) -> Point3 {
        Point3::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn dot(&self, other: &Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Point3) -> Point3 {
        Point3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn distance(&self, other: &Point3) -> f64 {
        self.sub(other).norm()
    }

    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        self.add(&other.sub(self).scale(t))
    }

    /// Unit vector in the same direction, or `None` for a zero vector
    pub fn normalized(&self) -> Option<Point3> {
        let n = self.norm();
        if n > PARALLEL_TOLERANCE {
            Some(self.scale(1.0 / n))
        } else {
            None
        }
    }
}

/// The plane a section lives in, with an orthonormal in-plane frame.
///
/// Sections drawn in the world XY plane keep their world x/y coordinates
/// (the frame origin sits at `(0, 0, z)`), so reported centroids match the
/// coordinates the user drew in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3,
    pub x_axis: Point3,
    pub y_axis: Point3,
    pub normal: Point3,
}

impl Plane {
    /// World XY plane at height `z`
    pub fn world_xy(z: f64) -> Self {
        Plane {
            origin: Point3::new(0.0, 0.0, z),
            x_axis: Point3::new(1.0, 0.0, 0.0),
            y_axis: Point3::new(0.0, 1.0, 0.0),
            normal: Point3::new(0.0, 0.0, 1.0),
        }
    }

    /// Plane through `origin` with the given (not necessarily unit) normal.
    ///
    /// Normals parallel to Z collapse to [`Plane::world_xy`].
    pub fn from_normal(origin: Point3, normal: Point3) -> Self {
        let n = match normal.normalized() {
            Some(n) => n,
            None => return Plane::world_xy(origin.z),
        };
        if n.x.abs() < PARALLEL_TOLERANCE.sqrt() && n.y.abs() < PARALLEL_TOLERANCE.sqrt() {
            return Plane::world_xy(origin.z);
        }
        let helper = if n.z.abs() < 0.9 {
            Point3::new(0.0, 0.0, 1.0)
        } else {
            Point3::new(1.0, 0.0, 0.0)
        };
        // helper is never parallel to n here, so both normalizations succeed
        let x_axis = helper.cross(&n).normalized().unwrap_or(Point3::new(1.0, 0.0, 0.0));
        let y_axis = n.cross(&x_axis);
        Plane {
            origin,
            x_axis,
            y_axis,
            normal: n,
        }
    }

    /// Signed distance of a point from the plane
    pub fn distance(&self, p: &Point3) -> f64 {
        p.sub(&self.origin).dot(&self.normal)
    }

    /// Project a model-space point into plane coordinates
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p.sub(&self.origin);
        Point2::new(d.dot(&self.x_axis), d.dot(&self.y_axis))
    }

    /// Map plane coordinates back to model space
    pub fn to_world(&self, p: &Point2) -> Point3 {
        self.origin
            .add(&self.x_axis.scale(p.x))
            .add(&self.y_axis.scale(p.y))
    }

    /// Map an in-plane direction to a model-space direction
    pub fn direction_to_world(&self, v: &Point2) -> Point3 {
        self.x_axis.scale(v.x).add(&self.y_axis.scale(v.y))
    }

    /// True if `other` is parallel to this plane (normals aligned either way)
    pub fn is_parallel(&self, other: &Plane, tolerance: f64) -> bool {
        self.normal.cross(&other.normal).norm() <= tolerance
    }
}
