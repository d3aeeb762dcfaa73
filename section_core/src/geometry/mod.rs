//! # Geometry Primitives
//!
//! Pure functions and value types the rest of the pipeline is built on:
//!
//! - [`point`] - 2D/3D points and the section [`Plane`]
//! - [`bbox`] - axis-aligned bounding boxes
//! - [`curve`] - boundary curves, arc-length sampling and tessellation
//! - [`polygon`] - ring area/moments, point containment, intersection tests
//!
//! Nothing here has side effects; every function works on immutable inputs.

pub mod bbox;
pub mod curve;
pub mod point;
pub mod polygon;

pub use bbox::BoundingBox;
pub use curve::{Curve, CurveSampler, Resolution};
pub use point::{Plane, Point2, Point3};
pub use polygon::{point_in_ring, Containment, RingMoments};

/// Geometric tolerance in base length units (mm)
pub const TOLERANCE: f64 = 0.001;
