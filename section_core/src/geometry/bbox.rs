//! Axis-aligned bounding boxes in the section plane

use serde::{Deserialize, Serialize};

use super::point::Point2;

/// Axis-aligned 2D bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox {
    pub fn new(min: Point2, max: Point2) -> Self {
        BoundingBox { min, max }
    }

    /// Bounding box of a point set, `None` if the set is empty
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = BoundingBox::new(first, first);
        for p in iter {
            bbox.expand_to_include(p);
        }
        Some(bbox)
    }

    pub fn expand_to_include(&mut self, p: &Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Grow the box by `margin` on every side
    pub fn inflate(&self, margin: f64) -> Self {
        BoundingBox {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2 {
        self.min.midpoint(&self.max)
    }

    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    pub fn contains_point(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// True if `other` lies entirely within this box (edges included)
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    /// True if the boxes overlap, with `tolerance` slack
    pub fn intersects(&self, other: &BoundingBox, tolerance: f64) -> bool {
        self.min.x <= other.max.x + tolerance
            && other.min.x <= self.max.x + tolerance
            && self.min.y <= other.max.y + tolerance
            && other.min.y <= self.max.y + tolerance
    }
}
