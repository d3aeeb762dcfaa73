//! # Triangle Mesh
//!
//! Triangulates a [`Surface`] with earcut and refines it by longest-edge
//! bisection until every edge is shorter than a fraction of the surface's
//! bounding-box diagonal (1/25 in fast mode, 1/100 in high accuracy).
//!
//! Used for the mesh integration strategy and for the stress colour field.

use earcutr::earcut;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};
use crate::geometry::Point2;
use crate::settings::AccuracyMode;
use crate::surface::{Deadline, Surface};

/// Upper bound on refined triangles
pub const MAX_TRIANGLES: usize = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: Point2,
    pub b: Point2,
    pub c: Point2,
}

impl Triangle {
    pub fn new(a: Point2, b: Point2, c: Point2) -> Self {
        Triangle { a, b, c }
    }

    pub fn area(&self) -> f64 {
        (self.b.sub(&self.a).cross(&self.c.sub(&self.a)) * 0.5).abs()
    }

    pub fn centroid(&self) -> Point2 {
        Point2::new(
            (self.a.x + self.b.x + self.c.x) / 3.0,
            (self.a.y + self.b.y + self.c.y) / 3.0,
        )
    }

    pub fn longest_edge(&self) -> f64 {
        self.a
            .distance(&self.b)
            .max(self.b.distance(&self.c))
            .max(self.c.distance(&self.a))
    }

    /// Split the longest edge at its midpoint
    fn bisect(&self) -> (Triangle, Triangle) {
        let ab = self.a.distance(&self.b);
        let bc = self.b.distance(&self.c);
        let ca = self.c.distance(&self.a);
        let (p, q, r) = if ab >= bc && ab >= ca {
            (self.a, self.b, self.c)
        } else if bc >= ca {
            (self.b, self.c, self.a)
        } else {
            (self.c, self.a, self.b)
        };
        let m = p.midpoint(&q);
        (Triangle::new(p, m, r), Triangle::new(m, q, r))
    }
}

/// Maximum edge length for the given accuracy tier
pub fn max_edge(mode: AccuracyMode, diagonal: f64) -> f64 {
    match mode {
        AccuracyMode::Fast => diagonal / 25.0,
        AccuracyMode::High => diagonal / 100.0,
    }
}

/// Earcut triangulation of the surface without refinement
pub fn triangulate(surface: &Surface) -> CalcResult<Vec<Triangle>> {
    let mut vertices: Vec<Point2> = Vec::new();
    let mut coords: Vec<f64> = Vec::new();
    let mut hole_starts: Vec<usize> = Vec::new();

    for (i, ring) in surface.rings().enumerate() {
        if i > 0 {
            hole_starts.push(vertices.len());
        }
        for p in ring {
            vertices.push(*p);
            coords.push(p.x);
            coords.push(p.y);
        }
    }

    let indices = earcut(&coords, &hole_starts, 2)
        .map_err(|_| SectionError::surface_failed("triangulation failed"))?;
    if indices.len() < 3 || indices.len() % 3 != 0 {
        return Err(SectionError::surface_failed("triangulation produced no triangles"));
    }

    Ok(indices
        .chunks_exact(3)
        .map(|t| Triangle::new(vertices[t[0]], vertices[t[1]], vertices[t[2]]))
        .collect())
}

/// Bisect triangles until no edge exceeds `max_edge`
pub fn refine(triangles: Vec<Triangle>, max_edge: f64, deadline: &Deadline) -> CalcResult<Vec<Triangle>> {
    if !(max_edge > 0.0) {
        return Ok(triangles);
    }
    let mut done = Vec::with_capacity(triangles.len() * 4);
    let mut pending = triangles;
    let mut steps: usize = 0;

    while let Some(t) = pending.pop() {
        if t.longest_edge() <= max_edge {
            done.push(t);
            continue;
        }
        let (first, second) = t.bisect();
        pending.push(first);
        pending.push(second);

        steps += 1;
        if steps % 4096 == 0 {
            deadline.check("meshing")?;
            if done.len() + pending.len() > MAX_TRIANGLES {
                return Err(SectionError::surface_failed(format!(
                    "mesh exceeds {} triangles",
                    MAX_TRIANGLES
                )));
            }
        }
    }
    Ok(done)
}

/// Triangulate and refine for the given accuracy tier
pub fn build_mesh(surface: &Surface, mode: AccuracyMode, deadline: &Deadline) -> CalcResult<Vec<Triangle>> {
    let diagonal = surface.bbox().map(|b| b.diagonal()).unwrap_or(0.0);
    let coarse = triangulate(surface)?;
    let coarse_count = coarse.len();
    let mesh = refine(coarse, max_edge(mode, diagonal), deadline)?;
    debug!("Meshed surface: {} triangles refined to {}", coarse_count, mesh.len());
    Ok(mesh)
}

/// Second moments about `centroid` from triangle centroids (self-inertia neglected)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshMoments {
    pub area: f64,
    pub ix: f64,
    pub iy: f64,
    pub ixy: f64,
}

pub fn mesh_moments(triangles: &[Triangle], centroid: Point2) -> MeshMoments {
    triangles.iter().fold(MeshMoments::default(), |mut m, t| {
        let a = t.area();
        let c = t.centroid();
        let dx = c.x - centroid.x;
        let dy = c.y - centroid.y;
        m.area += a;
        m.ix += a * dy * dy;
        m.iy += a * dx * dx;
        m.ixy += a * dx * dy;
        m
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rectangle(w: f64, h: f64) -> Surface {
        Surface::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(w, 0.0),
                Point2::new(w, h),
                Point2::new(0.0, h),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_triangulate_rectangle() {
        let triangles = triangulate(&rectangle(4.0, 2.0)).unwrap();
        assert_eq!(triangles.len(), 2);
        let area: f64 = triangles.iter().map(Triangle::area).sum();
        assert_relative_eq!(area, 8.0, max_relative = 1e-12);
    }

    #[test]
    fn test_triangulate_with_hole() {
        let surface = Surface::new(
            rectangle(10.0, 10.0).exterior,
            vec![vec![
                Point2::new(4.0, 4.0),
                Point2::new(6.0, 4.0),
                Point2::new(6.0, 6.0),
                Point2::new(4.0, 6.0),
            ]],
        );
        let area: f64 = triangulate(&surface).unwrap().iter().map(Triangle::area).sum();
        assert_relative_eq!(area, 96.0, max_relative = 1e-9);
    }

    #[test]
    fn test_refine_bounds_edges_and_keeps_area() {
        let surface = rectangle(30.0, 10.0);
        let diagonal = surface.bbox().unwrap().diagonal();
        let mesh = build_mesh(&surface, AccuracyMode::Fast, &Deadline::unbounded()).unwrap();
        let limit = max_edge(AccuracyMode::Fast, diagonal);
        assert!(mesh.iter().all(|t| t.longest_edge() <= limit + 1e-12));
        let area: f64 = mesh.iter().map(Triangle::area).sum();
        assert_relative_eq!(area, 300.0, max_relative = 1e-9);
    }

    #[test]
    fn test_mesh_moments_close_to_exact_in_high_accuracy() {
        let (w, h) = (20.0, 40.0);
        let mesh = build_mesh(&rectangle(w, h), AccuracyMode::High, &Deadline::unbounded()).unwrap();
        let m = mesh_moments(&mesh, Point2::new(w / 2.0, h / 2.0));
        assert_relative_eq!(m.ix, w * h.powi(3) / 12.0, max_relative = 1e-3);
        assert_relative_eq!(m.iy, h * w.powi(3) / 12.0, max_relative = 1e-3);
        assert!(m.ixy.abs() < 1e-3 * m.ix);
    }
}
