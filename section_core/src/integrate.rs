//! # Region Integration
//!
//! Area, centroid and centroidal second moments of a validated [`Section`].
//!
//! ## Method
//!
//! 1. Build the polygon-with-holes ([`crate::surface::build_surface`]).
//! 2. Area and centroid from the closed-form polygon formulas, taken about
//!    the centre of the outline's bounding box to keep the sums small.
//! 3. Second moments:
//!    - `Direct`: closed-form polygon moments shifted to the centroid with
//!      the parallel-axis theorem. Exact for the polygon boundary.
//!    - `Mesh`: per triangle `Ix += A·dy²`, `Iy += A·dx²`. Triangle
//!      self-inertia is neglected, so the result converges from below as the
//!      mesh is refined.
//! 4. Extreme-fiber distances `x_max`, `y_max` from the centroid.
//!
//! All lengths are in the base unit (mm).

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};
use crate::geometry::{Point2, Resolution, TOLERANCE};
use crate::mesh;
use crate::section::Section;
use crate::settings::{AccuracyMode, AnalysisSettings, IntegrationStrategy};
use crate::surface::{build_surface, Deadline, Surface};
use crate::warnings::{Axis, Warning};

/// Areas at or below this are treated as empty
const MIN_AREA: f64 = 1e-12;

/// Raw integration output, before derived properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    /// Net area (mm²)
    pub area: f64,
    /// Centroid in section plane coordinates
    pub centroid: Point2,
    /// Centroidal second moment about the x axis (mm⁴)
    pub ix: f64,
    /// Centroidal second moment about the y axis (mm⁴)
    pub iy: f64,
    /// Centroidal product of inertia (mm⁴)
    pub ixy: f64,
    /// Largest |x - cx| over the boundaries (mm)
    pub x_max: f64,
    /// Largest |y - cy| over the boundaries (mm)
    pub y_max: f64,
    /// Strategy that produced the second moments
    pub strategy: IntegrationStrategy,
    pub surface: Surface,
    pub warnings: Vec<Warning>,
}

/// Integrate a section.
pub fn integrate(section: &Section, settings: &AnalysisSettings) -> CalcResult<Integration> {
    let deadline = Deadline::new(settings.surface_timeout());
    let surface = build_surface(section, &deadline)?;
    let mut warnings = Vec::new();

    let origin = section.outline.bbox.center();
    let m = surface.moments(origin);
    if !(m.area > MIN_AREA) || !m.area.is_finite() {
        return Err(SectionError::NoArea { area: m.area });
    }
    let area = m.area;
    let (cx, cy) = (m.sy / area, m.sx / area);
    let centroid = Point2::new(origin.x + cx, origin.y + cy);

    let direct = (
        m.ixx - area * cy * cy,
        m.iyy - area * cx * cx,
        m.ixy - area * cx * cy,
    );
    let direct_usable = direct.0.is_finite() && direct.1.is_finite() && direct.2.is_finite();

    let strategy = match settings.strategy {
        IntegrationStrategy::Direct if direct_usable => IntegrationStrategy::Direct,
        IntegrationStrategy::Direct => {
            let reason = "closed-form second moments are not finite".to_string();
            warn!("{}, falling back to mesh integration", reason);
            warnings.push(Warning::MeshFallback { reason });
            IntegrationStrategy::Mesh
        }
        IntegrationStrategy::Mesh => IntegrationStrategy::Mesh,
    };

    let (ix, iy, ixy) = match strategy {
        IntegrationStrategy::Direct => direct,
        IntegrationStrategy::Mesh => {
            let triangles = mesh::build_mesh(&surface, settings.accuracy, &deadline)?;
            let mm = mesh::mesh_moments(&triangles, centroid);
            (mm.ix, mm.iy, mm.ixy)
        }
    };

    let (x_max, y_max) = extreme_fibers(section, centroid, settings.accuracy);
    let x_max = clamp_fiber(Axis::X, x_max, &mut warnings);
    let y_max = clamp_fiber(Axis::Y, y_max, &mut warnings);

    debug!(
        "Integrated section: A={:.4}, c=({:.4}, {:.4}), Ix={:.4}, Iy={:.4} [{:?}]",
        area, centroid.x, centroid.y, ix, iy, strategy
    );

    Ok(Integration {
        area,
        centroid,
        ix,
        iy,
        ixy,
        x_max,
        y_max,
        strategy,
        surface,
        warnings,
    })
}

/// Extreme-fiber distances from the centroid.
///
/// The bounding-box estimate is always computed. High accuracy, or any
/// hollows, replace it with the maximum over densely sampled boundary points
/// and ring vertices.
pub fn extreme_fibers(section: &Section, centroid: Point2, mode: AccuracyMode) -> (f64, f64) {
    let bbox = &section.outline.bbox;
    let estimate = (
        (bbox.max.x - centroid.x).max(centroid.x - bbox.min.x),
        (bbox.max.y - centroid.y).max(centroid.y - bbox.min.y),
    );
    if mode != AccuracyMode::High && !section.has_hollows() {
        return estimate;
    }

    let plane = section.plane();
    let resolution = Resolution::dense(mode);
    let mut refined = (0.0_f64, 0.0_f64);
    for boundary in section.boundaries() {
        let sampled = boundary.curve.sample(resolution).map(|p| plane.project(&p));
        for p in boundary.ring.iter().copied().chain(sampled) {
            refined.0 = refined.0.max((p.x - centroid.x).abs());
            refined.1 = refined.1.max((p.y - centroid.y).abs());
        }
    }
    refined
}

fn clamp_fiber(axis: Axis, value: f64, warnings: &mut Vec<Warning>) -> f64 {
    if value >= TOLERANCE && value.is_finite() {
        return value;
    }
    warn!("Extreme fiber distance along {} is {}, clamping to {}", axis, value, TOLERANCE);
    warnings.push(Warning::ExtremeFiberClamped {
        axis,
        value,
        clamped_to: TOLERANCE,
    });
    TOLERANCE
}
