//! # Visualization Artifacts
//!
//! Geometry handed to the result sink for drawing: the centroid, the two
//! principal axes and a bending-stress colour field. Rendering is up to the
//! sink.
//!
//! Principal-axis vectors are unit directions scaled by the radius of gyration
//! about that axis. The stress field samples the linear bending stress
//! `σ = Mx·y/Ix − My·x/Iy` (about the centroid) at mesh triangle centroids and
//! maps it onto a blue (compression) to red (tension) ramp.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisReport;
use crate::errors::CalcResult;
use crate::geometry::{Plane, Point2, Point3};
use crate::loads::LoadCase;
use crate::mesh::build_mesh;
use crate::settings::AnalysisSettings;
use crate::surface::Deadline;
use crate::units::NewtonMillimeters;

/// Compression colour as [R, G, B] normalized to [0.0, 1.0]
pub const COMPRESSION_COLOR: [f64; 3] = [0.0, 0.0, 1.0];
/// Tension colour as [R, G, B] normalized to [0.0, 1.0]
pub const TENSION_COLOR: [f64; 3] = [1.0, 0.0, 0.0];

/// One principal axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisArtifact {
    /// Unit direction in plane coordinates
    pub direction: Point2,
    /// Direction scaled by the radius of gyration, in model space
    pub vector_world: Point3,
    /// Radius of gyration about this axis (mm)
    pub radius_mm: f64,
}

/// Bending stress at one sample point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressSample {
    pub position: Point2,
    pub position_world: Point3,
    pub stress_mpa: f64,
    pub color: [f64; 3],
}

/// Everything published to the sink for drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualArtifacts {
    pub centroid: Point2,
    pub centroid_world: Point3,
    pub major_axis: AxisArtifact,
    pub minor_axis: AxisArtifact,
    /// Empty when no bending moment is applied
    pub stress_field: Vec<StressSample>,
}

/// Build the drawing artifacts for a report.
pub fn build_artifacts(
    report: &AnalysisReport,
    plane: &Plane,
    load: &LoadCase,
    settings: &AnalysisSettings,
) -> CalcResult<VisualArtifacts> {
    let p = &report.properties;
    let area = p.area_mm2;
    let axis = |direction: Point2, moment: f64| {
        let radius_mm = (moment.max(0.0) / area).sqrt();
        AxisArtifact {
            direction,
            vector_world: plane.direction_to_world(&direction).scale(radius_mm),
            radius_mm,
        }
    };

    Ok(VisualArtifacts {
        centroid: p.centroid,
        centroid_world: plane.to_world(&p.centroid),
        major_axis: axis(p.major_axis(), p.i1_mm4),
        minor_axis: axis(p.minor_axis(), p.i2_mm4),
        stress_field: stress_field(report, plane, load, settings)?,
    })
}

/// Linear bending stress sampled at mesh triangle centroids
pub fn stress_field(
    report: &AnalysisReport,
    plane: &Plane,
    load: &LoadCase,
    settings: &AnalysisSettings,
) -> CalcResult<Vec<StressSample>> {
    let mx = NewtonMillimeters::from(load.mx).value();
    let my = NewtonMillimeters::from(load.my).value();
    if mx == 0.0 && my == 0.0 {
        return Ok(Vec::new());
    }

    let p = &report.properties;
    let deadline = Deadline::new(settings.surface_timeout());
    let triangles = build_mesh(&report.surface, settings.accuracy, &deadline)?;

    let stresses: Vec<(Point2, f64)> = triangles
        .iter()
        .map(|t| {
            let c = t.centroid();
            let d = c.sub(&p.centroid);
            (c, mx * d.y / p.ix_mm4 - my * d.x / p.iy_mm4)
        })
        .collect();

    let peak = stresses.iter().fold(0.0_f64, |acc, (_, s)| acc.max(s.abs()));
    Ok(stresses
        .into_iter()
        .map(|(position, stress_mpa)| StressSample {
            position,
            position_world: plane.to_world(&position),
            stress_mpa,
            color: stress_color(stress_mpa, peak),
        })
        .collect())
}

/// Blue to red ramp; zero stress sits in the middle.
pub fn stress_color(stress: f64, peak: f64) -> [f64; 3] {
    let t = if peak > 0.0 {
        (0.5 + 0.5 * stress / peak).clamp(0.0, 1.0)
    } else {
        0.5
    };
    [
        COMPRESSION_COLOR[0] + (TENSION_COLOR[0] - COMPRESSION_COLOR[0]) * t,
        COMPRESSION_COLOR[1] + (TENSION_COLOR[1] - COMPRESSION_COLOR[1]) * t,
        COMPRESSION_COLOR[2] + (TENSION_COLOR[2] - COMPRESSION_COLOR[2]) * t,
    ]
}
