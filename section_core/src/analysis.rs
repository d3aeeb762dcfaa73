//! # Analysis Pipeline
//!
//! Runs validation, integration, derivation and the utilization check in
//! order and collects warnings along the way.
//!
//! ```text
//! curves ──assemble_section──▶ Section ──analyze──▶ AnalysisReport
//!                                │                     ├── SectionProperties
//!                                │                     ├── Option<UtilizationResult>
//!                                └── dropped hollows ──▶ └── warnings
//! ```
//!
//! ## Example
//!
//! ```rust
//! use section_core::analysis::{analyze, assemble_section};
//! use section_core::geometry::Curve;
//! use section_core::loads::LoadCase;
//! use section_core::materials::{MaterialCatalog, MaterialKey, MaterialSelection};
//! use section_core::section::BoundaryId;
//! use section_core::settings::AnalysisSettings;
//!
//! let settings = AnalysisSettings::default();
//! let outline = (BoundaryId::new(), Curve::rectangle(0.0, 0.0, 100.0, 200.0));
//! let (section, warnings) = assemble_section(&outline, &[], settings.accuracy).unwrap();
//! assert!(warnings.is_empty());
//!
//! let material = MaterialCatalog::standard().resolve(&MaterialSelection::catalog(MaterialKey::Steel));
//! let load = LoadCase::new().with_moments(10.0, 0.0);
//! let report = analyze(&section, &material, &load, &settings).unwrap();
//!
//! assert!((report.properties.area_mm2 - 20_000.0).abs() < 1e-9);
//! assert!(report.utilization.is_some());
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::geometry::Curve;
use crate::integrate::integrate;
use crate::loads::LoadCase;
use crate::materials::ResolvedMaterial;
use crate::properties::SectionProperties;
use crate::section::{BoundaryId, Section};
use crate::settings::{AccuracyMode, AnalysisSettings, IntegrationStrategy};
use crate::surface::Surface;
use crate::utilization::{self, UtilizationResult};
use crate::validation::{validate_hollows, validate_outline};
use crate::warnings::Warning;

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub properties: SectionProperties,
    /// Present only for a nonzero load and a valid yield strength
    pub utilization: Option<UtilizationResult>,
    /// Strategy that produced the second moments
    pub strategy: IntegrationStrategy,
    /// The integrated surface, for visualization
    pub surface: Surface,
    pub warnings: Vec<Warning>,
}

impl AnalysisReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Validate the outline and hollows into a [`Section`].
///
/// An invalid outline is an error. Invalid hollows are dropped and reported as
/// [`Warning::HollowDropped`].
pub fn assemble_section(
    outline: &(BoundaryId, Curve),
    hollows: &[(BoundaryId, Curve)],
    mode: AccuracyMode,
) -> CalcResult<(Section, Vec<Warning>)> {
    let outline = validate_outline(outline.0, &outline.1, mode)?;
    let checked = validate_hollows(hollows, &outline, mode);
    let warnings = checked
        .rejected
        .into_iter()
        .map(|r| Warning::HollowDropped {
            index: r.index,
            id: r.id,
            reason: r.error.to_string(),
        })
        .collect();
    Ok((
        Section {
            outline,
            hollows: checked.accepted,
        },
        warnings,
    ))
}

/// Analyze a validated section.
///
/// Input errors (settings, load case) are reported before any geometry work.
/// Geometric construction errors produce no partial results.
pub fn analyze(
    section: &Section,
    material: &ResolvedMaterial,
    load: &LoadCase,
    settings: &AnalysisSettings,
) -> CalcResult<AnalysisReport> {
    settings.validate()?;
    load.validate()?;

    let integration = integrate(section, settings)?;
    let properties = SectionProperties::derive(
        &integration,
        section.outline.length,
        material.density_g_cm3,
        settings.profile_depth_mm,
    );
    let utilization = utilization::calculate(&properties, load, material.yield_strength_mpa)?;

    let mut warnings = integration.warnings;
    warnings.extend(material.warnings.iter().cloned().map(Warning::from));

    debug!(
        "Analysis complete: A={:.3} mm², Wx={:.3} mm³, utilization={:?}",
        properties.area_mm2,
        properties.wx_mm3,
        utilization.as_ref().map(|u| u.utilization_pct)
    );

    Ok(AnalysisReport {
        properties,
        utilization,
        strategy: integration.strategy,
        surface: integration.surface,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{MaterialCatalog, MaterialKey, MaterialSelection};
    use approx::assert_relative_eq;

    fn steel() -> ResolvedMaterial {
        MaterialCatalog::standard().resolve(&MaterialSelection::catalog(MaterialKey::Steel))
    }

    #[test]
    fn test_hollow_rectangle_pipeline() {
        let outline = (BoundaryId::new(), Curve::rectangle(0.0, 0.0, 100.0, 100.0));
        let hollows = vec![(BoundaryId::new(), Curve::centered_rectangle(50.0, 50.0, 80.0, 80.0))];
        let (section, warnings) = assemble_section(&outline, &hollows, AccuracyMode::Fast).unwrap();
        assert!(warnings.is_empty());

        let report = analyze(&section, &steel(), &LoadCase::new(), &AnalysisSettings::default()).unwrap();
        let p = &report.properties;
        assert_relative_eq!(p.area_mm2, 3600.0, max_relative = 1e-9);
        assert_relative_eq!(p.centroid.x, 50.0, max_relative = 1e-9);
        assert_relative_eq!(p.centroid.y, 50.0, max_relative = 1e-9);
        let ix = (100.0_f64.powi(4) - 80.0_f64.powi(4)) / 12.0;
        assert_relative_eq!(p.ix_mm4, ix, max_relative = 1e-9);
        assert_relative_eq!(p.wx_mm3, ix / 50.0, max_relative = 1e-9);
        // 3600 mm² x 1 m x 7.85 g/cm³
        assert_relative_eq!(p.mass_kg, 28.26, max_relative = 1e-9);
        assert!(report.utilization.is_none());
    }

    #[test]
    fn test_dropped_hollow_becomes_warning() {
        let outline = (BoundaryId::new(), Curve::rectangle(0.0, 0.0, 100.0, 100.0));
        let outside = BoundaryId::new();
        let hollows = vec![(outside, Curve::circle(150.0, 50.0, 10.0))];
        let (section, warnings) = assemble_section(&outline, &hollows, AccuracyMode::High).unwrap();
        assert!(!section.has_hollows());
        assert!(matches!(&warnings[0], Warning::HollowDropped { id, .. } if *id == outside));
    }

    #[test]
    fn test_invalid_outline_is_error() {
        let open = Curve::Polyline {
            points: vec![crate::geometry::Point3::xy(0.0, 0.0), crate::geometry::Point3::xy(5.0, 0.0)],
        };
        assert!(assemble_section(&(BoundaryId::new(), open), &[], AccuracyMode::Fast).is_err());
    }

    #[test]
    fn test_invalid_custom_density_degrades() {
        let outline = (BoundaryId::new(), Curve::rectangle(0.0, 0.0, 10.0, 10.0));
        let (section, _) = assemble_section(&outline, &[], AccuracyMode::Fast).unwrap();
        let material = MaterialCatalog::standard().resolve(&MaterialSelection::custom(0.0, 235.0));
        let load = LoadCase::new().with_moments(0.001, 0.0);
        let report = analyze(&section, &material, &load, &AnalysisSettings::default()).unwrap();
        assert_eq!(report.properties.mass_kg, 0.0);
        assert!(report.utilization.is_some());
        assert_eq!(report.warnings, vec![Warning::InvalidDensity { value: 0.0 }]);
    }

    #[test]
    fn test_invalid_safety_factor_aborts() {
        let outline = (BoundaryId::new(), Curve::rectangle(0.0, 0.0, 10.0, 10.0));
        let (section, _) = assemble_section(&outline, &[], AccuracyMode::Fast).unwrap();
        let load = LoadCase::new().with_safety_factor(-1.0);
        let err = analyze(&section, &steel(), &load, &AnalysisSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_analyze_twice_is_bit_identical() {
        let outline = (BoundaryId::new(), Curve::regular_polygon(0.0, 0.0, 40.0, 7));
        let hollows = vec![(BoundaryId::new(), Curve::circle(0.0, 0.0, 10.0))];
        let (section, _) = assemble_section(&outline, &hollows, AccuracyMode::High).unwrap();
        let settings = AnalysisSettings::high_accuracy();
        let load = LoadCase::new().with_moments(1.0, 2.0).with_torsion(0.3);
        let first = analyze(&section, &steel(), &load, &settings).unwrap();
        let second = analyze(&section, &steel(), &load, &settings).unwrap();
        assert_eq!(first.properties, second.properties);
        assert_eq!(first.utilization, second.utilization);
    }
}
