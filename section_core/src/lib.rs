//! # section_core - Cross-Section Property Engine
//!
//! `section_core` computes structural cross-section properties (area,
//! centroid, second moments, section moduli, radii of gyration, mass) for a
//! planar outline with hollows, and a von Mises utilization ratio for a load
//! case. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Pure pipeline**: validation, integration and derivation take inputs and return results
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, degraded results carried as warnings
//! - **Single owner**: [`session::SectionSession`] holds all mutable state
//!
//! ## Quick Start
//!
//! ```rust
//! use section_core::prelude::*;
//!
//! let outline = (BoundaryId::new(), Curve::rectangle(0.0, 0.0, 200.0, 100.0));
//! let hollows = vec![(BoundaryId::new(), Curve::centered_rectangle(100.0, 50.0, 180.0, 80.0))];
//! let settings = AnalysisSettings::default();
//!
//! let (section, _) = assemble_section(&outline, &hollows, settings.accuracy).unwrap();
//! let steel = MaterialCatalog::standard().resolve(&MaterialSelection::catalog(MaterialKey::Steel));
//! let report = analyze(&section, &steel, &LoadCase::new().with_moments(20.0, 0.0), &settings).unwrap();
//!
//! assert!((report.properties.area_mm2 - 5600.0).abs() < 1e-9);
//! println!("{}", ResultTable::build(&report.properties, report.utilization.as_ref(), LengthUnit::Centimeter));
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] - points, planes, curves, rings
//! - [`validation`] - closedness, planarity and containment checks
//! - [`surface`], [`mesh`], [`integrate`] - region integration
//! - [`properties`], [`utilization`] - derived quantities
//! - [`analysis`] - the full pipeline
//! - [`session`], [`tracking`] - state ownership and live change tracking
//! - [`report`], [`file_io`], [`document`] - result tables, CSV and JSON documents

pub mod analysis;
pub mod document;
pub mod errors;
pub mod file_io;
pub mod geometry;
pub mod integrate;
pub mod loads;
pub mod materials;
pub mod mesh;
pub mod properties;
pub mod report;
pub mod section;
pub mod session;
pub mod settings;
pub mod surface;
pub mod tracking;
pub mod units;
pub mod utilization;
pub mod validation;
pub mod visualize;
pub mod warnings;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcResult, SectionError};
pub use file_io::{export_csv, import_csv, load_document, save_document, FileLock};
pub use document::{SectionDocument, SCHEMA_VERSION};
pub use session::SectionSession;

/// Everything needed to run an analysis
pub mod prelude {
    pub use crate::analysis::{analyze, assemble_section, AnalysisReport};
    pub use crate::errors::{CalcResult, SectionError};
    pub use crate::geometry::{Curve, Point2, Point3};
    pub use crate::loads::LoadCase;
    pub use crate::materials::{MaterialCatalog, MaterialKey, MaterialSelection};
    pub use crate::properties::SectionProperties;
    pub use crate::report::ResultTable;
    pub use crate::section::{BoundaryId, Section};
    pub use crate::settings::{AccuracyMode, AnalysisSettings, IntegrationStrategy};
    pub use crate::units::LengthUnit;
    pub use crate::utilization::UtilizationResult;
    pub use crate::warnings::Warning;
}
