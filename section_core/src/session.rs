//! # Section Session
//!
//! The single owner of the editable state: boundary curves, the validated
//! [`Section`], material, load case, settings and the latest
//! [`AnalysisReport`].
//!
//! Every setter validates first. An input error leaves the prior state and the
//! prior results untouched.
//!
//! Recomputes are split into a [`RecomputeJob`] snapshot (plain data, `Send`)
//! and [`SectionSession::apply`], so the pipeline can run on another thread
//! while only the owner mutates the session.
//!
//! ## Example
//!
//! ```rust
//! use section_core::geometry::Curve;
//! use section_core::loads::LoadCase;
//! use section_core::materials::MaterialCatalog;
//! use section_core::section::BoundaryId;
//! use section_core::session::SectionSession;
//!
//! let mut session = SectionSession::new(MaterialCatalog::standard().clone());
//! session.set_outline(BoundaryId::new(), Curve::rectangle(0.0, 0.0, 100.0, 100.0)).unwrap();
//! session.set_load(LoadCase::new().with_moments(5.0, 0.0)).unwrap();
//!
//! let report = session.recompute().unwrap();
//! assert!(report.utilization.is_some());
//! ```

use log::{debug, warn};

use crate::analysis::{analyze, assemble_section, AnalysisReport};
use crate::document::SectionDocument;
use crate::errors::{CalcResult, SectionError};
use crate::geometry::Curve;
use crate::loads::LoadCase;
use crate::materials::{MaterialCatalog, MaterialSelection, ResolvedMaterial};
use crate::report::ResultTable;
use crate::section::{BoundaryId, Section};
use crate::settings::AnalysisSettings;
use crate::warnings::Warning;

/// Snapshot of everything one recompute needs
#[derive(Debug, Clone)]
pub struct RecomputeJob {
    pub section: Section,
    pub material: ResolvedMaterial,
    pub load: LoadCase,
    pub settings: AnalysisSettings,
    /// Warnings from section assembly (dropped hollows)
    pub geometry_warnings: Vec<Warning>,
}

impl RecomputeJob {
    /// Run the pipeline on the snapshot.
    pub fn run(self) -> CalcResult<AnalysisReport> {
        let mut report = analyze(&self.section, &self.material, &self.load, &self.settings)?;
        let mut warnings = self.geometry_warnings;
        warnings.append(&mut report.warnings);
        report.warnings = warnings;
        Ok(report)
    }
}

/// Owner of the section state and its latest results
#[derive(Debug, Clone)]
pub struct SectionSession {
    catalog: MaterialCatalog,
    outline: Option<(BoundaryId, Curve)>,
    hollows: Vec<(BoundaryId, Curve)>,
    section: Option<Section>,
    geometry_warnings: Vec<Warning>,
    material: MaterialSelection,
    load: LoadCase,
    settings: AnalysisSettings,
    report: Option<AnalysisReport>,
}

impl SectionSession {
    pub fn new(catalog: MaterialCatalog) -> Self {
        SectionSession {
            catalog,
            outline: None,
            hollows: Vec::new(),
            section: None,
            geometry_warnings: Vec::new(),
            material: MaterialSelection::default(),
            load: LoadCase::default(),
            settings: AnalysisSettings::default(),
            report: None,
        }
    }

    /// Session populated from a document.
    ///
    /// A document without an outline yields a session with no section.
    pub fn from_document(doc: &SectionDocument, catalog: MaterialCatalog) -> CalcResult<Self> {
        let mut session = SectionSession::new(catalog);
        session.set_settings(doc.settings.clone())?;
        session.set_load(doc.load)?;
        session.set_material(doc.material);
        if let Some(outline) = &doc.outline {
            session.set_geometry((outline.id, outline.curve.clone()), doc.hollow_entries())?;
        }
        Ok(session)
    }

    /// Replace outline and hollows together.
    ///
    /// Fails only for an invalid outline. Invalid hollows are dropped and
    /// become [`Warning::HollowDropped`].
    pub fn set_geometry(
        &mut self,
        outline: (BoundaryId, Curve),
        hollows: Vec<(BoundaryId, Curve)>,
    ) -> CalcResult<&[Warning]> {
        let (section, warnings) = assemble_section(&outline, &hollows, self.settings.accuracy)?;
        debug!(
            "Section assembled: {} of {} hollows accepted",
            section.hollows.len(),
            hollows.len()
        );
        self.outline = Some(outline);
        self.hollows = hollows;
        self.section = Some(section);
        self.geometry_warnings = warnings;
        Ok(&self.geometry_warnings)
    }

    pub fn set_outline(&mut self, id: BoundaryId, curve: Curve) -> CalcResult<&[Warning]> {
        let hollows = self.hollows.clone();
        self.set_geometry((id, curve), hollows)
    }

    /// Add or replace a hollow by id.
    pub fn upsert_hollow(&mut self, id: BoundaryId, curve: Curve) -> CalcResult<&[Warning]> {
        let outline = self.outline.clone().ok_or_else(|| SectionError::missing_field("outline"))?;
        let mut hollows = self.hollows.clone();
        match hollows.iter_mut().find(|(hid, _)| *hid == id) {
            Some(entry) => entry.1 = curve,
            None => hollows.push((id, curve)),
        }
        self.set_geometry(outline, hollows)
    }

    /// Remove a boundary by id.
    ///
    /// Removing the outline invalidates the section and its results. Removing
    /// a hollow re-validates the remaining ones.
    pub fn remove_boundary(&mut self, id: BoundaryId) -> bool {
        if self.outline.as_ref().map(|(oid, _)| *oid) == Some(id) {
            self.clear();
            return true;
        }
        let mut hollows = self.hollows.clone();
        hollows.retain(|(hid, _)| *hid != id);
        if hollows.len() == self.hollows.len() {
            return false;
        }
        match self.outline.clone() {
            Some(outline) => {
                if let Err(e) = self.set_geometry(outline, hollows) {
                    warn!("Revalidation after removing {} failed: {}", id, e);
                    self.clear();
                }
            }
            None => self.hollows = hollows,
        }
        true
    }

    /// Drop all geometry and results.
    pub fn clear(&mut self) {
        self.outline = None;
        self.hollows.clear();
        self.section = None;
        self.geometry_warnings.clear();
        self.report = None;
    }

    pub fn set_material(&mut self, material: MaterialSelection) {
        self.material = material;
    }

    pub fn set_load(&mut self, load: LoadCase) -> CalcResult<()> {
        load.validate()?;
        self.load = load;
        Ok(())
    }

    /// Replace the settings. A changed accuracy re-validates the geometry.
    pub fn set_settings(&mut self, settings: AnalysisSettings) -> CalcResult<()> {
        settings.validate()?;
        let accuracy_changed = settings.accuracy != self.settings.accuracy;
        let previous = std::mem::replace(&mut self.settings, settings);
        if accuracy_changed {
            if let Some(outline) = self.outline.clone() {
                let hollows = self.hollows.clone();
                if let Err(e) = self.set_geometry(outline, hollows) {
                    self.settings = previous;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Snapshot for a recompute.
    pub fn job(&self) -> CalcResult<RecomputeJob> {
        let section = self.section.clone().ok_or_else(|| SectionError::missing_field("outline"))?;
        Ok(RecomputeJob {
            section,
            material: self.catalog.resolve(&self.material),
            load: self.load,
            settings: self.settings.clone(),
            geometry_warnings: self.geometry_warnings.clone(),
        })
    }

    /// Store a recompute outcome. On error the prior report is kept.
    pub fn apply(&mut self, outcome: CalcResult<AnalysisReport>) -> CalcResult<&AnalysisReport> {
        let report = outcome?;
        Ok(self.report.insert(report))
    }

    /// Run the pipeline inline.
    pub fn recompute(&mut self) -> CalcResult<&AnalysisReport> {
        let outcome = self.job()?.run();
        self.apply(outcome)
    }

    /// Result table of the latest report in the configured display unit
    pub fn table(&self) -> Option<ResultTable> {
        self.report.as_ref().map(|r| {
            ResultTable::build(&r.properties, r.utilization.as_ref(), self.settings.display_unit)
        })
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        self.report.as_ref()
    }

    pub fn section(&self) -> Option<&Section> {
        self.section.as_ref()
    }

    pub fn outline(&self) -> Option<&(BoundaryId, Curve)> {
        self.outline.as_ref()
    }

    pub fn hollows(&self) -> &[(BoundaryId, Curve)] {
        &self.hollows
    }

    pub fn load(&self) -> &LoadCase {
        &self.load
    }

    pub fn material(&self) -> &MaterialSelection {
        &self.material
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }
}
