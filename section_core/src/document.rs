//! # Section Documents
//!
//! A `SectionDocument` is the JSON input the CLI works from: the outline and
//! hollow curves with stable ids, the material selection, the load case and
//! the analysis settings.
//!
//! ## Structure
//!
//! ```text
//! SectionDocument
//! ├── meta: DocumentMetadata (schema version, name, timestamps)
//! ├── outline: Option<DocumentBoundary>
//! ├── hollows: Vec<DocumentBoundary> (validation order)
//! ├── material: MaterialSelection
//! ├── load: LoadCase
//! └── settings: AnalysisSettings
//! ```
//!
//! ## Example
//!
//! ```rust
//! use section_core::document::SectionDocument;
//! use section_core::geometry::Curve;
//!
//! let mut doc = SectionDocument::new("RHS 200x100");
//! doc.set_outline(Curve::rectangle(0.0, 0.0, 200.0, 100.0));
//! let hollow = doc.add_hollow(Curve::centered_rectangle(100.0, 50.0, 180.0, 80.0));
//!
//! let json = serde_json::to_string_pretty(&doc).unwrap();
//! let back: SectionDocument = serde_json::from_str(&json).unwrap();
//! assert!(back.curve(hollow).is_some());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};
use crate::geometry::Curve;
use crate::loads::LoadCase;
use crate::materials::MaterialSelection;
use crate::section::BoundaryId;
use crate::settings::AnalysisSettings;

/// Current schema version for section documents
pub const SCHEMA_VERSION: &str = "0.1.0";

/// A curve with a stable identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBoundary {
    pub id: BoundaryId,
    pub curve: Curve,
}

/// Document header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Section name
    pub name: String,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Root document container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDocument {
    pub meta: DocumentMetadata,

    #[serde(default)]
    pub outline: Option<DocumentBoundary>,

    #[serde(default)]
    pub hollows: Vec<DocumentBoundary>,

    #[serde(default)]
    pub material: MaterialSelection,

    #[serde(default)]
    pub load: LoadCase,

    #[serde(default)]
    pub settings: AnalysisSettings,
}

impl SectionDocument {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        SectionDocument {
            meta: DocumentMetadata {
                version: SCHEMA_VERSION.to_string(),
                name: name.into(),
                created: now,
                modified: now,
            },
            outline: None,
            hollows: Vec::new(),
            material: MaterialSelection::default(),
            load: LoadCase::default(),
            settings: AnalysisSettings::default(),
        }
    }

    /// Replace the outline; returns its new id
    pub fn set_outline(&mut self, curve: Curve) -> BoundaryId {
        let id = BoundaryId::new();
        self.outline = Some(DocumentBoundary { id, curve });
        self.touch();
        id
    }

    /// Append a hollow; returns its id
    pub fn add_hollow(&mut self, curve: Curve) -> BoundaryId {
        let id = BoundaryId::new();
        self.hollows.push(DocumentBoundary { id, curve });
        self.touch();
        id
    }

    /// Replace the curve of an existing boundary
    pub fn update_curve(&mut self, id: BoundaryId, curve: Curve) -> CalcResult<()> {
        let target = self
            .boundaries_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| SectionError::missing_field(format!("boundary {}", id)))?;
        target.curve = curve;
        self.touch();
        Ok(())
    }

    /// Remove a boundary (outline or hollow) by id.
    pub fn remove(&mut self, id: BoundaryId) -> Option<DocumentBoundary> {
        let removed = if self.outline.as_ref().map(|b| b.id) == Some(id) {
            self.outline.take()
        } else {
            let index = self.hollows.iter().position(|b| b.id == id)?;
            Some(self.hollows.remove(index))
        };
        self.touch();
        removed
    }

    /// Curve of a boundary by id
    pub fn curve(&self, id: BoundaryId) -> Option<&Curve> {
        self.outline
            .iter()
            .chain(self.hollows.iter())
            .find(|b| b.id == id)
            .map(|b| &b.curve)
    }

    pub fn outline_entry(&self) -> CalcResult<(BoundaryId, Curve)> {
        self.outline
            .as_ref()
            .map(|b| (b.id, b.curve.clone()))
            .ok_or_else(|| SectionError::missing_field("outline"))
    }

    pub fn hollow_entries(&self) -> Vec<(BoundaryId, Curve)> {
        self.hollows.iter().map(|b| (b.id, b.curve.clone())).collect()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    fn boundaries_mut(&mut self) -> impl Iterator<Item = &mut DocumentBoundary> {
        self.outline.iter_mut().chain(self.hollows.iter_mut())
    }
}

impl Default for SectionDocument {
    fn default() -> Self {
        SectionDocument::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = SectionDocument::new("Test");
        assert_eq!(doc.meta.version, SCHEMA_VERSION);
        assert!(doc.outline.is_none());
        assert_eq!(doc.outline_entry().unwrap_err().error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_add_update_remove() {
        let mut doc = SectionDocument::new("Test");
        let outline = doc.set_outline(Curve::rectangle(0.0, 0.0, 10.0, 10.0));
        let hollow = doc.add_hollow(Curve::circle(5.0, 5.0, 2.0));
        assert_eq!(doc.hollow_entries().len(), 1);

        doc.update_curve(hollow, Curve::circle(5.0, 5.0, 3.0)).unwrap();
        assert_eq!(doc.curve(hollow), Some(&Curve::circle(5.0, 5.0, 3.0)));
        assert!(doc.update_curve(BoundaryId::new(), Curve::circle(0.0, 0.0, 1.0)).is_err());

        assert!(doc.remove(hollow).is_some());
        assert!(doc.hollows.is_empty());
        assert!(doc.remove(outline).is_some());
        assert!(doc.outline.is_none());
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "meta": { "version": "0.1.0", "name": "min", "created": "2025-01-01T00:00:00Z", "modified": "2025-01-01T00:00:00Z" },
            "outline": { "id": "6f1c2a34-5b7d-4e8f-9a0b-1c2d3e4f5a6b", "curve": { "type": "Circle", "center": { "x": 0.0, "y": 0.0 }, "radius": 5.0 } }
        }"#;
        let doc: SectionDocument = serde_json::from_str(json).unwrap();
        assert!(doc.hollows.is_empty());
        assert_eq!(doc.load, LoadCase::default());
        assert_eq!(doc.material, MaterialSelection::default());
        assert!(matches!(doc.outline.unwrap().curve, Curve::Circle { radius, .. } if radius == 5.0));
    }
}
