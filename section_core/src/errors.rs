//! # Error Types
//!
//! Structured error types for section_core. Every failure the pipeline can
//! report is a variant here, carrying enough context for a caller (human,
//! UI panel or LLM) to understand which boundary or input is at fault.
//!
//! ## Taxonomy
//!
//! - **Input errors** (`InvalidInput`, `MissingField`, `MaterialNotFound`,
//!   `NotClosed`, `NotPlanar`): the pipeline does not run, prior results stay.
//! - **Geometric errors** (`OutsideOutline`, `IntersectsOtherHollow`,
//!   `SurfaceConstructionFailed`, `NoArea`, `Timeout`): no partial properties.
//! - **Loop errors** (`TrackingFailed`): the change tracker disabled itself.
//!
//! Degenerate-but-recoverable conditions are not errors; see
//! [`crate::warnings::Warning`].
//!
//! ## Example
//!
//! ```rust
//! use section_core::errors::{SectionError, CalcResult};
//!
//! fn validate_depth(depth_mm: f64) -> CalcResult<()> {
//!     if depth_mm <= 0.0 {
//!         return Err(SectionError::invalid_input(
//!             "profile_depth_mm",
//!             depth_mm.to_string(),
//!             "Profile depth must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_depth(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for section_core operations
pub type CalcResult<T> = Result<T, SectionError>;

/// Structured error type for section operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum SectionError {
    /// An input value is invalid (out of range, unparseable, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Material not found in catalog
    #[error("Material not found: {material_name}")]
    MaterialNotFound { material_name: String },

    /// Boundary curve does not close on itself
    #[error("Boundary '{boundary}' is not closed (gap {gap:.6})")]
    NotClosed { boundary: String, gap: f64 },

    /// Boundary curve does not lie in a single plane (or not in the section plane)
    #[error("Boundary '{boundary}' is not planar (deviation {deviation:.6})")]
    NotPlanar { boundary: String, deviation: f64 },

    /// Hollow is not contained in the outline
    #[error("Hollow '{boundary}' lies outside the outline: {reason}")]
    OutsideOutline { boundary: String, reason: String },

    /// Hollow intersects or overlaps an earlier hollow
    #[error("Hollow '{boundary}' intersects hollow '{other}'")]
    IntersectsOtherHollow { boundary: String, other: String },

    /// Planar surface (polygon with holes) could not be built
    #[error("Surface construction failed: {reason}")]
    SurfaceConstructionFailed { reason: String },

    /// The constructed surface encloses no area
    #[error("Section has no area (computed {area})")]
    NoArea { area: f64 },

    /// A bounded stage ran past its configured deadline
    #[error("Timed out during {stage} after {limit_ms} ms")]
    Timeout { stage: String, limit_ms: u64 },

    /// Change-tracking loop failed and disabled itself
    #[error("Change tracking failed: {reason}")]
    TrackingFailed { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Another process holds the file lock
    #[error("File '{path}' is locked by {holder} since {since}")]
    FileLocked {
        path: String,
        holder: String,
        since: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SectionError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        SectionError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        SectionError::MissingField { field: field.into() }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material_name: impl Into<String>) -> Self {
        SectionError::MaterialNotFound {
            material_name: material_name.into(),
        }
    }

    /// Create an OutsideOutline error
    pub fn outside_outline(boundary: impl Into<String>, reason: impl Into<String>) -> Self {
        SectionError::OutsideOutline {
            boundary: boundary.into(),
            reason: reason.into(),
        }
    }

    /// Create a SurfaceConstructionFailed error
    pub fn surface_failed(reason: impl Into<String>) -> Self {
        SectionError::SurfaceConstructionFailed { reason: reason.into() }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        SectionError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's inputs rather than geometry
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SectionError::InvalidInput { .. }
                | SectionError::MissingField { .. }
                | SectionError::MaterialNotFound { .. }
                | SectionError::NotClosed { .. }
                | SectionError::NotPlanar { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            SectionError::InvalidInput { .. } => "INVALID_INPUT",
            SectionError::MissingField { .. } => "MISSING_FIELD",
            SectionError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            SectionError::NotClosed { .. } => "NOT_CLOSED",
            SectionError::NotPlanar { .. } => "NOT_PLANAR",
            SectionError::OutsideOutline { .. } => "OUTSIDE_OUTLINE",
            SectionError::IntersectsOtherHollow { .. } => "INTERSECTS_OTHER_HOLLOW",
            SectionError::SurfaceConstructionFailed { .. } => "SURFACE_CONSTRUCTION_FAILED",
            SectionError::NoArea { .. } => "NO_AREA",
            SectionError::Timeout { .. } => "TIMEOUT",
            SectionError::TrackingFailed { .. } => "TRACKING_FAILED",
            SectionError::FileError { .. } => "FILE_ERROR",
            SectionError::FileLocked { .. } => "FILE_LOCKED",
            SectionError::SerializationError { .. } => "SERIALIZATION_ERROR",
            SectionError::VersionMismatch { .. } => "VERSION_MISMATCH",
            SectionError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for SectionError {
    fn from(e: serde_json::Error) -> Self {
        SectionError::SerializationError { reason: e.to_string() }
    }
}

impl From<csv::Error> for SectionError {
    fn from(e: csv::Error) -> Self {
        SectionError::SerializationError { reason: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = SectionError::invalid_input("safety_factor", "-1", "Safety factor must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: SectionError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(SectionError::missing_field("outline").error_code(), "MISSING_FIELD");
        assert_eq!(SectionError::material_not_found("Unobtainium").error_code(), "MATERIAL_NOT_FOUND");
        assert_eq!(SectionError::NoArea { area: 0.0 }.error_code(), "NO_AREA");
    }

    #[test]
    fn test_input_error_classification() {
        let not_closed = SectionError::NotClosed {
            boundary: "outline".to_string(),
            gap: 2.0,
        };
        assert!(not_closed.is_input_error());
        assert!(!SectionError::surface_failed("self-intersection").is_input_error());
    }

    #[test]
    fn test_display_mentions_boundary() {
        let err = SectionError::IntersectsOtherHollow {
            boundary: "hollow #2".to_string(),
            other: "hollow #1".to_string(),
        };
        assert_eq!(err.to_string(), "Hollow 'hollow #2' intersects hollow 'hollow #1'");
    }
}
