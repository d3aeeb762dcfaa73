//! Degraded-result notices carried beside the results.

use serde::{Deserialize, Serialize};

use crate::materials::MaterialWarning;
use crate::section::BoundaryId;

/// Section axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// A condition that was recovered from rather than reported as an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum Warning {
    /// Extreme-fiber distance was ~0 and got clamped
    ExtremeFiberClamped { axis: Axis, value: f64, clamped_to: f64 },
    /// Density invalid; mass reported as zero
    InvalidDensity { value: f64 },
    /// Yield strength invalid; utilization skipped
    InvalidYieldStrength { value: f64 },
    /// A hollow was dropped during validation
    HollowDropped { index: usize, id: BoundaryId, reason: String },
    /// Direct integration was unusable; mesh integration used instead
    MeshFallback { reason: String },
}

impl From<MaterialWarning> for Warning {
    fn from(w: MaterialWarning) -> Self {
        match w {
            MaterialWarning::InvalidDensity { value } => Warning::InvalidDensity { value },
            MaterialWarning::InvalidYieldStrength { value } => Warning::InvalidYieldStrength { value },
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ExtremeFiberClamped { axis, value, clamped_to } => write!(
                f,
                "Extreme fiber distance along {} is {:.6}, clamped to {}",
                axis, value, clamped_to
            ),
            Warning::InvalidDensity { value } => {
                write!(f, "{}", MaterialWarning::InvalidDensity { value: *value })
            }
            Warning::InvalidYieldStrength { value } => {
                write!(f, "{}", MaterialWarning::InvalidYieldStrength { value: *value })
            }
            Warning::HollowDropped { index, reason, .. } => {
                write!(f, "Hollow #{} dropped: {}", index + 1, reason)
            }
            Warning::MeshFallback { reason } => write!(f, "Mesh integration used: {}", reason),
        }
    }
}
