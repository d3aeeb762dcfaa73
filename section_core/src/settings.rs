//! # Analysis Settings
//!
//! Tunables for one analysis run. Every field has a default, so a settings
//! block in a JSON document can be partial or missing entirely.
//!
//! ```rust
//! use section_core::settings::{AnalysisSettings, AccuracyMode};
//!
//! let settings: AnalysisSettings = serde_json::from_str(r#"{ "accuracy": "High" }"#).unwrap();
//! assert_eq!(settings.accuracy, AccuracyMode::High);
//! assert_eq!(settings.profile_depth_mm, 1000.0);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};
use crate::units::LengthUnit;

/// Accuracy tier for sampling, validation and meshing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccuracyMode {
    /// Sparse sampling, tolerant containment checks
    #[default]
    Fast,
    /// Dense sampling, strict containment checks, finer mesh
    High,
}

impl AccuracyMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            AccuracyMode::Fast => "Fast",
            AccuracyMode::High => "High accuracy",
        }
    }
}

/// How second moments of area are integrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntegrationStrategy {
    /// Closed-form polygon-with-holes moments (exact for the boundary)
    #[default]
    Direct,
    /// Triangulated integration with parallel-axis correction
    Mesh,
}

/// Settings for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Accuracy tier
    pub accuracy: AccuracyMode,

    /// Second-moment integration strategy
    pub strategy: IntegrationStrategy,

    /// Unit used when presenting results (display only)
    pub display_unit: LengthUnit,

    /// Profile depth used for mass per member (mm)
    pub profile_depth_mm: f64,

    /// Change-tracking poll cadence (ms); doubled in high accuracy
    pub poll_interval_ms: u64,

    /// Poll delay after a host change hint (ms)
    pub hint_interval_ms: u64,

    /// Upper bound on surface construction and meshing (ms)
    pub surface_timeout_ms: Option<u64>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            accuracy: AccuracyMode::Fast,
            strategy: IntegrationStrategy::Direct,
            display_unit: LengthUnit::Millimeter,
            profile_depth_mm: 1000.0,
            poll_interval_ms: 1000,
            hint_interval_ms: 100,
            surface_timeout_ms: None,
        }
    }
}

impl AnalysisSettings {
    /// Settings with high accuracy enabled
    pub fn high_accuracy() -> Self {
        AnalysisSettings {
            accuracy: AccuracyMode::High,
            ..Self::default()
        }
    }

    /// Validate settings values.
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.profile_depth_mm > 0.0) || !self.profile_depth_mm.is_finite() {
            return Err(SectionError::invalid_input(
                "profile_depth_mm",
                self.profile_depth_mm.to_string(),
                "Profile depth must be positive",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(SectionError::invalid_input(
                "poll_interval_ms",
                "0",
                "Poll interval must be at least 1 ms",
            ));
        }
        Ok(())
    }

    /// Effective poll cadence for the change tracker
    pub fn poll_interval(&self) -> Duration {
        let base = Duration::from_millis(self.poll_interval_ms);
        match self.accuracy {
            AccuracyMode::Fast => base,
            AccuracyMode::High => base * 2,
        }
    }

    /// Poll delay after a host change hint (never longer than the cadence)
    pub fn hint_interval(&self) -> Duration {
        Duration::from_millis(self.hint_interval_ms).min(self.poll_interval())
    }

    pub fn surface_timeout(&self) -> Option<Duration> {
        self.surface_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AnalysisSettings::default();
        assert_eq!(settings.accuracy, AccuracyMode::Fast);
        assert_eq!(settings.strategy, IntegrationStrategy::Direct);
        assert_eq!(settings.profile_depth_mm, 1000.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_poll_interval_doubles_in_high_accuracy() {
        assert_eq!(AnalysisSettings::default().poll_interval(), Duration::from_secs(1));
        assert_eq!(AnalysisSettings::high_accuracy().poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_json() {
        let settings: AnalysisSettings =
            serde_json::from_str(r#"{ "display_unit": "cm", "surface_timeout_ms": 250 }"#).unwrap();
        assert_eq!(settings.display_unit, LengthUnit::Centimeter);
        assert_eq!(settings.surface_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(settings.poll_interval_ms, 1000);
    }

    #[test]
    fn test_invalid_depth() {
        let settings = AnalysisSettings {
            profile_depth_mm: 0.0,
            ..AnalysisSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
