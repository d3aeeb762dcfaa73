//! # Load Case
//!
//! Actions applied to the section for the utilization check: bending moments,
//! shear forces, torsion and a safety factor on the yield strength.
//!
//! All components default to zero and the safety factor to one, so a partial
//! JSON object is valid:
//!
//! ```rust
//! use section_core::loads::LoadCase;
//!
//! let load: LoadCase = serde_json::from_str(r#"{ "mx": 12.5, "qy": 40.0 }"#).unwrap();
//! assert!(load.is_loaded());
//! assert_eq!(load.safety_factor, 1.0);
//! assert!(load.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};
use crate::units::{KiloNewtonMeters, KiloNewtons};

/// Loads acting on the section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadCase {
    /// Bending moment about the x axis (kN·m)
    pub mx: KiloNewtonMeters,

    /// Bending moment about the y axis (kN·m)
    pub my: KiloNewtonMeters,

    /// Shear force along x (kN)
    pub qx: KiloNewtons,

    /// Shear force along y (kN)
    pub qy: KiloNewtons,

    /// Torsion (kN·m)
    pub torsion: KiloNewtonMeters,

    /// Divides the yield strength to give the allowable stress
    pub safety_factor: f64,
}

impl Default for LoadCase {
    fn default() -> Self {
        LoadCase {
            mx: KiloNewtonMeters(0.0),
            my: KiloNewtonMeters(0.0),
            qx: KiloNewtons(0.0),
            qy: KiloNewtons(0.0),
            torsion: KiloNewtonMeters(0.0),
            safety_factor: 1.0,
        }
    }
}

impl LoadCase {
    /// Unloaded case with safety factor 1
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_moments(mut self, mx_knm: f64, my_knm: f64) -> Self {
        self.mx = KiloNewtonMeters(mx_knm);
        self.my = KiloNewtonMeters(my_knm);
        self
    }

    pub fn with_shear(mut self, qx_kn: f64, qy_kn: f64) -> Self {
        self.qx = KiloNewtons(qx_kn);
        self.qy = KiloNewtons(qy_kn);
        self
    }

    pub fn with_torsion(mut self, t_knm: f64) -> Self {
        self.torsion = KiloNewtonMeters(t_knm);
        self
    }

    pub fn with_safety_factor(mut self, safety_factor: f64) -> Self {
        self.safety_factor = safety_factor;
        self
    }

    /// True if at least one load component is nonzero
    pub fn is_loaded(&self) -> bool {
        [self.mx.0, self.my.0, self.qx.0, self.qy.0, self.torsion.0]
            .iter()
            .any(|v| *v != 0.0)
    }

    /// Validate load values.
    pub fn validate(&self) -> CalcResult<()> {
        let components = [
            ("mx", self.mx.0),
            ("my", self.my.0),
            ("qx", self.qx.0),
            ("qy", self.qy.0),
            ("torsion", self.torsion.0),
        ];
        for (field, value) in components {
            if !value.is_finite() {
                return Err(SectionError::invalid_input(
                    field,
                    value.to_string(),
                    "Load components must be finite",
                ));
            }
        }
        if !(self.safety_factor > 0.0) || !self.safety_factor.is_finite() {
            return Err(SectionError::invalid_input(
                "safety_factor",
                self.safety_factor.to_string(),
                "Safety factor must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unloaded() {
        let load = LoadCase::default();
        assert!(!load.is_loaded());
        assert_eq!(load.safety_factor, 1.0);
        assert!(load.validate().is_ok());
    }

    #[test]
    fn test_any_component_loads() {
        assert!(LoadCase::new().with_torsion(-0.5).is_loaded());
        assert!(LoadCase::new().with_shear(0.0, 3.0).is_loaded());
    }

    #[test]
    fn test_non_positive_safety_factor_rejected() {
        for sf in [0.0, -1.5, f64::NAN] {
            let err = LoadCase::new().with_safety_factor(sf).validate().unwrap_err();
            assert!(err.is_input_error());
        }
    }

    #[test]
    fn test_serialization_roundtrip() {
        let load = LoadCase::new().with_moments(10.0, -2.0).with_shear(5.0, 0.0).with_safety_factor(1.5);
        let json = serde_json::to_string(&load).unwrap();
        let back: LoadCase = serde_json::from_str(&json).unwrap();
        assert_eq!(load, back);
    }
}
