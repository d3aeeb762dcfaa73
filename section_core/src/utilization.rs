//! # Utilization
//!
//! Combines bending, shear and torsion into a von Mises equivalent stress and
//! compares it with the allowable stress `fy / γ`.
//!
//! ## Assumptions
//!
//! - Bending stress per axis uses the magnitude of the moment only; opposite
//!   signed fibers are not superposed
//! - Shear uses the rectangular-section factor 1.5 for every shape
//! - Torsional shear uses `Ix + Iy` as a proxy for the torsion constant
//!
//! ## Example
//!
//! ```rust
//! use section_core::utilization::utilization_pct;
//!
//! // σv equal to the allowable stress is exactly 100 %
//! assert_eq!(utilization_pct(125.0, 250.0, 2.0), 100.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::loads::LoadCase;
use crate::properties::SectionProperties;
use crate::units::{Megapascals, NewtonMillimeters, Newtons};

/// Shear factor for the average-to-peak shear stress
const SHEAR_FACTOR: f64 = 1.5;

/// Stresses and utilization for one load case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationResult {
    // === Normal stress ===
    /// σx = |Mx| / Wx
    pub sigma_x: Megapascals,
    /// σy = |My| / Wy
    pub sigma_y: Megapascals,

    // === Shear stress ===
    /// τQx = 1.5·|Qx| / A
    pub tau_qx: Megapascals,
    /// τQy = 1.5·|Qy| / A
    pub tau_qy: Megapascals,
    /// τT = |T|·max(x_max, y_max) / (Ix + Iy)
    pub tau_t: Megapascals,
    /// τ = √(τQx² + τQy² + τT²)
    pub tau: Megapascals,

    // === Check ===
    /// σv = √(σx² + σy² − σx·σy + 3τ²)
    pub sigma_v: Megapascals,
    /// fy / γ
    pub allowable: Megapascals,
    /// σv / allowable × 100
    pub utilization_pct: f64,
}

impl UtilizationResult {
    /// True when the section is over-utilized (> 100 %)
    pub fn exceeds(&self) -> bool {
        self.utilization_pct > 100.0
    }

    pub fn status(&self) -> &'static str {
        if self.exceeds() {
            "FAILS"
        } else {
            "OK"
        }
    }
}

/// Utilization percentage for an equivalent stress
pub fn utilization_pct(sigma_v_mpa: f64, yield_strength_mpa: f64, safety_factor: f64) -> f64 {
    sigma_v_mpa / (yield_strength_mpa / safety_factor) * 100.0
}

/// Run the utilization check.
///
/// Returns `Ok(None)` when the load case is empty or no valid yield strength is
/// available. An invalid safety factor is an input error.
pub fn calculate(
    props: &SectionProperties,
    load: &LoadCase,
    yield_strength_mpa: Option<f64>,
) -> CalcResult<Option<UtilizationResult>> {
    load.validate()?;
    let fy = match yield_strength_mpa {
        Some(fy) if fy > 0.0 && fy.is_finite() => fy,
        _ => return Ok(None),
    };
    if !load.is_loaded() {
        return Ok(None);
    }

    let mx = NewtonMillimeters::from(load.mx).value().abs();
    let my = NewtonMillimeters::from(load.my).value().abs();
    let qx = Newtons::from(load.qx).value().abs();
    let qy = Newtons::from(load.qy).value().abs();
    let t = NewtonMillimeters::from(load.torsion).value().abs();

    let sigma_x = mx / props.wx_mm3;
    let sigma_y = my / props.wy_mm3;
    let tau_qx = SHEAR_FACTOR * qx / props.area_mm2;
    let tau_qy = SHEAR_FACTOR * qy / props.area_mm2;
    let tau_t = t * props.max_fiber_mm() / props.ip_mm4;
    let tau = (tau_qx * tau_qx + tau_qy * tau_qy + tau_t * tau_t).sqrt();

    let sigma_v = (sigma_x * sigma_x + sigma_y * sigma_y - sigma_x * sigma_y + 3.0 * tau * tau).sqrt();

    Ok(Some(UtilizationResult {
        sigma_x: Megapascals(sigma_x),
        sigma_y: Megapascals(sigma_y),
        tau_qx: Megapascals(tau_qx),
        tau_qy: Megapascals(tau_qy),
        tau_t: Megapascals(tau_t),
        tau: Megapascals(tau),
        sigma_v: Megapascals(sigma_v),
        allowable: Megapascals(fy / load.safety_factor),
        utilization_pct: utilization_pct(sigma_v, fy, load.safety_factor),
    }))
}
