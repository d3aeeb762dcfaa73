//! # Unit Types
//!
//! Type-safe wrappers for the units the section engine works in, plus the
//! display-unit selection used by the result table.
//!
//! ## Base Units
//!
//! All internal computation is performed in a single base system:
//! - Length: millimetres (mm)
//! - Force: newtons (N)
//! - Moment: newton-millimetres (N·mm)
//! - Stress: megapascals (MPa = N/mm²)
//! - Density: grams per cubic centimetre (g/cm³)
//!
//! Loads are entered in engineering units (kN, kN·m) and converted once, at
//! the boundary of the utilization calculator.
//!
//! ## Display Units
//!
//! [`LengthUnit`] is a pure display-scale factor. A quantity of kind `k`
//! (length¹, area², modulus³, inertia⁴) is shown as `value × factor^k`.
//!
//! ## Example
//!
//! ```rust
//! use section_core::units::{KiloNewtonMeters, NewtonMillimeters, LengthUnit, QuantityKind};
//!
//! let m = KiloNewtonMeters(2.5);
//! let m_nmm: NewtonMillimeters = m.into();
//! assert_eq!(m_nmm.0, 2_500_000.0);
//!
//! let area_cm2 = LengthUnit::Centimeter.scale(500.0, QuantityKind::Area);
//! assert!((area_cm2 - 5.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use crate::errors::SectionError;

// ============================================================================
// Display Units
// ============================================================================

/// Length unit used for presenting results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Millimetres (base unit)
    #[default]
    #[serde(rename = "mm")]
    Millimeter,
    /// Centimetres
    #[serde(rename = "cm")]
    Centimeter,
    /// Metres
    #[serde(rename = "m")]
    Meter,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 3] = [LengthUnit::Millimeter, LengthUnit::Centimeter, LengthUnit::Meter];

    /// Conversion factor from millimetres to this unit
    pub fn factor(&self) -> f64 {
        match self {
            LengthUnit::Millimeter => 1.0,
            LengthUnit::Centimeter => 0.1,
            LengthUnit::Meter => 0.001,
        }
    }

    /// Unit symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Millimeter => "mm",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Meter => "m",
        }
    }

    /// Scale a base-unit value of the given kind into this unit
    pub fn scale(&self, value: f64, kind: QuantityKind) -> f64 {
        value * self.factor().powi(kind.length_power())
    }

    /// Unit label for a quantity of the given kind (e.g. "cm⁴", "kg·m²")
    pub fn label(&self, kind: QuantityKind) -> String {
        let sym = self.symbol();
        match kind {
            QuantityKind::Length => sym.to_string(),
            QuantityKind::Area => format!("{}²", sym),
            QuantityKind::Modulus => format!("{}³", sym),
            QuantityKind::Inertia => format!("{}⁴", sym),
            QuantityKind::MassMoment => format!("kg·{}²", sym),
            QuantityKind::Mass => "kg".to_string(),
            QuantityKind::Stress => "MPa".to_string(),
            QuantityKind::Angle => "deg".to_string(),
            QuantityKind::Percent => "%".to_string(),
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for LengthUnit {
    type Err = SectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" => Ok(LengthUnit::Millimeter),
            "cm" => Ok(LengthUnit::Centimeter),
            "m" => Ok(LengthUnit::Meter),
            other => Err(SectionError::invalid_input(
                "display_unit",
                other,
                "Expected one of mm, cm, m",
            )),
        }
    }
}

/// Dimensional kind of a reported quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityKind {
    Length,
    Area,
    Modulus,
    Inertia,
    /// Mass moment of inertia (kg·length²)
    MassMoment,
    Mass,
    Stress,
    Angle,
    Percent,
}

impl QuantityKind {
    /// Power of length carried by this kind
    pub fn length_power(&self) -> i32 {
        match self {
            QuantityKind::Length => 1,
            QuantityKind::Area | QuantityKind::MassMoment => 2,
            QuantityKind::Modulus => 3,
            QuantityKind::Inertia => 4,
            QuantityKind::Mass | QuantityKind::Stress | QuantityKind::Angle | QuantityKind::Percent => 0,
        }
    }
}

// ============================================================================
// Force Units
// ============================================================================

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

/// Force in kilonewtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloNewtons(pub f64);

impl From<KiloNewtons> for Newtons {
    fn from(kn: KiloNewtons) -> Self {
        Newtons(kn.0 * 1000.0)
    }
}

impl From<Newtons> for KiloNewtons {
    fn from(n: Newtons) -> Self {
        KiloNewtons(n.0 / 1000.0)
    }
}

// ============================================================================
// Moment Units
// ============================================================================

/// Moment in newton-millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMillimeters(pub f64);

/// Moment in kilonewton-metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloNewtonMeters(pub f64);

impl From<KiloNewtonMeters> for NewtonMillimeters {
    fn from(knm: KiloNewtonMeters) -> Self {
        NewtonMillimeters(knm.0 * 1.0e6)
    }
}

impl From<NewtonMillimeters> for KiloNewtonMeters {
    fn from(nmm: NewtonMillimeters) -> Self {
        KiloNewtonMeters(nmm.0 / 1.0e6)
    }
}

// ============================================================================
// Stress Units
// ============================================================================

/// Stress in megapascals (N/mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Megapascals(pub f64);

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Newtons);
impl_arithmetic!(KiloNewtons);
impl_arithmetic!(NewtonMillimeters);
impl_arithmetic!(KiloNewtonMeters);
impl_arithmetic!(Megapascals);
