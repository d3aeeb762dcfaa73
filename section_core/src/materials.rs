//! # Materials Catalog
//!
//! Density and yield strength for the section material. A material is either
//! a catalog entry or a custom density/yield pair.
//!
//! The catalog is an immutable table that callers pass in. [`MaterialCatalog::standard`]
//! returns the built-in one.
//!
//! | Material | Density (g/cm³) | Yield (MPa) |
//! |----------|-----------------|-------------|
//! | Steel    | 7.85            | 235         |
//! | Aluminum | 2.70            | 160         |
//! | Wood     | 0.50            | 24          |
//! | Concrete | 2.40            | 30          |
//! | Glass    | 2.50            | 45          |
//!
//! ## Example
//!
//! ```rust
//! use section_core::materials::{MaterialCatalog, MaterialKey, MaterialSelection};
//!
//! let catalog = MaterialCatalog::standard();
//! let steel = catalog.resolve(&MaterialSelection::catalog(MaterialKey::Steel));
//! assert_eq!(steel.density_g_cm3, Some(7.85));
//! assert!(steel.warnings.is_empty());
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};

/// Built-in catalog materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialKey {
    Steel,
    Aluminum,
    Wood,
    Concrete,
    Glass,
}

impl MaterialKey {
    /// All catalog keys for selection lists
    pub const ALL: [MaterialKey; 5] = [
        MaterialKey::Steel,
        MaterialKey::Aluminum,
        MaterialKey::Wood,
        MaterialKey::Concrete,
        MaterialKey::Glass,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            MaterialKey::Steel => "Steel",
            MaterialKey::Aluminum => "Aluminum",
            MaterialKey::Wood => "Wood",
            MaterialKey::Concrete => "Concrete",
            MaterialKey::Glass => "Glass",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "steel" | "s235" => Ok(MaterialKey::Steel),
            "aluminum" | "aluminium" | "alu" => Ok(MaterialKey::Aluminum),
            "wood" | "timber" => Ok(MaterialKey::Wood),
            "concrete" => Ok(MaterialKey::Concrete),
            "glass" => Ok(MaterialKey::Glass),
            _ => Err(SectionError::material_not_found(s)),
        }
    }
}

impl std::fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Physical properties of a material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Density (g/cm³)
    pub density_g_cm3: f64,
    /// Yield strength (MPa)
    pub yield_strength_mpa: f64,
}

impl Material {
    pub const fn new(density_g_cm3: f64, yield_strength_mpa: f64) -> Self {
        Material {
            density_g_cm3,
            yield_strength_mpa,
        }
    }
}

/// What the user picked: a catalog entry or custom values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MaterialSelection {
    Catalog { key: MaterialKey },
    Custom {
        density_g_cm3: f64,
        yield_strength_mpa: f64,
    },
}

impl Default for MaterialSelection {
    fn default() -> Self {
        MaterialSelection::Catalog { key: MaterialKey::Steel }
    }
}

impl MaterialSelection {
    pub fn catalog(key: MaterialKey) -> Self {
        MaterialSelection::Catalog { key }
    }

    pub fn custom(density_g_cm3: f64, yield_strength_mpa: f64) -> Self {
        MaterialSelection::Custom {
            density_g_cm3,
            yield_strength_mpa,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            MaterialSelection::Catalog { key } => key.display_name().to_string(),
            MaterialSelection::Custom { .. } => "Custom".to_string(),
        }
    }
}

/// Degraded material inputs (computation continues without them)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialWarning {
    /// Density missing or not strictly positive; mass is reported as zero
    InvalidDensity { value: f64 },
    /// Yield strength missing or not strictly positive; no utilization
    InvalidYieldStrength { value: f64 },
}

impl std::fmt::Display for MaterialWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialWarning::InvalidDensity { value } => {
                write!(f, "Invalid density {} g/cm³, mass set to zero", value)
            }
            MaterialWarning::InvalidYieldStrength { value } => {
                write!(f, "Invalid yield strength {} MPa, utilization skipped", value)
            }
        }
    }
}

/// Material values after validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMaterial {
    pub name: String,
    /// Strictly positive density, if valid
    pub density_g_cm3: Option<f64>,
    /// Strictly positive yield strength, if valid
    pub yield_strength_mpa: Option<f64>,
    pub warnings: Vec<MaterialWarning>,
}

/// Immutable material table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCatalog {
    entries: BTreeMap<MaterialKey, Material>,
}

static STANDARD_CATALOG: Lazy<MaterialCatalog> = Lazy::new(|| {
    MaterialCatalog::from_entries([
        (MaterialKey::Steel, Material::new(7.85, 235.0)),
        (MaterialKey::Aluminum, Material::new(2.70, 160.0)),
        (MaterialKey::Wood, Material::new(0.50, 24.0)),
        (MaterialKey::Concrete, Material::new(2.40, 30.0)),
        (MaterialKey::Glass, Material::new(2.50, 45.0)),
    ])
});

impl MaterialCatalog {
    /// The built-in catalog
    pub fn standard() -> &'static MaterialCatalog {
        &STANDARD_CATALOG
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (MaterialKey, Material)>) -> Self {
        MaterialCatalog {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, key: MaterialKey) -> CalcResult<Material> {
        self.entries
            .get(&key)
            .copied()
            .ok_or_else(|| SectionError::material_not_found(key.display_name()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialKey, &Material)> {
        self.entries.iter().map(|(k, m)| (*k, m))
    }

    /// Resolve a selection to usable values.
    ///
    /// Invalid density or yield strength degrade to `None` with a warning
    /// instead of failing. A key missing from this catalog is treated the
    /// same way (both values invalid).
    pub fn resolve(&self, selection: &MaterialSelection) -> ResolvedMaterial {
        let (name, density, yield_strength) = match selection {
            MaterialSelection::Catalog { key } => match self.get(*key) {
                Ok(m) => (key.display_name().to_string(), m.density_g_cm3, m.yield_strength_mpa),
                Err(_) => (key.display_name().to_string(), 0.0, 0.0),
            },
            MaterialSelection::Custom {
                density_g_cm3,
                yield_strength_mpa,
            } => ("Custom".to_string(), *density_g_cm3, *yield_strength_mpa),
        };

        let mut warnings = Vec::new();
        let density_g_cm3 = positive(density);
        if density_g_cm3.is_none() {
            warnings.push(MaterialWarning::InvalidDensity { value: density });
        }
        let yield_strength_mpa = positive(yield_strength);
        if yield_strength_mpa.is_none() {
            warnings.push(MaterialWarning::InvalidYieldStrength { value: yield_strength });
        }

        ResolvedMaterial {
            name,
            density_g_cm3,
            yield_strength_mpa,
            warnings,
        }
    }
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_values() {
        let catalog = MaterialCatalog::standard();
        assert_eq!(catalog.iter().count(), 5);
        let alu = catalog.get(MaterialKey::Aluminum).unwrap();
        assert_eq!(alu.density_g_cm3, 2.70);
        assert_eq!(alu.yield_strength_mpa, 160.0);
        let glass = catalog.get(MaterialKey::Glass).unwrap();
        assert_eq!(glass.yield_strength_mpa, 45.0);
    }

    #[test]
    fn test_custom_invalid_density_degrades() {
        let resolved = MaterialCatalog::standard().resolve(&MaterialSelection::custom(-1.0, 200.0));
        assert_eq!(resolved.density_g_cm3, None);
        assert_eq!(resolved.yield_strength_mpa, Some(200.0));
        assert_eq!(resolved.warnings, vec![MaterialWarning::InvalidDensity { value: -1.0 }]);
    }

    #[test]
    fn test_custom_zero_yield_degrades() {
        let resolved = MaterialCatalog::standard().resolve(&MaterialSelection::custom(7.0, 0.0));
        assert_eq!(resolved.yield_strength_mpa, None);
        assert_eq!(resolved.warnings.len(), 1);
    }

    #[test]
    fn test_missing_key_in_custom_catalog() {
        let catalog = MaterialCatalog::from_entries([(MaterialKey::Wood, Material::new(0.6, 20.0))]);
        assert!(catalog.get(MaterialKey::Steel).is_err());
        let resolved = catalog.resolve(&MaterialSelection::catalog(MaterialKey::Steel));
        assert_eq!(resolved.density_g_cm3, None);
        assert_eq!(resolved.warnings.len(), 2);
    }

    #[test]
    fn test_flexible_parse() {
        assert_eq!(MaterialKey::from_str_flexible("Aluminium").unwrap(), MaterialKey::Aluminum);
        assert_eq!(MaterialKey::from_str_flexible(" timber ").unwrap(), MaterialKey::Wood);
        assert!(MaterialKey::from_str_flexible("unobtainium").is_err());
    }

    #[test]
    fn test_selection_serialization() {
        let selection = MaterialSelection::custom(1.2, 50.0);
        let json = serde_json::to_string(&selection).unwrap();
        assert!(json.contains("\"type\":\"Custom\""));
        let back: MaterialSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(selection, back);
    }
}
