//! # Result Table
//!
//! Presents [`SectionProperties`] and an optional [`UtilizationResult`] as
//! `(label, formatted value, unit)` rows in a chosen display unit, and reads
//! and writes that table as CSV with the header `Property,Value,Unit`.
//!
//! Display units only scale the presented numbers; every computation stays
//! in millimetres.
//!
//! ## Example
//!
//! ```rust
//! use section_core::report::ResultTable;
//!
//! let csv = "Property,Value,Unit\nArea,12.5000,cm²\n";
//! let table = ResultTable::from_csv(csv).unwrap();
//! assert_eq!(table.get("Area").unwrap().unit, "cm²");
//! assert_eq!(table.to_csv().unwrap(), csv);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcResult, SectionError};
use crate::properties::SectionProperties;
use crate::units::{LengthUnit, QuantityKind};
use crate::utilization::UtilizationResult;

/// CSV header line
pub const CSV_HEADER: &str = "Property,Value,Unit";

/// One presented quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub label: String,
    pub value: String,
    pub unit: String,
}

impl TableRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>, unit: impl Into<String>) -> Self {
        TableRow {
            label: label.into(),
            value: value.into(),
            unit: unit.into(),
        }
    }
}

/// A raw quantity in base units before formatting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub label: &'static str,
    pub value: f64,
    pub kind: QuantityKind,
}

impl Quantity {
    const fn new(label: &'static str, value: f64, kind: QuantityKind) -> Self {
        Quantity { label, value, kind }
    }
}

/// Ordered list of presented quantities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    pub rows: Vec<TableRow>,
}

/// Section quantities in presentation order
pub fn property_quantities(p: &SectionProperties) -> Vec<Quantity> {
    use QuantityKind::*;
    vec![
        Quantity::new("Area", p.area_mm2, Area),
        Quantity::new("Centroid X", p.centroid.x, Length),
        Quantity::new("Centroid Y", p.centroid.y, Length),
        Quantity::new("Ix", p.ix_mm4, Inertia),
        Quantity::new("Iy", p.iy_mm4, Inertia),
        Quantity::new("Ixy", p.ixy_mm4, Inertia),
        Quantity::new("Ip (Ix+Iy)", p.ip_mm4, Inertia),
        Quantity::new("I1", p.i1_mm4, Inertia),
        Quantity::new("I2", p.i2_mm4, Inertia),
        Quantity::new("Principal angle", p.principal_angle_deg, Angle),
        Quantity::new("Wx", p.wx_mm3, Modulus),
        Quantity::new("Wy", p.wy_mm3, Modulus),
        Quantity::new("ix", p.rx_mm, Length),
        Quantity::new("iy", p.ry_mm, Length),
        Quantity::new("xMax", p.x_max_mm, Length),
        Quantity::new("yMax", p.y_max_mm, Length),
        Quantity::new("Outline length", p.outline_length_mm, Length),
        Quantity::new("Mass", p.mass_kg, Mass),
        Quantity::new("Jx", p.jx_kg_mm2, MassMoment),
        Quantity::new("Jy", p.jy_kg_mm2, MassMoment),
    ]
}

/// Utilization quantities in presentation order
pub fn utilization_quantities(u: &UtilizationResult) -> Vec<Quantity> {
    use QuantityKind::*;
    vec![
        Quantity::new("σx", u.sigma_x.0, Stress),
        Quantity::new("σy", u.sigma_y.0, Stress),
        Quantity::new("τQx", u.tau_qx.0, Stress),
        Quantity::new("τQy", u.tau_qy.0, Stress),
        Quantity::new("τT", u.tau_t.0, Stress),
        Quantity::new("τ", u.tau.0, Stress),
        Quantity::new("σv", u.sigma_v.0, Stress),
        Quantity::new("Utilization", u.utilization_pct, Percent),
    ]
}

/// Format a presented value: fixed four decimals, scientific outside [1e-3, 1e7)
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || (1e-3..1e7).contains(&magnitude) {
        format!("{:.4}", value)
    } else {
        format!("{:.4e}", value)
    }
}

impl ResultTable {
    /// Build the table in the given display unit.
    pub fn build(props: &SectionProperties, utilization: Option<&UtilizationResult>, unit: LengthUnit) -> Self {
        let mut quantities = property_quantities(props);
        if let Some(u) = utilization {
            quantities.extend(utilization_quantities(u));
        }
        let rows = quantities
            .into_iter()
            .map(|q| TableRow::new(q.label, format_value(unit.scale(q.value, q.kind)), unit.label(q.kind)))
            .collect();
        ResultTable { rows }
    }

    pub fn get(&self, label: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize as CSV with a header line
    pub fn to_csv(&self) -> CalcResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::with_capacity(32 * (self.rows.len() + 1)));
        writer.write_record(CSV_HEADER.split(','))?;
        for row in &self.rows {
            writer.write_record([&row.label, &row.value, &row.unit])?;
        }
        let bytes = writer.into_inner().map_err(|e| SectionError::SerializationError {
            reason: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| SectionError::SerializationError {
            reason: e.to_string(),
        })
    }

    /// Parse CSV produced by [`ResultTable::to_csv`]
    pub fn from_csv(text: &str) -> CalcResult<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(text.as_bytes());

        let header = reader.headers()?.iter().collect::<Vec<_>>().join(",");
        if header != CSV_HEADER {
            return Err(SectionError::invalid_input(
                "csv header",
                header,
                format!("Expected '{}'", CSV_HEADER),
            ));
        }

        let rows = reader
            .deserialize::<(String, String, String)>()
            .map(|record| {
                let (label, value, unit) = record?;
                Ok(TableRow { label, value, unit })
            })
            .collect::<CalcResult<Vec<_>>>()?;
        Ok(ResultTable { rows })
    }
}

impl std::fmt::Display for ResultTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
        for row in &self.rows {
            let pad = width - row.label.chars().count();
            writeln!(f, "{}{}  {:>16} {}", row.label, " ".repeat(pad), row.value, row.unit)?;
        }
        Ok(())
    }
}
