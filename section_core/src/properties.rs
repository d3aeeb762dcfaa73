//! # Section Properties
//!
//! Derived quantities computed from an [`Integration`]: section moduli, radii
//! of gyration, principal axes and mass per member.
//!
//! All values are in base units (mm, kg). Use [`crate::report`] to present them
//! in another length unit.
//!
//! ## Formulas
//!
//! - `Wx = Ix / y_max`, `Wy = Iy / x_max`
//! - `ix = √(Ix/A)`, `iy = √(Iy/A)`
//! - `I1,2 = (Ix+Iy)/2 ± √(((Ix−Iy)/2)² + Ixy²)`
//! - `m = A · depth · ρ / 10⁶` (mm² · mm · g/cm³ → kg)
//! - `Jx = ρ · depth · Ix / 10⁶` (kg·mm²)

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;
use crate::integrate::Integration;

/// Immutable result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    // === Geometry ===
    /// Net area (mm²)
    pub area_mm2: f64,

    /// Centroid in section plane coordinates (mm)
    pub centroid: Point2,

    /// Outline length (mm)
    pub outline_length_mm: f64,

    // === Second moments (about centroidal axes) ===
    /// Ix (mm⁴)
    pub ix_mm4: f64,

    /// Iy (mm⁴)
    pub iy_mm4: f64,

    /// Product of inertia Ixy (mm⁴)
    pub ixy_mm4: f64,

    /// Polar moment Ip = Ix + Iy (mm⁴)
    pub ip_mm4: f64,

    /// Major principal moment I1 (mm⁴)
    pub i1_mm4: f64,

    /// Minor principal moment I2 (mm⁴)
    pub i2_mm4: f64,

    /// Angle from the x axis to the major principal axis (degrees)
    pub principal_angle_deg: f64,

    // === Extreme fibers and moduli ===
    /// Largest |x - cx| (mm)
    pub x_max_mm: f64,

    /// Largest |y - cy| (mm)
    pub y_max_mm: f64,

    /// Wx = Ix / y_max (mm³)
    pub wx_mm3: f64,

    /// Wy = Iy / x_max (mm³)
    pub wy_mm3: f64,

    // === Radii of gyration ===
    /// ix = √(Ix/A) (mm)
    pub rx_mm: f64,

    /// iy = √(Iy/A) (mm)
    pub ry_mm: f64,

    // === Mass ===
    /// Profile depth used for mass (mm)
    pub profile_depth_mm: f64,

    /// Mass of one member of `profile_depth_mm` (kg); zero when density is invalid
    pub mass_kg: f64,

    /// ρ·depth·Ix (kg·mm²)
    pub jx_kg_mm2: f64,

    /// ρ·depth·Iy (kg·mm²)
    pub jy_kg_mm2: f64,
}

impl SectionProperties {
    /// Derive properties from integration output.
    ///
    /// `density_g_cm3` must already be validated; `None` yields zero mass.
    pub fn derive(
        integration: &Integration,
        outline_length_mm: f64,
        density_g_cm3: Option<f64>,
        profile_depth_mm: f64,
    ) -> Self {
        let area = integration.area;
        let (ix, iy, ixy) = (integration.ix, integration.iy, integration.ixy);
        let (i1, i2, angle) = principal_moments(ix, iy, ixy);

        let rho = density_g_cm3.unwrap_or(0.0);
        let per_depth = rho * profile_depth_mm / 1e6;

        SectionProperties {
            area_mm2: area,
            centroid: integration.centroid,
            outline_length_mm,
            ix_mm4: ix,
            iy_mm4: iy,
            ixy_mm4: ixy,
            ip_mm4: ix + iy,
            i1_mm4: i1,
            i2_mm4: i2,
            principal_angle_deg: angle.to_degrees(),
            x_max_mm: integration.x_max,
            y_max_mm: integration.y_max,
            wx_mm3: ix / integration.y_max,
            wy_mm3: iy / integration.x_max,
            rx_mm: (ix / area).max(0.0).sqrt(),
            ry_mm: (iy / area).max(0.0).sqrt(),
            profile_depth_mm,
            mass_kg: area * per_depth,
            jx_kg_mm2: ix * per_depth,
            jy_kg_mm2: iy * per_depth,
        }
    }

    /// Larger of the two extreme-fiber distances
    pub fn max_fiber_mm(&self) -> f64 {
        self.x_max_mm.max(self.y_max_mm)
    }

    /// Major principal axis direction as a unit vector in plane coordinates
    pub fn major_axis(&self) -> Point2 {
        let a = self.principal_angle_deg.to_radians();
        Point2::new(a.cos(), a.sin())
    }

    /// Minor principal axis direction as a unit vector in plane coordinates
    pub fn minor_axis(&self) -> Point2 {
        let a = self.principal_angle_deg.to_radians();
        Point2::new(-a.sin(), a.cos())
    }
}

/// Principal moments `(I1, I2, θ)` with θ in radians from the x axis to the I1 axis
pub fn principal_moments(ix: f64, iy: f64, ixy: f64) -> (f64, f64, f64) {
    let avg = (ix + iy) / 2.0;
    let half_diff = (ix - iy) / 2.0;
    let radius = (half_diff * half_diff + ixy * ixy).sqrt();
    let theta = 0.5 * (-2.0 * ixy).atan2(ix - iy);
    (avg + radius, avg - radius, theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::IntegrationStrategy;
    use crate::surface::Surface;
    use approx::assert_relative_eq;

    fn integration(area: f64, ix: f64, iy: f64, ixy: f64, x_max: f64, y_max: f64) -> Integration {
        Integration {
            area,
            centroid: Point2::new(0.0, 0.0),
            ix,
            iy,
            ixy,
            x_max,
            y_max,
            strategy: IntegrationStrategy::Direct,
            surface: Surface::new(Vec::new(), Vec::new()),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_rectangle_derivation() {
        // 100 x 200 rectangle
        let (b, h) = (100.0_f64, 200.0_f64);
        let ix = b * h.powi(3) / 12.0;
        let iy = h * b.powi(3) / 12.0;
        let props = SectionProperties::derive(&integration(b * h, ix, iy, 0.0, 50.0, 100.0), 600.0, Some(7.85), 1000.0);

        assert_relative_eq!(props.wx_mm3, b * h * h / 6.0, max_relative = 1e-12);
        assert_relative_eq!(props.wy_mm3, h * b * b / 6.0, max_relative = 1e-12);
        assert_relative_eq!(props.rx_mm, h / 12.0_f64.sqrt(), max_relative = 1e-12);
        assert_relative_eq!(props.ry_mm, b / 12.0_f64.sqrt(), max_relative = 1e-12);
        assert_relative_eq!(props.ip_mm4, ix + iy, max_relative = 1e-12);
        // 20000 mm² x 1000 mm x 7.85 g/cm³ = 157 kg
        assert_relative_eq!(props.mass_kg, 157.0, max_relative = 1e-12);
        assert_relative_eq!(props.i1_mm4, ix, max_relative = 1e-12);
        assert_relative_eq!(props.i2_mm4, iy, max_relative = 1e-12);
        assert!(props.principal_angle_deg.abs() < 1e-12);
    }

    #[test]
    fn test_invalid_density_gives_zero_mass() {
        let props = SectionProperties::derive(&integration(100.0, 1.0, 1.0, 0.0, 1.0, 1.0), 40.0, None, 1000.0);
        assert_eq!(props.mass_kg, 0.0);
        assert_eq!(props.jx_kg_mm2, 0.0);
    }

    #[test]
    fn test_principal_moments_rotated() {
        // equal moments with a product term: axes at 45 degrees
        let (i1, i2, theta) = principal_moments(10.0, 10.0, -4.0);
        assert_relative_eq!(i1, 14.0, max_relative = 1e-12);
        assert_relative_eq!(i2, 6.0, max_relative = 1e-12);
        assert_relative_eq!(theta.to_degrees(), 45.0, max_relative = 1e-12);
    }

    #[test]
    fn test_principal_axes_are_orthogonal() {
        let props = SectionProperties::derive(&integration(10.0, 30.0, 12.0, 5.0, 2.0, 3.0), 12.0, None, 1000.0);
        let dot = props.major_axis().dot(&props.minor_axis());
        assert!(dot.abs() < 1e-12);
    }
}
