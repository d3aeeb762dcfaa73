//! Cheap change proxies for boundary curves.
//!
//! Two curves with equal fingerprints are treated as unchanged. This is a
//! proxy, not an identity proof: an edit that keeps bbox, length, degree and
//! span count within the quantization step goes unnoticed.

use serde::{Deserialize, Serialize};

use crate::geometry::{Curve, TOLERANCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeometryFingerprint {
    /// Bounding box corners (x, y, z), quantized
    pub min: [i64; 3],
    pub max: [i64; 3],
    pub length: i64,
    pub degree: u32,
    pub span_count: usize,
}

fn quantize(value: f64) -> i64 {
    (value / TOLERANCE).round() as i64
}

impl GeometryFingerprint {
    pub fn of(curve: &Curve) -> Self {
        let (min, max) = match curve.bounds() {
            Some((lo, hi)) => (
                [quantize(lo.x), quantize(lo.y), quantize(lo.z)],
                [quantize(hi.x), quantize(hi.y), quantize(hi.z)],
            ),
            None => ([0; 3], [0; 3]),
        };
        GeometryFingerprint {
            min,
            max,
            length: quantize(curve.length()),
            degree: curve.degree(),
            span_count: curve.span_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_curves_equal_fingerprints() {
        let a = Curve::rectangle(0.0, 0.0, 10.0, 5.0);
        assert_eq!(GeometryFingerprint::of(&a), GeometryFingerprint::of(&a.clone()));
    }

    #[test]
    fn test_sub_tolerance_jitter_is_ignored() {
        let a = Curve::rectangle(0.0, 0.0, 10.0, 5.0);
        let b = Curve::rectangle(0.0, 0.0, 10.0 + 1e-5, 5.0);
        assert_eq!(GeometryFingerprint::of(&a), GeometryFingerprint::of(&b));
    }

    #[test]
    fn test_moves_and_kind_changes_detected() {
        let a = Curve::rectangle(0.0, 0.0, 10.0, 5.0);
        let moved = Curve::rectangle(1.0, 0.0, 10.0, 5.0);
        assert_ne!(GeometryFingerprint::of(&a), GeometryFingerprint::of(&moved));

        let circle = Curve::circle(0.0, 0.0, 5.0);
        let square = Curve::centered_rectangle(0.0, 0.0, 10.0, 10.0);
        let (fc, fs) = (GeometryFingerprint::of(&circle), GeometryFingerprint::of(&square));
        assert_eq!(fc.min, fs.min);
        assert_ne!(fc, fs);
        assert_eq!(fc.degree, 2);
    }
}
