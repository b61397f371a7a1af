//! Bounded periodic lattices
//!
//! Triply periodic minimal surfaces (gyroid, Schwarz P/D, diamond) are
//! thickened into sheets, and strut lattices (cubic, octet) are built from
//! capsule beams in a folded unit cell. Every lattice is clipped to an
//! explicit box; outside that box the field is exactly the distance to the
//! box, so the pattern never leaks into the rest of a model.

use super::{Field, FieldKind, Metadata, Sdf};
use crate::error::{Error, Result, ensure_positive};
use crate::math::Aabb;
use glam::Vec3;
use serde::Serialize;
use std::f32::consts::TAU;

/// Infill pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatticePattern {
    Gyroid,
    SchwarzP,
    SchwarzD,
    Diamond,
    /// Axis-aligned beams through each cell centre
    Cubic,
    /// Face-diagonal and octahedral struts of the FCC cell
    Octet,
}

impl LatticePattern {
    /// True for the sheet (TPMS) patterns
    pub fn is_surface(self) -> bool {
        matches!(
            self,
            Self::Gyroid | Self::SchwarzP | Self::SchwarzD | Self::Diamond
        )
    }

    /// Signed distance of the unclipped, infinitely repeating pattern
    pub fn distance(self, p: Vec3, cell_size: f32, thickness: f32) -> f32 {
        let half_thickness = thickness * 0.5;
        match self.sheet_value(p * (TAU / cell_size)) {
            // Level-set value to approximate distance
            Some(f) => f.abs() * cell_size / TAU - half_thickness,
            None => strut_distance(self, p, cell_size) - half_thickness,
        }
    }

    /// Raw TPMS value at angular coordinates, `None` for strut patterns
    fn sheet_value(self, a: Vec3) -> Option<f32> {
        let (sx, cx) = a.x.sin_cos();
        let (sy, cy) = a.y.sin_cos();
        let (sz, cz) = a.z.sin_cos();
        match self {
            Self::Gyroid => Some(sx * cy + sy * cz + sz * cx),
            Self::SchwarzP => Some(cx + cy + cz),
            Self::SchwarzD => Some(cx * cy * cz + sx * sy * cz + sx * cy * sz + cx * sy * sz),
            Self::Diamond => Some(sx * sy * sz + sx * cy * cz + cx * sy * cz + cx * cy * sz),
            Self::Cubic | Self::Octet => None,
        }
    }
}

// ============================================================================
// Constructor functions (ergonomic API)
// ============================================================================

/// Lattice of `pattern` filling `bounds`
pub fn lattice(
    pattern: LatticePattern,
    bounds: Aabb,
    cell_size: f32,
    thickness: f32,
) -> Result<Field> {
    Lattice::new(pattern, bounds, cell_size, thickness).map(Field::new)
}

/// Gyroid sheet lattice
pub fn gyroid(bounds: Aabb, cell_size: f32, thickness: f32) -> Result<Field> {
    lattice(LatticePattern::Gyroid, bounds, cell_size, thickness)
}

/// Schwarz Primitive sheet lattice
pub fn schwarz_p(bounds: Aabb, cell_size: f32, thickness: f32) -> Result<Field> {
    lattice(LatticePattern::SchwarzP, bounds, cell_size, thickness)
}

/// Schwarz Diamond sheet lattice
pub fn schwarz_d(bounds: Aabb, cell_size: f32, thickness: f32) -> Result<Field> {
    lattice(LatticePattern::SchwarzD, bounds, cell_size, thickness)
}

/// Diamond sheet lattice
pub fn diamond(bounds: Aabb, cell_size: f32, thickness: f32) -> Result<Field> {
    lattice(LatticePattern::Diamond, bounds, cell_size, thickness)
}

/// Cubic strut lattice
pub fn cubic(bounds: Aabb, cell_size: f32, thickness: f32) -> Result<Field> {
    lattice(LatticePattern::Cubic, bounds, cell_size, thickness)
}

/// Octet truss lattice
pub fn octet(bounds: Aabb, cell_size: f32, thickness: f32) -> Result<Field> {
    lattice(LatticePattern::Octet, bounds, cell_size, thickness)
}

// ============================================================================
// Lattice field
// ============================================================================

/// A periodic pattern clipped to a box
#[derive(Debug, Clone, Copy)]
pub struct Lattice {
    pub pattern: LatticePattern,
    pub region: Aabb,
    pub cell_size: f32,
    pub thickness: f32,
}

impl Lattice {
    pub fn new(
        pattern: LatticePattern,
        region: Aabb,
        cell_size: f32,
        thickness: f32,
    ) -> Result<Self> {
        if !region.is_valid() {
            return Err(Error::invalid(format!(
                "lattice bounds must be finite with positive extent, got {region:?}"
            )));
        }
        ensure_positive("lattice cell size", cell_size)?;
        ensure_positive("lattice thickness", thickness)?;
        Ok(Self {
            pattern,
            region,
            cell_size,
            thickness,
        })
    }
}

impl Sdf for Lattice {
    fn distance(&self, p: Vec3) -> f32 {
        if !self.region.contains(p) {
            return self.region.distance_to(p);
        }
        self.pattern
            .distance(p, self.cell_size, self.thickness)
            .max(self.region.signed_distance(p))
    }

    fn bounds(&self) -> Option<Aabb> {
        Some(self.region)
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Lattice(self.pattern))
            .param("cell_size", self.cell_size)
            .param("thickness", self.thickness)
            .param("bounds_min", self.region.min)
            .param("bounds_max", self.region.max)
    }
}

// ============================================================================
// Strut patterns
// ============================================================================

/// Distance from `p` to the segment `a`-`b`
fn segment_distance(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let t = ((p - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
    (p - a - ab * t).length()
}

/// Unsigned distance to the strut centrelines
///
/// The point is moved into its cell (centred on the origin) and folded into
/// the positive octant, where every strut pattern is a handful of segments
/// between the cell centre, face centres and the corner `(h, h, h)`.
fn strut_distance(pattern: LatticePattern, p: Vec3, cell_size: f32) -> f32 {
    let local = p - ((p / cell_size).floor() + 0.5) * cell_size;
    let q = local.abs();
    let h = cell_size * 0.5;

    match pattern {
        LatticePattern::Cubic => {
            // Beams along X, Y and Z through the centre
            let x = q.y.hypot(q.z);
            let y = q.x.hypot(q.z);
            let z = q.x.hypot(q.y);
            x.min(y).min(z)
        }
        _ => {
            let corner = Vec3::splat(h);
            let faces = [Vec3::new(h, 0.0, 0.0), Vec3::new(0.0, h, 0.0), Vec3::new(0.0, 0.0, h)];
            let mut d = f32::INFINITY;
            for (i, &face) in faces.iter().enumerate() {
                // Face diagonal half from face centre to corner
                d = d.min(segment_distance(q, face, corner));
                // Octahedral edge to the next face centre
                d = d.min(segment_distance(q, face, faces[(i + 1) % 3]));
            }
            d
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn region() -> Aabb {
        Aabb::cube(40.0)
    }

    // ------------------------------------------------------------------------
    // Clipping
    // ------------------------------------------------------------------------

    #[test]
    fn far_point_returns_distance_to_bounds() {
        let g = gyroid(region(), 10.0, 1.0).unwrap();
        let p = Vec3::splat(1000.0);
        let expected = (p - Vec3::splat(40.0)).length();
        let d = g.evaluate(p);
        assert!(d.is_finite());
        assert_relative_eq!(d, expected, max_relative = 1e-5);
    }

    #[test]
    fn every_pattern_is_non_negative_outside_bounds() {
        for pattern in [
            LatticePattern::Gyroid,
            LatticePattern::SchwarzP,
            LatticePattern::SchwarzD,
            LatticePattern::Diamond,
            LatticePattern::Cubic,
            LatticePattern::Octet,
        ] {
            let l = lattice(pattern, region(), 8.0, 1.0).unwrap();
            for p in [
                Vec3::new(41.0, 0.0, 0.0),
                Vec3::new(0.0, -45.0, 3.0),
                Vec3::new(50.0, 50.0, 50.0),
            ] {
                assert!(l.evaluate(p) >= 0.0, "{pattern:?} at {p}");
                assert_relative_eq!(l.evaluate(p), region().distance_to(p));
            }
            assert_eq!(l.kind(), FieldKind::Lattice(pattern));
        }
    }

    #[test]
    fn pattern_is_clipped_by_box_near_faces() {
        let g = gyroid(region(), 10.0, 1.0).unwrap();
        let p = Vec3::new(39.9, 0.0, 0.0);
        assert!(g.evaluate(p) >= region().signed_distance(p));
    }

    #[test]
    fn invalid_lattice_parameters_are_rejected() {
        assert!(gyroid(region(), 0.0, 1.0).is_err());
        assert!(gyroid(region(), 10.0, -1.0).is_err());
        let flat = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert!(gyroid(flat, 10.0, 1.0).is_err());
    }

    // ------------------------------------------------------------------------
    // Surface patterns
    // ------------------------------------------------------------------------

    #[test]
    fn gyroid_passes_through_origin() {
        let g = gyroid(region(), 10.0, 1.0).unwrap();
        assert_relative_eq!(g.evaluate(Vec3::ZERO), -0.5, epsilon = 1e-6);
    }

    #[test]
    fn schwarz_p_peaks_at_origin() {
        let cell = 10.0;
        let d = LatticePattern::SchwarzP.distance(Vec3::ZERO, cell, 1.0);
        assert_relative_eq!(d, 3.0 * cell / TAU - 0.5, epsilon = 1e-5);
    }

    #[test]
    fn surface_patterns_repeat_every_cell() {
        let p = Vec3::new(2.5, 3.0, 1.0);
        let shift = Vec3::splat(10.0);
        for pattern in [
            LatticePattern::Gyroid,
            LatticePattern::SchwarzP,
            LatticePattern::SchwarzD,
            LatticePattern::Diamond,
        ] {
            assert_relative_eq!(
                pattern.distance(p, 10.0, 1.0),
                pattern.distance(p + shift, 10.0, 1.0),
                epsilon = 1e-4
            );
        }
    }

    #[test]
    fn diamond_terms() {
        // At (π/2, π/2, π/2) only sin·sin·sin survives
        let cell = TAU;
        let p = Vec3::splat(std::f32::consts::FRAC_PI_2);
        let d = LatticePattern::Diamond.distance(p, cell, 0.0);
        assert_relative_eq!(d, 1.0, epsilon = 1e-5);
    }

    /// Sheet value at angular coordinates `a` (a cell of TAU makes p = a)
    fn sheet(pattern: LatticePattern, a: Vec3) -> f32 {
        pattern.distance(a, TAU, 0.0)
    }

    #[test]
    fn gyroid_formula_values() {
        use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, FRAC_PI_6};
        // sin x cos y + sin y cos z + sin z cos x
        let a = Vec3::new(FRAC_PI_3, FRAC_PI_6, FRAC_PI_4);
        let expected = 0.75 + 0.5 * FRAC_PI_4.cos() + FRAC_PI_4.sin() * 0.5;
        assert_relative_eq!(sheet(LatticePattern::Gyroid, a), expected, epsilon = 1e-5);

        // Negative level-set values fold to the same sheet distance
        let b = Vec3::new(-FRAC_PI_2, 0.0, 0.0);
        assert_relative_eq!(sheet(LatticePattern::Gyroid, b), 1.0, epsilon = 1e-5);

        // Thickness is split evenly across the sheet
        let d = LatticePattern::Gyroid.distance(a, TAU, 0.4);
        assert_relative_eq!(d, expected - 0.2, epsilon = 1e-5);
    }

    #[test]
    fn schwarz_d_formula_values() {
        use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
        let d = LatticePattern::SchwarzD;
        // Only cos·cos·cos survives at the origin
        assert_relative_eq!(sheet(d, Vec3::ZERO), 1.0, epsilon = 1e-6);
        // Every term vanishes at (π/2, 0, 0)
        assert_relative_eq!(sheet(d, Vec3::new(FRAC_PI_2, 0.0, 0.0)), 0.0, epsilon = 1e-6);
        // Only sin·sin·cos survives at (π/2, π/2, 0)
        assert_relative_eq!(
            sheet(d, Vec3::new(FRAC_PI_2, FRAC_PI_2, 0.0)),
            1.0,
            epsilon = 1e-6
        );
        // All four terms contribute (√2/2)³ at (π/4, π/4, π/4)
        assert_relative_eq!(
            sheet(d, Vec3::splat(FRAC_PI_4)),
            4.0 * 0.5f32.sqrt().powi(3),
            epsilon = 1e-5
        );
    }

    #[test]
    fn strut_patterns_have_no_sheet_value() {
        assert_eq!(LatticePattern::Cubic.sheet_value(Vec3::ONE), None);
        assert_eq!(LatticePattern::Octet.sheet_value(Vec3::ONE), None);
        assert!(LatticePattern::Gyroid.sheet_value(Vec3::ONE).is_some());
    }

    // ------------------------------------------------------------------------
    // Strut patterns
    // ------------------------------------------------------------------------

    #[test]
    fn cubic_beams_run_through_cell_centres() {
        let cell = 10.0;
        let centre = Vec3::splat(5.0);
        assert_relative_eq!(
            LatticePattern::Cubic.distance(centre, cell, 2.0),
            -1.0,
            epsilon = 1e-5
        );
        // Along the X beam the value does not change
        assert_relative_eq!(
            LatticePattern::Cubic.distance(centre + Vec3::new(3.7, 0.0, 0.0), cell, 2.0),
            -1.0,
            epsilon = 1e-5
        );
        // Cell corner is furthest from every beam
        assert_relative_eq!(
            LatticePattern::Cubic.distance(Vec3::ZERO, cell, 2.0),
            50.0f32.sqrt() - 1.0,
            epsilon = 1e-4
        );
    }

    #[test]
    fn octet_nodes_sit_on_struts() {
        let cell = 10.0;
        // Cell corner and face centre are nodes
        for node in [Vec3::ZERO, Vec3::new(5.0, 5.0, 0.0), Vec3::new(10.0, 5.0, 5.0)] {
            assert_relative_eq!(
                LatticePattern::Octet.distance(node, cell, 1.0),
                -0.5,
                epsilon = 1e-4
            );
        }
        // Cell centre is empty
        assert!(LatticePattern::Octet.distance(Vec3::splat(5.0), cell, 1.0) > 0.0);
    }
}
