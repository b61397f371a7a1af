//! Spatial transforms
//!
//! Each transform maps the query point through the inverse transform before
//! delegating to its child, and maps the child's bounds through the forward
//! transform so they stay tight.

use super::{Field, FieldKind, MaterialId, Metadata, Sdf};
use crate::diagnostics::{Diagnosed, Diagnostic};
use crate::error::{Error, Result, ensure_finite, ensure_finite_vec, ensure_positive};
use crate::math::Aabb;
use glam::{Quat, Vec2, Vec3};

// ============================================================================
// Constructor functions (ergonomic API)
// ============================================================================

/// Move a field by `offset`
pub fn translate(field: Field, offset: Vec3) -> Result<Field> {
    ensure_finite_vec("translation", offset)?;
    Ok(Field::new(Translate {
        inner: field,
        offset,
    }))
}

/// Rotate a field by `angle` radians about `axis` through the origin
pub fn rotate(field: Field, axis: Vec3, angle: f32) -> Result<Field> {
    rotate_about(field, axis, angle, Vec3::ZERO)
}

/// Rotate a field by `angle` radians about `axis` through `pivot`
pub fn rotate_about(field: Field, axis: Vec3, angle: f32, pivot: Vec3) -> Result<Field> {
    ensure_finite_vec("rotation axis", axis)?;
    ensure_finite("rotation angle", angle)?;
    ensure_finite_vec("rotation pivot", pivot)?;
    let axis = axis
        .try_normalize()
        .ok_or_else(|| Error::invalid("rotation axis must be non-zero"))?;
    Ok(Field::new(Rotate::new(
        field,
        Quat::from_axis_angle(axis, angle),
        pivot,
    )))
}

/// Scale a field per axis about `center`
///
/// Distances are multiplied by the smallest factor, which is only exact for
/// uniform scale. Non-uniform factors produce a [`Diagnostic`] and a warning
/// log, and the result should be treated as an approximate field.
pub fn scale(field: Field, factors: Vec3, center: Vec3) -> Result<Diagnosed<Field>> {
    ensure_positive("scale factor x", factors.x)?;
    ensure_positive("scale factor y", factors.y)?;
    ensure_positive("scale factor z", factors.z)?;
    ensure_finite_vec("scale center", center)?;

    let scaled = Field::new(Scale {
        inner: field,
        factors,
        center,
    });

    if factors.min_element() < factors.max_element() {
        let diagnostic = Diagnostic::non_uniform_scale(factors);
        tracing::warn!(?factors, "{diagnostic}");
        Ok(Diagnosed::with(scaled, vec![diagnostic]))
    } else {
        Ok(Diagnosed::clean(scaled))
    }
}

/// Uniform scale about the origin; always an exact distance field
pub fn scale_uniform(field: Field, factor: f32) -> Result<Field> {
    scale(field, Vec3::splat(factor), Vec3::ZERO).map(Diagnosed::into_inner)
}

/// Reflect a field across the plane `dot(p, normal) = offset`
pub fn mirror(field: Field, normal: Vec3, offset: f32) -> Result<Field> {
    ensure_finite_vec("mirror normal", normal)?;
    ensure_finite("mirror offset", offset)?;
    let normal = normal
        .try_normalize()
        .ok_or_else(|| Error::invalid("mirror normal must be non-zero"))?;
    Ok(Field::new(Mirror {
        inner: field,
        normal,
        offset,
    }))
}

/// Twist a field about the Z axis by `rate` radians per unit of height
pub fn twist(field: Field, rate: f32) -> Result<Field> {
    ensure_finite("twist rate", rate)?;
    Ok(Field::new(Twist { inner: field, rate }))
}

// ============================================================================
// Basic Transforms
// ============================================================================

/// Translation transform
#[derive(Debug, Clone)]
pub struct Translate {
    pub inner: Field,
    pub offset: Vec3,
}

impl Sdf for Translate {
    fn distance(&self, p: Vec3) -> f32 {
        self.inner.evaluate(p - self.offset)
    }

    fn bounds(&self) -> Option<Aabb> {
        let b = self.inner.bounds()?;
        Some(Aabb::new(b.min + self.offset, b.max + self.offset))
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Translate, [&self.inner]).param("offset", self.offset)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(p - self.offset)
    }
}

/// Rotation transform about a pivot point
#[derive(Debug, Clone)]
pub struct Rotate {
    pub inner: Field,
    pub rotation: Quat,
    pub inverse: Quat,
    pub pivot: Vec3,
}

impl Rotate {
    pub fn new(inner: Field, rotation: Quat, pivot: Vec3) -> Self {
        Self {
            inner,
            rotation,
            inverse: rotation.inverse(),
            pivot,
        }
    }

    fn to_local(&self, p: Vec3) -> Vec3 {
        self.inverse * (p - self.pivot) + self.pivot
    }
}

impl Sdf for Rotate {
    fn distance(&self, p: Vec3) -> f32 {
        // Rotate point into local space
        self.inner.evaluate(self.to_local(p))
    }

    fn bounds(&self) -> Option<Aabb> {
        // AABB of the rotated corners, not a conservative sphere
        let b = self.inner.bounds()?;
        Some(b.transformed(|c| self.rotation * (c - self.pivot) + self.pivot))
    }

    fn metadata(&self) -> Metadata {
        let (axis, angle) = self.rotation.to_axis_angle();
        Metadata::node(FieldKind::Rotate, [&self.inner])
            .param("axis", axis)
            .param("angle", angle)
            .param("pivot", self.pivot)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(self.to_local(p))
    }
}

/// Per-axis scale about a center point
#[derive(Debug, Clone)]
pub struct Scale {
    pub inner: Field,
    pub factors: Vec3,
    pub center: Vec3,
}

impl Scale {
    fn to_local(&self, p: Vec3) -> Vec3 {
        (p - self.center) / self.factors + self.center
    }
}

impl Sdf for Scale {
    fn distance(&self, p: Vec3) -> f32 {
        self.inner.evaluate(self.to_local(p)) * self.factors.min_element()
    }

    fn bounds(&self) -> Option<Aabb> {
        let b = self.inner.bounds()?;
        Some(b.transformed(|c| (c - self.center) * self.factors + self.center))
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Scale, [&self.inner])
            .param("factors", self.factors)
            .param("center", self.center)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(self.to_local(p))
    }
}

/// Reflection across a plane
#[derive(Debug, Clone)]
pub struct Mirror {
    pub inner: Field,
    pub normal: Vec3,
    pub offset: f32,
}

impl Mirror {
    fn reflect(&self, p: Vec3) -> Vec3 {
        p - self.normal * (2.0 * (p.dot(self.normal) - self.offset))
    }
}

impl Sdf for Mirror {
    fn distance(&self, p: Vec3) -> f32 {
        // A reflection is its own inverse
        self.inner.evaluate(self.reflect(p))
    }

    fn bounds(&self) -> Option<Aabb> {
        let b = self.inner.bounds()?;
        Some(b.transformed(|c| self.reflect(c)))
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Mirror, [&self.inner])
            .param("normal", self.normal)
            .param("offset", self.offset)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(self.reflect(p))
    }
}

// ============================================================================
// Deformations
// ============================================================================

/// Twist around the Z axis
///
/// Not distance preserving: the field is stretched by roughly
/// `sqrt(1 + (rate * r)^2)` at radius `r`.
#[derive(Debug, Clone)]
pub struct Twist {
    pub inner: Field,
    /// Radians of rotation per unit of height
    pub rate: f32,
}

impl Twist {
    fn to_local(&self, p: Vec3) -> Vec3 {
        let angle = -self.rate * p.z;
        let (s, c) = angle.sin_cos();
        Vec3::new(c * p.x - s * p.y, s * p.x + c * p.y, p.z)
    }
}

impl Sdf for Twist {
    fn distance(&self, p: Vec3) -> f32 {
        self.inner.evaluate(self.to_local(p))
    }

    fn bounds(&self) -> Option<Aabb> {
        // Any rotation about Z stays inside the cylinder around the child box
        let b = self.inner.bounds()?;
        let reach_x = b.min.x.abs().max(b.max.x.abs());
        let reach_y = b.min.y.abs().max(b.max.y.abs());
        let r = Vec2::new(reach_x, reach_y).length();
        Some(Aabb::new(
            Vec3::new(-r, -r, b.min.z),
            Vec3::new(r, r, b.max.z),
        ))
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Twist, [&self.inner]).param("rate", self.rate)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(self.to_local(p))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::primitives::{box3, sphere};
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn unit_sphere_at(c: Vec3) -> Field {
        sphere(c, 1.0).unwrap()
    }

    // ------------------------------------------------------------------------
    // Translate and rotate
    // ------------------------------------------------------------------------

    #[test]
    fn translate_shifts_surface_and_bounds() {
        let t = translate(unit_sphere_at(Vec3::ZERO), Vec3::new(5.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(t.evaluate(Vec3::new(5.0, 0.0, 0.0)), -1.0);
        assert_relative_eq!(t.evaluate(Vec3::ZERO), 4.0);
        let b = t.bounds().unwrap();
        assert_relative_eq!(b.min.x, 4.0);
        assert_relative_eq!(b.max.x, 6.0);
    }

    #[test]
    fn rotated_box_bounds_are_tight() {
        let b = box3(Vec3::ZERO, Vec3::splat(10.0)).unwrap();
        let original = b.bounds().unwrap();
        let r = rotate(b, Vec3::Z, FRAC_PI_4).unwrap();
        let bounds = r.bounds().unwrap();

        // Corners at radius 5√2 in XY, Z untouched
        let diag = 5.0 * 2.0f32.sqrt();
        assert_relative_eq!(bounds.max.x, diag, epsilon = 1e-4);
        assert_relative_eq!(bounds.min.y, -diag, epsilon = 1e-4);
        assert_relative_eq!(bounds.max.z, 5.0, epsilon = 1e-4);

        // Well inside a conservative 2x expansion of the original box
        let loose = Aabb::from_center(original.center(), original.size());
        assert!(bounds.size().cmplt(loose.size()).all());
    }

    #[test]
    fn rotate_moves_geometry_with_the_forward_rotation() {
        let s = unit_sphere_at(Vec3::new(3.0, 0.0, 0.0));
        let r = rotate(s, Vec3::Z, FRAC_PI_2).unwrap();
        assert_relative_eq!(r.evaluate(Vec3::new(0.0, 3.0, 0.0)), -1.0, epsilon = 1e-5);
        assert!(r.evaluate(Vec3::new(3.0, 0.0, 0.0)) > 0.0);
    }

    #[test]
    fn rotate_about_pivot() {
        let s = unit_sphere_at(Vec3::new(2.0, 0.0, 0.0));
        let r = rotate_about(s, Vec3::Z, FRAC_PI_2, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        // (2,0,0) swings around (1,0,0) to (1,1,0)
        assert_relative_eq!(r.evaluate(Vec3::new(1.0, 1.0, 0.0)), -1.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_rotation_axis_is_rejected() {
        assert!(rotate(unit_sphere_at(Vec3::ZERO), Vec3::ZERO, 1.0).is_err());
    }

    // ------------------------------------------------------------------------
    // Scale
    // ------------------------------------------------------------------------

    #[test]
    fn uniform_scale_is_exact_and_clean() {
        let scaled = scale(unit_sphere_at(Vec3::ZERO), Vec3::splat(2.0), Vec3::ZERO).unwrap();
        assert!(scaled.is_clean());
        let f = scaled.into_inner();
        assert_relative_eq!(f.evaluate(Vec3::new(3.0, 0.0, 0.0)), 1.0);
        assert_relative_eq!(f.evaluate(Vec3::ZERO), -2.0);
    }

    #[test]
    fn scale_about_center_keeps_center_fixed() {
        let c = Vec3::new(4.0, 0.0, 0.0);
        let f = scale_uniform(unit_sphere_at(Vec3::ZERO), 3.0).unwrap();
        assert_relative_eq!(f.evaluate(Vec3::ZERO), -3.0);
        let about = scale(unit_sphere_at(c), Vec3::splat(3.0), c).unwrap().value;
        assert_relative_eq!(about.evaluate(c), -3.0);
        assert_relative_eq!(about.evaluate(c + Vec3::new(0.0, 3.0, 0.0)), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn non_uniform_scale_reports_diagnostic() {
        let scaled = scale(
            unit_sphere_at(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 1.0),
            Vec3::ZERO,
        )
        .unwrap();
        assert_eq!(scaled.diagnostics.len(), 1);
        assert!(scaled.diagnostics[0].affected.contains(&"shell"));

        let bounds = scaled.value.bounds().unwrap();
        assert_relative_eq!(bounds.max.y, 2.0);
        assert_relative_eq!(bounds.max.x, 1.0);
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let s = unit_sphere_at(Vec3::ZERO);
        assert!(scale(s.clone(), Vec3::new(1.0, 0.0, 1.0), Vec3::ZERO).is_err());
        assert!(scale_uniform(s, -1.0).is_err());
    }

    // ------------------------------------------------------------------------
    // Mirror and twist
    // ------------------------------------------------------------------------

    #[test]
    fn mirror_reflects_across_plane() {
        let m = mirror(unit_sphere_at(Vec3::new(3.0, 0.0, 0.0)), Vec3::X, 1.0).unwrap();
        // Plane x = 1 maps center 3 to -1
        assert_relative_eq!(m.evaluate(Vec3::new(-1.0, 0.0, 0.0)), -1.0, epsilon = 1e-5);
        let b = m.bounds().unwrap();
        assert_relative_eq!(b.min.x, -2.0, epsilon = 1e-5);
        assert_relative_eq!(b.max.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn twist_is_identity_at_zero_height() {
        let bar = box3(Vec3::new(0.0, 0.0, 5.0), Vec3::new(4.0, 1.0, 10.0)).unwrap();
        let t = twist(bar.clone(), 0.3).unwrap();
        let p = Vec3::new(1.5, 0.2, 0.0);
        assert_relative_eq!(t.evaluate(p), bar.evaluate(p), epsilon = 1e-6);
    }

    #[test]
    fn twist_rotates_by_rate_times_height() {
        let bar = box3(Vec3::new(0.0, 0.0, 5.0), Vec3::new(4.0, 1.0, 10.0)).unwrap();
        let t = twist(bar.clone(), FRAC_PI_2 / 5.0).unwrap();
        // At z = 5 the bar has turned a quarter turn, its long side now on Y
        assert!(t.evaluate(Vec3::new(0.0, 1.8, 5.0)) < 0.0);
        assert!(t.evaluate(Vec3::new(1.8, 0.0, 5.0)) > 0.0);

        let b = t.bounds().unwrap();
        let r = Vec2::new(2.0, 0.5).length();
        assert_relative_eq!(b.max.x, r, epsilon = 1e-5);
        assert_relative_eq!(b.min.y, -r, epsilon = 1e-5);
        assert_relative_eq!(b.max.z, 10.0);
    }
}
