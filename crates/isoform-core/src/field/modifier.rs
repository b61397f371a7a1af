//! Distance modifiers
//!
//! Modifiers leave the query point alone and reshape the returned distance.

use super::{Field, FieldKind, MaterialId, Metadata, Sdf};
use crate::error::{Result, ensure_finite, ensure_positive};
use crate::math::Aabb;
use glam::Vec3;

// ============================================================================
// Constructor functions (ergonomic API)
// ============================================================================

/// Grow (positive) or shrink (negative) a field by a constant distance
pub fn offset(field: Field, distance: f32) -> Result<Field> {
    ensure_finite("offset distance", distance)?;
    Ok(Field::new(Offset {
        inner: field,
        distance,
    }))
}

/// Hollow out a field, keeping a wall of `thickness` inside the surface
pub fn shell(field: Field, thickness: f32) -> Result<Field> {
    ensure_positive("shell thickness", thickness)?;
    Ok(Field::new(Shell {
        inner: field,
        thickness,
    }))
}

/// Erode then dilate by `radius`
///
/// This only approximates edge rounding. On fields that are already exact
/// distance functions the two offsets cancel, and sharp interior corners can
/// change out of proportion to the radius.
pub fn fillet(field: Field, radius: f32) -> Result<Field> {
    ensure_positive("fillet radius", radius)?;
    let rounded = offset(offset(field.clone(), -radius)?, radius)?;
    Ok(Field::new(Fillet {
        source: field,
        rounded,
        radius,
    }))
}

/// Inward offset by half of `size`
pub fn chamfer(field: Field, size: f32) -> Result<Field> {
    ensure_positive("chamfer size", size)?;
    Ok(Field::new(Chamfer { inner: field, size }))
}

/// Average the field over a 7-point stencil of spacing `epsilon`
///
/// A cheap smoothing filter, not a geometric fillet.
pub fn blur(field: Field, epsilon: f32) -> Result<Field> {
    ensure_positive("blur epsilon", epsilon)?;
    Ok(Field::new(Blur {
        inner: field,
        epsilon,
    }))
}

/// Tag every point of a field with a material
pub fn with_material(field: Field, material: MaterialId) -> Field {
    Field::new(WithMaterial {
        inner: field,
        material,
    })
}

// ============================================================================
// Modifier Structs
// ============================================================================

/// Constant distance offset
#[derive(Debug, Clone)]
pub struct Offset {
    pub inner: Field,
    pub distance: f32,
}

impl Sdf for Offset {
    fn distance(&self, p: Vec3) -> f32 {
        self.inner.evaluate(p) - self.distance
    }

    fn bounds(&self) -> Option<Aabb> {
        self.inner.bounds().map(|b| b.expand(self.distance.abs()))
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Offset, [&self.inner]).param("distance", self.distance)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(p)
    }
}

/// Hollow wall: the field minus its own inward offset
#[derive(Debug, Clone)]
pub struct Shell {
    pub inner: Field,
    pub thickness: f32,
}

impl Sdf for Shell {
    fn distance(&self, p: Vec3) -> f32 {
        let d = self.inner.evaluate(p);
        d.max(-(d + self.thickness))
    }

    fn bounds(&self) -> Option<Aabb> {
        self.inner.bounds()
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Shell, [&self.inner]).param("thickness", self.thickness)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(p)
    }
}

/// Erosion/dilation pair
#[derive(Debug, Clone)]
pub struct Fillet {
    source: Field,
    rounded: Field,
    pub radius: f32,
}

impl Sdf for Fillet {
    fn distance(&self, p: Vec3) -> f32 {
        self.rounded.evaluate(p)
    }

    fn bounds(&self) -> Option<Aabb> {
        self.rounded.bounds()
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Fillet, [&self.rounded]).param("radius", self.radius)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.source.material(p)
    }
}

/// Half-size inward offset
#[derive(Debug, Clone)]
pub struct Chamfer {
    pub inner: Field,
    pub size: f32,
}

impl Sdf for Chamfer {
    fn distance(&self, p: Vec3) -> f32 {
        self.inner.evaluate(p) + self.size * 0.5
    }

    fn bounds(&self) -> Option<Aabb> {
        self.inner.bounds()
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Chamfer, [&self.inner]).param("size", self.size)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(p)
    }
}

/// 7-point stencil average
#[derive(Debug, Clone)]
pub struct Blur {
    pub inner: Field,
    pub epsilon: f32,
}

impl Sdf for Blur {
    fn distance(&self, p: Vec3) -> f32 {
        let e = self.epsilon;
        let sum = self.inner.evaluate(p)
            + self.inner.evaluate(p + Vec3::X * e)
            + self.inner.evaluate(p - Vec3::X * e)
            + self.inner.evaluate(p + Vec3::Y * e)
            + self.inner.evaluate(p - Vec3::Y * e)
            + self.inner.evaluate(p + Vec3::Z * e)
            + self.inner.evaluate(p - Vec3::Z * e);
        sum / 7.0
    }

    fn bounds(&self) -> Option<Aabb> {
        self.inner.bounds().map(|b| b.expand(self.epsilon))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Blur)
            .with_complexity(self.inner.complexity().saturating_mul(7).saturating_add(1))
            .param("epsilon", self.epsilon)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(p)
    }
}

/// Material tag
#[derive(Debug, Clone)]
pub struct WithMaterial {
    pub inner: Field,
    pub material: MaterialId,
}

impl Sdf for WithMaterial {
    fn distance(&self, p: Vec3) -> f32 {
        self.inner.evaluate(p)
    }

    fn bounds(&self) -> Option<Aabb> {
        self.inner.bounds()
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Material, [&self.inner]).param("material", self.material)
    }

    fn material(&self, _p: Vec3) -> Option<MaterialId> {
        Some(self.material)
    }
}
