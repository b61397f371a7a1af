//! Boolean and smooth-blend combinators
//!
//! Hard booleans are `min`/`max` over the children. Smooth variants use the
//! polynomial smooth-min, which adds at most `k/4` of material per blended
//! pair and collapses to the plain operation when `k` is zero. With three or
//! more children the blend is reduced pairwise from left to right, so the
//! result depends on child order and `n` children can add up to `(n-1)k/4`.

use super::{Field, FieldKind, MaterialId, Metadata, Sdf, intersect_bounds, union_bounds};
use crate::error::{Error, Result, ensure_finite};
use crate::math::Aabb;
use glam::Vec3;

// ============================================================================
// Constructor functions (ergonomic API)
// ============================================================================

/// Union of all children (`min`)
pub fn union(children: Vec<Field>) -> Result<Field> {
    Ok(Field::new(Union {
        children: non_empty("union", children)?,
    }))
}

/// Intersection of all children (`max`)
pub fn intersection(children: Vec<Field>) -> Result<Field> {
    Ok(Field::new(Intersection {
        children: non_empty("intersection", children)?,
    }))
}

/// `a` with `b` removed: `max(a, -b)`
pub fn difference(a: Field, b: Field) -> Field {
    Field::new(Difference { a, b })
}

/// Regions inside exactly one of `a` and `b`
pub fn xor(a: Field, b: Field) -> Field {
    Field::new(Xor { a, b })
}

/// Union with rounded seams of blend radius `k`
pub fn smooth_union(children: Vec<Field>, k: f32) -> Result<Field> {
    Ok(Field::new(SmoothUnion {
        children: non_empty("smooth union", children)?,
        k: blend_radius(k)?,
    }))
}

/// Intersection with rounded creases of blend radius `k`
pub fn smooth_intersection(children: Vec<Field>, k: f32) -> Result<Field> {
    Ok(Field::new(SmoothIntersection {
        children: non_empty("smooth intersection", children)?,
        k: blend_radius(k)?,
    }))
}

/// Difference with a rounded cut edge of blend radius `k`
pub fn smooth_difference(a: Field, b: Field, k: f32) -> Result<Field> {
    Ok(Field::new(SmoothDifference {
        a,
        b,
        k: blend_radius(k)?,
    }))
}

// ============================================================================
// Chainable helpers
// ============================================================================

impl Field {
    /// Union with another field
    pub fn union(self, other: Field) -> Field {
        Field::new(Union {
            children: vec![self, other],
        })
    }

    /// Intersection with another field
    pub fn intersect(self, other: Field) -> Field {
        Field::new(Intersection {
            children: vec![self, other],
        })
    }

    /// Cut another field out of this one
    pub fn subtract(self, other: Field) -> Field {
        difference(self, other)
    }

    /// Symmetric difference with another field
    pub fn xor(self, other: Field) -> Field {
        xor(self, other)
    }
}

// ============================================================================
// Blend math
// ============================================================================

/// Polynomial smooth minimum
///
/// `h = clamp(k - |a - b|, 0, k) / k`, result `min(a, b) - h²k/4`.
#[inline]
pub fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = (k - (a - b).abs()).clamp(0.0, k) / k;
    a.min(b) - h * h * k * 0.25
}

/// Polynomial smooth maximum, the mirror of [`smooth_min`]
#[inline]
pub fn smooth_max(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.max(b);
    }
    let h = (k - (a - b).abs()).clamp(0.0, k) / k;
    a.max(b) + h * h * k * 0.25
}

fn non_empty(op: &str, children: Vec<Field>) -> Result<Vec<Field>> {
    if children.is_empty() {
        return Err(Error::invalid(format!("{op} needs at least one child")));
    }
    Ok(children)
}

fn blend_radius(k: f32) -> Result<f32> {
    ensure_finite("blend radius", k)?;
    if k < 0.0 {
        return Err(Error::invalid(format!(
            "blend radius must not be negative, got {k}"
        )));
    }
    Ok(k)
}

/// Material of the child whose distance wins under `prefer`
fn material_by<'a>(
    children: impl IntoIterator<Item = &'a Field>,
    p: Vec3,
    prefer: impl Fn(f32, f32) -> bool,
) -> Option<MaterialId> {
    let mut best: Option<(f32, &Field)> = None;
    for child in children {
        let d = child.evaluate(p);
        if best.is_none_or(|(bd, _)| prefer(d, bd)) {
            best = Some((d, child));
        }
    }
    best.and_then(|(_, child)| child.material(p))
}

// ============================================================================
// Hard booleans
// ============================================================================

/// Union of any number of fields
#[derive(Debug, Clone)]
pub struct Union {
    children: Vec<Field>,
}

impl Sdf for Union {
    fn distance(&self, p: Vec3) -> f32 {
        self.children
            .iter()
            .map(|c| c.evaluate(p))
            .fold(f32::INFINITY, f32::min)
    }

    fn bounds(&self) -> Option<Aabb> {
        union_bounds(&self.children)
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Union, &self.children)
            .param("children", self.children.len() as u32)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        material_by(&self.children, p, |d, best| d < best)
    }
}

/// Intersection of any number of fields
#[derive(Debug, Clone)]
pub struct Intersection {
    children: Vec<Field>,
}

impl Sdf for Intersection {
    fn distance(&self, p: Vec3) -> f32 {
        self.children
            .iter()
            .map(|c| c.evaluate(p))
            .fold(f32::NEG_INFINITY, f32::max)
    }

    fn bounds(&self) -> Option<Aabb> {
        intersect_bounds(&self.children)
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Intersection, &self.children)
            .param("children", self.children.len() as u32)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        material_by(&self.children, p, |d, best| d > best)
    }
}

/// Subtraction of `b` from `a`
#[derive(Debug, Clone)]
pub struct Difference {
    a: Field,
    b: Field,
}

impl Sdf for Difference {
    fn distance(&self, p: Vec3) -> f32 {
        self.a.evaluate(p).max(-self.b.evaluate(p))
    }

    fn bounds(&self) -> Option<Aabb> {
        // Subtraction can only reduce, not expand
        self.a.bounds()
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Difference, [&self.a, &self.b])
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.a.material(p)
    }
}

/// Symmetric difference
#[derive(Debug, Clone)]
pub struct Xor {
    a: Field,
    b: Field,
}

impl Sdf for Xor {
    fn distance(&self, p: Vec3) -> f32 {
        let a = self.a.evaluate(p);
        let b = self.b.evaluate(p);
        a.min(-b).max((-a).min(b))
    }

    fn bounds(&self) -> Option<Aabb> {
        union_bounds([&self.a, &self.b])
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::Xor, [&self.a, &self.b])
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        material_by([&self.a, &self.b], p, |d, best| d < best)
    }
}

// ============================================================================
// Smooth blends
// ============================================================================

/// Smooth union with polynomial blending
#[derive(Debug, Clone)]
pub struct SmoothUnion {
    children: Vec<Field>,
    pub k: f32,
}

impl Sdf for SmoothUnion {
    fn distance(&self, p: Vec3) -> f32 {
        let mut values = self.children.iter().map(|c| c.evaluate(p));
        let first = values.next().unwrap_or(f32::INFINITY);
        values.fold(first, |acc, d| smooth_min(acc, d, self.k))
    }

    fn bounds(&self) -> Option<Aabb> {
        // Each pairwise blend can undershoot by k/4
        let blends = self.children.len().saturating_sub(1) as f32;
        union_bounds(&self.children).map(|b| b.expand(blends * self.k * 0.25))
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::SmoothUnion, &self.children)
            .param("children", self.children.len() as u32)
            .param("k", self.k)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        material_by(&self.children, p, |d, best| d < best)
    }
}

/// Smooth intersection
#[derive(Debug, Clone)]
pub struct SmoothIntersection {
    children: Vec<Field>,
    pub k: f32,
}

impl Sdf for SmoothIntersection {
    fn distance(&self, p: Vec3) -> f32 {
        let mut values = self.children.iter().map(|c| c.evaluate(p));
        let first = values.next().unwrap_or(f32::NEG_INFINITY);
        values.fold(first, |acc, d| smooth_max(acc, d, self.k))
    }

    fn bounds(&self) -> Option<Aabb> {
        intersect_bounds(&self.children)
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::SmoothIntersection, &self.children)
            .param("children", self.children.len() as u32)
            .param("k", self.k)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        material_by(&self.children, p, |d, best| d > best)
    }
}

/// Smooth subtraction: `smooth_max(a, -b)`
#[derive(Debug, Clone)]
pub struct SmoothDifference {
    a: Field,
    b: Field,
    pub k: f32,
}

impl Sdf for SmoothDifference {
    fn distance(&self, p: Vec3) -> f32 {
        smooth_max(self.a.evaluate(p), -self.b.evaluate(p), self.k)
    }

    fn bounds(&self) -> Option<Aabb> {
        self.a.bounds()
    }

    fn metadata(&self) -> Metadata {
        Metadata::node(FieldKind::SmoothDifference, [&self.a, &self.b]).param("k", self.k)
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.a.material(p)
    }
}

// ============================================================================
// Tests
// ============================================================================
