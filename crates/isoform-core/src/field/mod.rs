//! Signed distance fields for 3D shape definition
//!
//! A field maps every point in space to the signed distance to the nearest
//! surface. Negative values are inside, positive values are outside, and
//! zero is exactly on the surface.
//!
//! Fields are immutable. Every combinator, transform and modifier returns a
//! new [`Field`] holding shared handles to its children, so a tree is built
//! bottom-up and can never contain a cycle.
//!
//! ## Example
//!
//! ```rust
//! use isoform_core::prelude::*;
//!
//! # fn main() -> isoform_core::Result<()> {
//! let body = box3(Vec3::ZERO, Vec3::splat(10.0))?;
//! let hole = sphere(Vec3::ZERO, 6.0)?;
//! let part = body.subtract(hole);
//!
//! assert!(part.evaluate(Vec3::ZERO) > 0.0);
//! # Ok(())
//! # }
//! ```

pub mod boolean;
pub mod lattice;
pub mod modifier;
pub mod primitives;
pub mod sketch;
pub mod transform;

use crate::math::Aabb;
use glam::Vec3;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub use lattice::LatticePattern;

/// Identifier of a material region, carried through the tree for sampling
pub type MaterialId = u32;

/// Raw distances below this magnitude get a normal when one is requested
pub const NORMAL_BAND: f32 = 0.1;

/// Default finite-difference step for gradients
pub const DEFAULT_NORMAL_EPSILON: f32 = 0.001;

/// The core SDF trait - any type that can compute distance from a point
pub trait Sdf: Send + Sync {
    /// Calculate the signed distance from point `p` to the surface.
    ///
    /// Must be a pure function of `p`.
    fn distance(&self, p: Vec3) -> f32;

    /// A box containing the whole zero level set, or `None` when unbounded
    fn bounds(&self) -> Option<Aabb> {
        None
    }

    /// Kind tag, cost estimate and construction parameters
    fn metadata(&self) -> Metadata;

    /// Material of the region nearest to `p`, if the tree carries one
    fn material(&self, _p: Vec3) -> Option<MaterialId> {
        None
    }
}

/// Kind tag for introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    // Primitives
    Sphere,
    Box,
    Cylinder,
    Cone,
    Capsule,
    Torus,
    Plane,
    Implicit,
    // Booleans
    Union,
    Intersection,
    Difference,
    Xor,
    SmoothUnion,
    SmoothIntersection,
    SmoothDifference,
    // Transforms
    Translate,
    Rotate,
    Scale,
    Mirror,
    Twist,
    // Modifiers
    Offset,
    Shell,
    Fillet,
    Chamfer,
    Blur,
    Material,
    // Volumes
    Lattice(LatticePattern),
    Extrude,
    Revolve,
}

/// A construction parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f32),
    Vector(Vec3),
    Count(u32),
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec3> for ParamValue {
    fn from(v: Vec3) -> Self {
        Self::Vector(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Count(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: &'static str,
    pub value: ParamValue,
}

/// Lightweight description of a field, for debugging only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub kind: FieldKind,
    /// Rough number of primitive evaluations per query
    pub complexity: u32,
    pub params: Vec<Param>,
}

impl Metadata {
    /// Metadata for a leaf with unit cost
    pub fn leaf(kind: FieldKind) -> Self {
        Self {
            kind,
            complexity: 1,
            params: Vec::new(),
        }
    }

    /// Metadata for a node over `children`, costing one more than their sum
    pub fn node<'a>(kind: FieldKind, children: impl IntoIterator<Item = &'a Field>) -> Self {
        let complexity = children
            .into_iter()
            .map(Field::complexity)
            .fold(1u32, u32::saturating_add);
        Self {
            kind,
            complexity,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: &'static str, value: impl Into<ParamValue>) -> Self {
        self.params.push(Param {
            name,
            value: value.into(),
        });
        self
    }

    pub fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = complexity;
        self
    }
}

/// Options for [`Field::sample`]
#[derive(Debug, Clone, Copy)]
pub struct SampleOptions {
    /// Compute a unit normal when the point is close to the surface
    pub compute_normal: bool,
    /// Central-difference step for the normal
    pub normal_epsilon: f32,
    /// Report the material of the nearest region
    pub include_material: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            compute_normal: false,
            normal_epsilon: DEFAULT_NORMAL_EPSILON,
            include_material: false,
        }
    }
}

impl SampleOptions {
    pub fn with_normal(mut self, epsilon: f32) -> Self {
        self.compute_normal = true;
        self.normal_epsilon = epsilon;
        self
    }

    pub fn with_material(mut self) -> Self {
        self.include_material = true;
        self
    }
}

/// Result of sampling a field at one point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub distance: f32,
    pub normal: Option<Vec3>,
    pub material: Option<MaterialId>,
}

/// A shared, immutable handle to any SDF
#[derive(Clone)]
pub struct Field {
    inner: Arc<dyn Sdf>,
}

impl Field {
    /// Create a new field from any type implementing Sdf
    pub fn new<S: Sdf + 'static>(sdf: S) -> Self {
        Self {
            inner: Arc::new(sdf),
        }
    }

    /// Raw signed distance at `p`
    #[inline]
    pub fn evaluate(&self, p: Vec3) -> f32 {
        self.inner.distance(p)
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.inner.bounds()
    }

    pub fn metadata(&self) -> Metadata {
        self.inner.metadata()
    }

    pub fn kind(&self) -> FieldKind {
        self.inner.metadata().kind
    }

    pub fn complexity(&self) -> u32 {
        self.inner.metadata().complexity
    }

    pub fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(p)
    }

    /// Unit gradient by central differences, zero where the field is flat
    pub fn gradient(&self, p: Vec3, eps: f32) -> Vec3 {
        let dx = self.evaluate(p + Vec3::X * eps) - self.evaluate(p - Vec3::X * eps);
        let dy = self.evaluate(p + Vec3::Y * eps) - self.evaluate(p - Vec3::Y * eps);
        let dz = self.evaluate(p + Vec3::Z * eps) - self.evaluate(p - Vec3::Z * eps);
        Vec3::new(dx, dy, dz).normalize_or_zero()
    }

    /// Evaluate with bounds culling and optional normal/material.
    ///
    /// Outside the stored bounds the distance to the bounds box is returned
    /// without walking the tree. The box contains the whole surface, so that
    /// value is positive and never overshoots the true distance.
    pub fn sample(&self, p: Vec3, options: &SampleOptions) -> Sample {
        let distance = match self.bounds() {
            Some(b) if !b.contains(p) => b.distance_to(p),
            _ => self.evaluate(p),
        };

        let normal = (options.compute_normal && distance.abs() < NORMAL_BAND)
            .then(|| self.gradient(p, options.normal_epsilon));
        let material = if options.include_material {
            self.material(p)
        } else {
            None
        };

        Sample {
            distance,
            normal,
            material,
        }
    }

    /// Sample many points; order of results matches `points`
    pub fn sample_batch(&self, points: &[Vec3], options: &SampleOptions) -> Vec<Sample> {
        points.par_iter().map(|&p| self.sample(p, options)).collect()
    }
}

impl Sdf for Field {
    fn distance(&self, p: Vec3) -> f32 {
        self.inner.distance(p)
    }

    fn bounds(&self) -> Option<Aabb> {
        self.inner.bounds()
    }

    fn metadata(&self) -> Metadata {
        self.inner.metadata()
    }

    fn material(&self, p: Vec3) -> Option<MaterialId> {
        self.inner.material(p)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.metadata();
        f.debug_struct("Field")
            .field("kind", &meta.kind)
            .field("complexity", &meta.complexity)
            .field("bounds", &self.bounds())
            .finish()
    }
}

/// Union of optional boxes; unbounded if any input is unbounded
pub(crate) fn union_bounds<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Option<Aabb> {
    let mut acc: Option<Aabb> = None;
    for f in fields {
        let b = f.bounds()?;
        acc = Some(acc.map_or(b, |a| a.union(&b)));
    }
    acc
}

/// Intersection of the bounded inputs; unbounded only if all are
pub(crate) fn intersect_bounds<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Option<Aabb> {
    fields
        .into_iter()
        .filter_map(Field::bounds)
        .reduce(|a, b| a.intersection(&b))
}
