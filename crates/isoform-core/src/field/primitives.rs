//! SDF primitive shapes
//!
//! Every primitive is positioned by its constructor arguments (centers and
//! endpoints), validated up front, and returns a [`Field`].

use super::{Field, FieldKind, Metadata, Sdf};
use crate::error::{Error, Result, ensure_finite, ensure_finite_vec, ensure_positive};
use crate::math::Aabb;
use glam::{Vec2, Vec3};
use std::sync::Arc;

/// Half-size of the stand-in box used for infinite planes
pub const PLANE_EXTENT: f32 = 1000.0;

// ============================================================================
// Constructor functions (ergonomic API)
// ============================================================================

/// Create a sphere with given center and radius
pub fn sphere(center: Vec3, radius: f32) -> Result<Field> {
    Sphere::new(center, radius).map(Field::new)
}

/// Create an axis-aligned box from its center and full edge lengths
pub fn box3(center: Vec3, size: Vec3) -> Result<Field> {
    Box3::new(center, size).map(Field::new)
}

/// Create a capped cylinder between two points
pub fn cylinder(start: Vec3, end: Vec3, radius: f32) -> Result<Field> {
    Cylinder::new(start, end, radius).map(Field::new)
}

/// Create a cone with a disc of `radius` at `base` narrowing to a point at `apex`
pub fn cone(base: Vec3, apex: Vec3, radius: f32) -> Result<Field> {
    Cone::new(base, apex, radius).map(Field::new)
}

/// Create a capsule (segment swept by a sphere)
pub fn capsule(start: Vec3, end: Vec3, radius: f32) -> Result<Field> {
    Capsule::new(start, end, radius).map(Field::new)
}

/// Create a torus lying in the XY plane, around the Z axis through `center`
pub fn torus(center: Vec3, major_radius: f32, minor_radius: f32) -> Result<Field> {
    Torus::new(center, major_radius, minor_radius).map(Field::new)
}

/// Create an infinite plane `dot(p, normal) = offset`; the normal side is outside
pub fn plane(normal: Vec3, offset: f32) -> Result<Field> {
    Plane::new(normal, offset).map(Field::new)
}

/// Wrap an arbitrary scalar function. Bounds cannot be inferred and are required.
pub fn implicit<F>(f: F, bounds: Option<Aabb>) -> Result<Field>
where
    F: Fn(Vec3) -> f32 + Send + Sync + 'static,
{
    Implicit::new(f, bounds).map(Field::new)
}

// ============================================================================
// Helpers
// ============================================================================

/// Exact combination of two signed slab distances whose intersection is the
/// solid: Euclidean outside the corner region, the larger one inside.
#[inline]
pub(crate) fn intersect_exact(a: f32, b: f32) -> f32 {
    a.max(b).min(0.0) + Vec2::new(a.max(0.0), b.max(0.0)).length()
}

/// A validated line segment
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: Vec3,
    end: Vec3,
    axis: Vec3,
    length: f32,
}

impl Segment {
    fn new(start: Vec3, end: Vec3) -> Result<Self> {
        ensure_finite_vec("start", start)?;
        ensure_finite_vec("end", end)?;
        let length = start.distance(end);
        if length <= f32::EPSILON {
            return Err(Error::invalid(format!(
                "start and end points coincide at {start}"
            )));
        }
        Ok(Self {
            start,
            end,
            axis: (end - start) / length,
            length,
        })
    }

    /// Per-axis half extent of a disc of `radius` perpendicular to the segment
    fn disc_extent(&self, radius: f32) -> Vec3 {
        let v = (Vec3::ONE - self.axis * self.axis).max(Vec3::ZERO);
        Vec3::new(v.x.sqrt(), v.y.sqrt(), v.z.sqrt()) * radius
    }

    /// Axial coordinate and radial distance of `p`
    fn project(&self, p: Vec3) -> (f32, f32) {
        let v = p - self.start;
        let y = v.dot(self.axis);
        (y, (v - self.axis * y).length())
    }
}

// ============================================================================
// Primitive Structs
// ============================================================================

/// Sphere
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Result<Self> {
        ensure_finite_vec("sphere center", center)?;
        ensure_positive("sphere radius", radius)?;
        Ok(Self { center, radius })
    }
}

impl Sdf for Sphere {
    fn distance(&self, p: Vec3) -> f32 {
        (p - self.center).length() - self.radius
    }

    fn bounds(&self) -> Option<Aabb> {
        Some(Aabb::from_center(self.center, Vec3::splat(self.radius)))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Sphere)
            .param("center", self.center)
            .param("radius", self.radius)
    }
}

/// Axis-aligned box (rectangular prism)
#[derive(Debug, Clone, Copy)]
pub struct Box3 {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Box3 {
    pub fn new(center: Vec3, size: Vec3) -> Result<Self> {
        ensure_finite_vec("box center", center)?;
        ensure_positive("box size x", size.x)?;
        ensure_positive("box size y", size.y)?;
        ensure_positive("box size z", size.z)?;
        Ok(Self {
            center,
            half_extents: size * 0.5,
        })
    }
}

impl Sdf for Box3 {
    fn distance(&self, p: Vec3) -> f32 {
        let q = (p - self.center).abs() - self.half_extents;
        q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
    }

    fn bounds(&self) -> Option<Aabb> {
        Some(Aabb::from_center(self.center, self.half_extents))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Box)
            .param("center", self.center)
            .param("size", self.half_extents * 2.0)
    }
}

/// Capped cylinder between two points
#[derive(Debug, Clone, Copy)]
pub struct Cylinder {
    segment: Segment,
    pub radius: f32,
}

impl Cylinder {
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Result<Self> {
        let segment = Segment::new(start, end)?;
        ensure_positive("cylinder radius", radius)?;
        Ok(Self { segment, radius })
    }
}

impl Sdf for Cylinder {
    fn distance(&self, p: Vec3) -> f32 {
        let half = self.segment.length * 0.5;
        let (y, radial) = self.segment.project(p);
        let side = radial - self.radius;
        let cap = (y - half).abs() - half;
        intersect_exact(side, cap)
    }

    fn bounds(&self) -> Option<Aabb> {
        let e = self.segment.disc_extent(self.radius);
        let (a, b) = (self.segment.start, self.segment.end);
        Some(Aabb::new(a.min(b) - e, a.max(b) + e))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Cylinder)
            .param("start", self.segment.start)
            .param("end", self.segment.end)
            .param("radius", self.radius)
    }
}

/// Cone from a base disc to a point
///
/// Distances to the base cap and to the slanted side are both measured in
/// the (radial, axial) half-plane, so the value stays exact past the rim and
/// above the apex.
#[derive(Debug, Clone, Copy)]
pub struct Cone {
    segment: Segment,
    pub radius: f32,
}

impl Cone {
    pub fn new(base: Vec3, apex: Vec3, radius: f32) -> Result<Self> {
        let segment = Segment::new(base, apex)?;
        ensure_positive("cone radius", radius)?;
        Ok(Self { segment, radius })
    }
}

impl Sdf for Cone {
    fn distance(&self, p: Vec3) -> f32 {
        let h = self.segment.length;
        let ra = self.radius;
        let (y, x) = self.segment.project(p);
        // Axial coordinate normalized so the base is 0 and the apex is 1
        let t = y / h;
        let hh = h * h;

        // Base cap: nearest point on the disc (the apex end has zero radius)
        let cap_x = (x - if t < 0.5 { ra } else { 0.0 }).max(0.0);
        let cap_y = (t - 0.5).abs() - 0.5;

        // Side: nearest point on the slanted generator from (ra, 0) to (0, 1)
        let k = ra * ra + hh;
        let f = ((-ra * (x - ra) + t * hh) / k).clamp(0.0, 1.0);
        let side_x = x - ra + f * ra;
        let side_y = t - f;

        let inside = side_x < 0.0 && cap_y < 0.0;
        let d2 = (cap_x * cap_x + cap_y * cap_y * hh).min(side_x * side_x + side_y * side_y * hh);
        if inside { -d2.sqrt() } else { d2.sqrt() }
    }

    fn bounds(&self) -> Option<Aabb> {
        let e = self.segment.disc_extent(self.radius);
        let base = Aabb::new(self.segment.start - e, self.segment.start + e);
        Some(base.union(&Aabb::new(self.segment.end, self.segment.end)))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Cone)
            .param("base", self.segment.start)
            .param("apex", self.segment.end)
            .param("radius", self.radius)
    }
}

/// Capsule (cylinder with hemispherical caps) between two points
#[derive(Debug, Clone, Copy)]
pub struct Capsule {
    segment: Segment,
    pub radius: f32,
}

impl Capsule {
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Result<Self> {
        let segment = Segment::new(start, end)?;
        ensure_positive("capsule radius", radius)?;
        Ok(Self { segment, radius })
    }
}

impl Sdf for Capsule {
    fn distance(&self, p: Vec3) -> f32 {
        let v = p - self.segment.start;
        let y = v.dot(self.segment.axis).clamp(0.0, self.segment.length);
        (v - self.segment.axis * y).length() - self.radius
    }

    fn bounds(&self) -> Option<Aabb> {
        let (a, b) = (self.segment.start, self.segment.end);
        Some(Aabb::new(a.min(b), a.max(b)).expand(self.radius))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Capsule)
            .param("start", self.segment.start)
            .param("end", self.segment.end)
            .param("radius", self.radius)
    }
}

/// Torus lying in the XY plane
#[derive(Debug, Clone, Copy)]
pub struct Torus {
    pub center: Vec3,
    pub major_radius: f32,
    pub minor_radius: f32,
}

impl Torus {
    pub fn new(center: Vec3, major_radius: f32, minor_radius: f32) -> Result<Self> {
        ensure_finite_vec("torus center", center)?;
        ensure_positive("torus major radius", major_radius)?;
        ensure_positive("torus minor radius", minor_radius)?;
        Ok(Self {
            center,
            major_radius,
            minor_radius,
        })
    }
}

impl Sdf for Torus {
    fn distance(&self, p: Vec3) -> f32 {
        let p = p - self.center;
        let q = Vec2::new(Vec2::new(p.x, p.y).length() - self.major_radius, p.z);
        q.length() - self.minor_radius
    }

    fn bounds(&self) -> Option<Aabb> {
        let r = self.major_radius + self.minor_radius;
        Some(Aabb::from_center(
            self.center,
            Vec3::new(r, r, self.minor_radius),
        ))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Torus)
            .param("center", self.center)
            .param("major_radius", self.major_radius)
            .param("minor_radius", self.minor_radius)
    }
}

/// Infinite plane
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Result<Self> {
        ensure_finite_vec("plane normal", normal)?;
        ensure_finite("plane offset", offset)?;
        let normal = normal
            .try_normalize()
            .ok_or_else(|| Error::invalid("plane normal must be non-zero"))?;
        Ok(Self { normal, offset })
    }
}

impl Sdf for Plane {
    fn distance(&self, p: Vec3) -> f32 {
        p.dot(self.normal) - self.offset
    }

    fn bounds(&self) -> Option<Aabb> {
        // Infinite plane - return large bounds
        Some(Aabb::cube(PLANE_EXTENT))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Plane)
            .param("normal", self.normal)
            .param("offset", self.offset)
    }
}

/// User-supplied scalar function with explicit bounds
#[derive(Clone)]
pub struct Implicit {
    f: Arc<dyn Fn(Vec3) -> f32 + Send + Sync>,
    bounds: Aabb,
}

impl Implicit {
    pub fn new<F>(f: F, bounds: Option<Aabb>) -> Result<Self>
    where
        F: Fn(Vec3) -> f32 + Send + Sync + 'static,
    {
        let bounds = bounds.ok_or_else(|| {
            Error::MissingBounds("implicit fields need explicit bounds".to_string())
        })?;
        if !bounds.is_valid() {
            return Err(Error::invalid(format!(
                "implicit bounds must have positive extent, got {bounds:?}"
            )));
        }
        Ok(Self {
            f: Arc::new(f),
            bounds,
        })
    }
}

impl Sdf for Implicit {
    fn distance(&self, p: Vec3) -> f32 {
        (self.f)(p)
    }

    fn bounds(&self) -> Option<Aabb> {
        Some(self.bounds)
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Implicit)
            .param("bounds_min", self.bounds.min)
            .param("bounds_max", self.bounds.max)
    }
}

impl std::fmt::Debug for Implicit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Implicit")
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use approx::assert_relative_eq;

    // ------------------------------------------------------------------------
    // Sphere and box
    // ------------------------------------------------------------------------

    #[test]
    fn sphere_matches_euclidean_distance() {
        let c = Vec3::new(1.0, -2.0, 0.5);
        let s = sphere(c, 3.0).unwrap();
        for p in [
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(-4.0, 7.0, 2.0),
            Vec3::new(1.0, -2.0, 4.0),
        ] {
            assert_relative_eq!(s.evaluate(p), (p - c).length() - 3.0, epsilon = 1e-5);
        }
        assert_relative_eq!(s.evaluate(c), -3.0);
    }

    #[test]
    fn box_face_and_center() {
        let b = box3(Vec3::ZERO, Vec3::splat(10.0)).unwrap();
        assert_relative_eq!(b.evaluate(Vec3::new(10.0, 0.0, 0.0)), 5.0);
        assert_relative_eq!(b.evaluate(Vec3::new(5.0, 0.0, 0.0)), 0.0);
        assert_relative_eq!(b.evaluate(Vec3::ZERO), -5.0);
        // Past an edge the distance is to the edge line
        assert_relative_eq!(
            b.evaluate(Vec3::new(8.0, 9.0, 0.0)),
            (9.0f32 + 16.0).sqrt(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn degenerate_parameters_fail_at_construction() {
        assert!(matches!(
            sphere(Vec3::ZERO, 0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(box3(Vec3::ZERO, Vec3::new(1.0, -1.0, 1.0)).is_err());
        assert!(cylinder(Vec3::ONE, Vec3::ONE, 1.0).is_err());
        assert!(cone(Vec3::ZERO, Vec3::Z, -1.0).is_err());
        assert!(capsule(Vec3::ZERO, Vec3::ZERO, 1.0).is_err());
        assert!(torus(Vec3::ZERO, 0.0, 1.0).is_err());
        assert!(plane(Vec3::ZERO, 0.0).is_err());
        assert!(sphere(Vec3::new(f32::NAN, 0.0, 0.0), 1.0).is_err());
    }

    // ------------------------------------------------------------------------
    // Cylinder: side, caps and the rim region beyond both
    // ------------------------------------------------------------------------

    fn z_cylinder() -> Field {
        // Radius 2, from z = 0 to z = 4
        cylinder(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0), 2.0).unwrap()
    }

    #[test]
    fn cylinder_side_distance() {
        let c = z_cylinder();
        assert_relative_eq!(c.evaluate(Vec3::new(5.0, 0.0, 2.0)), 3.0, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(Vec3::new(2.0, 0.0, 2.0)), 0.0, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(Vec3::new(1.5, 0.0, 2.0)), -0.5, epsilon = 1e-5);
    }

    #[test]
    fn cylinder_caps_are_solid() {
        let c = z_cylinder();
        // On-axis above and below the caps
        assert_relative_eq!(c.evaluate(Vec3::new(0.0, 0.0, 7.0)), 3.0, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(Vec3::new(0.0, 0.0, -1.0)), 1.0, epsilon = 1e-5);
        // Just under the cap, near the axis: nearest surface is the cap
        assert_relative_eq!(c.evaluate(Vec3::new(0.5, 0.0, 3.75)), -0.25, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(Vec3::new(1.0, 0.0, 4.0)), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn cylinder_rim_region_is_euclidean() {
        let c = z_cylinder();
        // 3 out radially, 4 above the top rim
        assert_relative_eq!(c.evaluate(Vec3::new(5.0, 0.0, 8.0)), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn cylinder_on_tilted_axis() {
        let c = cylinder(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0), 1.0).unwrap();
        // Midpoint offset along +Z is purely radial
        assert_relative_eq!(c.evaluate(Vec3::new(1.5, 2.0, 3.0)), 2.0, epsilon = 1e-5);
        // Beyond the end cap along the axis
        assert_relative_eq!(c.evaluate(Vec3::new(6.0, 8.0, 0.0)), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn cylinder_bounds_are_tight() {
        let b = z_cylinder().bounds().unwrap();
        assert_relative_eq!(b.min.x, -2.0, epsilon = 1e-6);
        assert_relative_eq!(b.max.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(b.min.z, 0.0, epsilon = 1e-6);
        assert_relative_eq!(b.max.z, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn diagonal_cylinder_bounds_use_disc_extent() {
        let c = cylinder(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), 1.0).unwrap();
        let b = c.bounds().unwrap();
        let half = 0.5f32.sqrt();
        assert_relative_eq!(b.min.x, -half, epsilon = 1e-5);
        assert_relative_eq!(b.max.y, 1.0 + half, epsilon = 1e-5);
        assert_relative_eq!(b.max.z, 1.0, epsilon = 1e-5);
        assert_relative_eq!(b.min.z, -1.0, epsilon = 1e-5);
    }

    // ------------------------------------------------------------------------
    // Cone: base cap, slanted side, apex
    // ------------------------------------------------------------------------

    fn unit_cone() -> Field {
        // Base radius 1 at z = 0, apex at z = 1
        cone(Vec3::ZERO, Vec3::Z, 1.0).unwrap()
    }

    #[test]
    fn cone_below_base_measures_to_disc() {
        let c = unit_cone();
        assert_relative_eq!(c.evaluate(Vec3::new(0.0, 0.0, -1.0)), 1.0, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(Vec3::new(0.5, 0.0, -0.5)), 0.5, epsilon = 1e-5);
        // Outside the rim: distance to the rim circle
        assert_relative_eq!(
            c.evaluate(Vec3::new(2.0, 0.0, -1.0)),
            2.0f32.sqrt(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn cone_side_uses_perpendicular_distance() {
        let c = unit_cone();
        // The side is the line r + z = 1; from (1, 1) the foot is (0.5, 0.5)
        assert_relative_eq!(
            c.evaluate(Vec3::new(1.0, 0.0, 1.0)),
            0.5f32.sqrt(),
            epsilon = 1e-5
        );
        // On the surface
        assert_relative_eq!(c.evaluate(Vec3::new(0.0, 0.5, 0.5)), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn cone_inside_and_above_apex() {
        let c = unit_cone();
        // Nearer the base than the side
        assert_relative_eq!(c.evaluate(Vec3::new(0.0, 0.0, 0.25)), -0.25, epsilon = 1e-5);
        // Straight above the apex
        assert_relative_eq!(c.evaluate(Vec3::new(0.0, 0.0, 2.0)), 1.0, epsilon = 1e-5);
    }

    // ------------------------------------------------------------------------
    // Capsule, torus, plane, implicit
    // ------------------------------------------------------------------------

    #[test]
    fn capsule_is_round_at_the_ends() {
        let c = capsule(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0), 1.0).unwrap();
        assert_relative_eq!(c.evaluate(Vec3::new(0.0, 0.0, 6.0)), 1.0, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(Vec3::new(3.0, 0.0, 2.0)), 2.0, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(Vec3::new(0.0, 0.0, 2.0)), -1.0, epsilon = 1e-5);
        let b = c.bounds().unwrap();
        assert_relative_eq!(b.min.z, -1.0);
        assert_relative_eq!(b.max.z, 5.0);
    }

    #[test]
    fn torus_measures_to_minor_circle() {
        let t = torus(Vec3::ZERO, 5.0, 1.0).unwrap();
        assert_relative_eq!(t.evaluate(Vec3::new(5.0, 0.0, 0.0)), -1.0, epsilon = 1e-5);
        assert_relative_eq!(t.evaluate(Vec3::ZERO), 4.0, epsilon = 1e-5);
        assert_relative_eq!(t.evaluate(Vec3::new(0.0, 5.0, 3.0)), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn plane_signed_distance() {
        let p = plane(Vec3::new(0.0, 0.0, 2.0), 1.0).unwrap();
        assert_relative_eq!(p.evaluate(Vec3::new(3.0, 4.0, 5.0)), 4.0);
        assert_relative_eq!(p.evaluate(Vec3::new(0.0, 0.0, -1.0)), -2.0);
        assert_eq!(p.bounds(), Some(Aabb::cube(PLANE_EXTENT)));
    }

    #[test]
    fn implicit_requires_bounds() {
        assert!(matches!(
            implicit(|p| p.length() - 1.0, None),
            Err(Error::MissingBounds(_))
        ));
        let f = implicit(|p| p.length() - 1.0, Some(Aabb::cube(1.0))).unwrap();
        assert_relative_eq!(f.evaluate(Vec3::new(2.0, 0.0, 0.0)), 1.0);
        assert_eq!(f.kind(), FieldKind::Implicit);
    }
}
