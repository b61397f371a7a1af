//! Axis-aligned bounds
//!
//! Vectors come from `glam` (`Vec2`/`Vec3` are plain `Copy` values, so every
//! operation returns a new value). This module adds the bounding box used for
//! early-out culling and for sizing the meshing grid.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-Aligned Bounding Box
///
/// Invariant: `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from two corners, ordering them componentwise
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a cube centered at origin
    pub fn cube(half_size: f32) -> Self {
        Self::new(Vec3::splat(-half_size), Vec3::splat(half_size))
    }

    /// Create from center and half-extents
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing every point, or `None` for an empty iterator
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Expand the bounding box by a margin on every side
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(
            self.min - Vec3::splat(margin),
            self.max + Vec3::splat(margin),
        )
    }

    /// Merge two bounding boxes
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlap of two boxes.
    ///
    /// Disjoint boxes collapse to a zero-volume box so the `min <= max`
    /// invariant still holds.
    pub fn intersection(&self, other: &Aabb) -> Self {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Get the size of the bounding box
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// True when every component is finite and the box has positive extent on all axes
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.size().cmpgt(Vec3::ZERO).all()
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Euclidean distance from `p` to the box, zero when inside
    pub fn distance_to(&self, p: Vec3) -> f32 {
        let outside = (self.min - p).max(p - self.max).max(Vec3::ZERO);
        outside.length()
    }

    /// Signed distance to the box surface (negative inside)
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        let q = (p - self.center()).abs() - self.size() * 0.5;
        q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
    }

    /// The 8 corners, bit `i` of the index selecting `max` on axis `i`
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Tight axis-aligned box around the 8 corners mapped through `f`
    pub fn transformed(&self, f: impl Fn(Vec3) -> Vec3) -> Self {
        let corners = self.corners();
        let first = f(corners[0]);
        let (min, max) = corners[1..]
            .iter()
            .map(|&c| f(c))
            .fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Self { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_orders_corners() {
        let b = Aabb::new(Vec3::new(1.0, -1.0, 3.0), Vec3::new(-1.0, 1.0, 2.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 2.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn disjoint_intersection_keeps_invariant() {
        let a = Aabb::cube(1.0);
        let b = Aabb::from_center(Vec3::new(5.0, 0.0, 0.0), Vec3::ONE);
        let i = a.intersection(&b);
        assert!(i.size().cmpge(Vec3::ZERO).all());
        assert_relative_eq!(i.volume(), 0.0);
        assert!(!i.is_valid());
    }

    #[test]
    fn distance_to_is_zero_inside_and_euclidean_outside() {
        let b = Aabb::cube(1.0);
        assert_relative_eq!(b.distance_to(Vec3::new(0.5, 0.0, 0.0)), 0.0);
        assert_relative_eq!(b.distance_to(Vec3::new(3.0, 0.0, 0.0)), 2.0);
        // Nearest point is the corner (1, 1, 1)
        assert_relative_eq!(
            b.distance_to(Vec3::new(2.0, 2.0, 2.0)),
            3.0f32.sqrt(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn signed_distance_is_negative_inside() {
        let b = Aabb::from_center(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(2.0));
        assert_relative_eq!(b.signed_distance(Vec3::new(10.0, 0.0, 0.0)), -2.0);
        assert_relative_eq!(b.signed_distance(Vec3::new(13.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn from_points_of_empty_is_none() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
        let b = Aabb::from_points([Vec3::X, Vec3::Y, -Vec3::Z]).unwrap();
        assert_eq!(b.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn corners_cover_all_extremes() {
        let b = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        let corners = b.corners();
        assert_eq!(corners[0], Vec3::ZERO);
        assert_eq!(corners[7], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Aabb::from_points(corners), Some(b));
    }
}
