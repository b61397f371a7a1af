//! Mesh generation from fields using Marching Cubes
//!
//! The mesher samples a field on a regular grid, triangulates every cell from
//! the lookup tables and returns a triangle soup: each triangle owns its three
//! vertices, and vertex normals come from the field gradient.

mod marching_cubes;
pub mod stats;
mod tables;

use crate::math::Aabb;
use glam::Vec3;
use std::fmt;

pub use marching_cubes::{
    SAMPLE_PROGRESS_INTERVAL, grid_memory_bytes, marching_cubes, marching_cubes_with_progress,
    max_safe_resolution,
};
pub use tables::{EDGE_TABLE, TRI_TABLE};

/// A triangle mesh with flattened vertex and normal arrays
///
/// `vertices` and `normals` hold 3 floats per vertex, `indices` 3 entries per
/// triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bounds: Aabb,
}

impl Mesh {
    /// Assemble a mesh, deriving counts and bounds from the arrays
    pub fn new(vertices: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let vertex_count = vertices.len() / 3;
        let triangle_count = indices.len() / 3;
        let bounds = Aabb::from_points(
            vertices
                .chunks_exact(3)
                .map(|v| Vec3::new(v[0], v[1], v[2])),
        )
        .unwrap_or_else(|| Aabb::new(Vec3::ZERO, Vec3::ZERO));
        Self {
            vertices,
            normals,
            indices,
            vertex_count,
            triangle_count,
            bounds,
        }
    }

    /// Mesh with no geometry
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count == 0
    }

    /// Position of vertex `i`
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[i * 3..i * 3 + 3])
    }

    /// Stored (gradient) normal of vertex `i`
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.normals[i * 3..i * 3 + 3])
    }

    /// Corner positions of every triangle
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.position(tri[0] as usize),
                self.position(tri[1] as usize),
                self.position(tri[2] as usize),
            ]
        })
    }

    /// Unit normal from the triangle's edge vectors, zero when degenerate
    pub fn face_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
        (b - a).cross(c - a).normalize_or_zero()
    }
}

/// Configuration for mesh generation
#[derive(Debug, Clone, Copy)]
pub struct MeshOptions {
    /// Grid resolution (number of cells along each axis)
    pub resolution: u32,
    /// Region to sample; the field's own bounds when `None`
    pub bounds: Option<Aabb>,
    /// Budget for the voxel grid, in mebibytes
    pub max_memory_mb: f32,
    /// Finite-difference step for vertex normals
    pub normal_epsilon: f32,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            resolution: 32,
            bounds: None,
            max_memory_mb: 512.0,
            normal_epsilon: crate::field::DEFAULT_NORMAL_EPSILON,
        }
    }
}

impl MeshOptions {
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_max_memory_mb(mut self, max_memory_mb: f32) -> Self {
        self.max_memory_mb = max_memory_mb;
        self
    }

    pub fn with_normal_epsilon(mut self, normal_epsilon: f32) -> Self {
        self.normal_epsilon = normal_epsilon;
        self
    }
}

/// Where a meshing call is; stages only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MeshStage {
    Idle,
    Sampling,
    Triangulating,
    Finalizing,
    Done,
}

impl MeshStage {
    /// Progress message reported for this stage
    pub fn message(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Sampling => "sampling grid",
            Self::Triangulating => "triangulating cubes",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for MeshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_triangle() -> Mesh {
        Mesh::new(
            vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 3.0, 1.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn new_derives_counts_and_bounds() {
        let mesh = single_triangle();
        assert_eq!(mesh.vertex_count, 3);
        assert_eq!(mesh.triangle_count, 1);
        assert_eq!(mesh.bounds.max, Vec3::new(2.0, 3.0, 1.0));
        assert_eq!(mesh.position(2), Vec3::new(0.0, 3.0, 1.0));
    }

    #[test]
    fn empty_mesh_has_zero_bounds() {
        let mesh = Mesh::empty();
        assert!(mesh.is_empty());
        assert_relative_eq!(mesh.bounds.volume(), 0.0);
    }

    #[test]
    fn face_normal_follows_right_hand_rule() {
        let n = Mesh::face_normal([Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(n, Vec3::Z);
        assert_eq!(Mesh::face_normal([Vec3::ZERO, Vec3::X, Vec3::X * 2.0]), Vec3::ZERO);
    }

    #[test]
    fn options_defaults() {
        let options = MeshOptions::default();
        assert_eq!(options.resolution, 32);
        assert!(options.bounds.is_none());
        assert_relative_eq!(options.max_memory_mb, 512.0);
        assert_relative_eq!(options.normal_epsilon, 0.001);
    }

    #[test]
    fn stages_are_ordered() {
        assert!(MeshStage::Idle < MeshStage::Sampling);
        assert!(MeshStage::Triangulating < MeshStage::Done);
        assert_eq!(MeshStage::Done.to_string(), "done");
    }
}
