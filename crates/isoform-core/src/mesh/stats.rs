//! Read-only mesh statistics

use super::Mesh;
use crate::math::Aabb;
use glam::Vec3;
use serde::Serialize;
use std::mem::size_of;

/// Byte sizes of the three mesh arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub vertices_bytes: usize,
    pub normals_bytes: usize,
    pub indices_bytes: usize,
    pub total_bytes: usize,
}

/// Summary of a mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshStats {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bounds: Aabb,
    pub size: Vec3,
    pub memory: MemoryUsage,
}

/// Compute statistics for a mesh
pub fn analyze(mesh: &Mesh) -> MeshStats {
    let vertices_bytes = mesh.vertices.len() * size_of::<f32>();
    let normals_bytes = mesh.normals.len() * size_of::<f32>();
    let indices_bytes = mesh.indices.len() * size_of::<u32>();
    MeshStats {
        vertex_count: mesh.vertex_count,
        triangle_count: mesh.triangle_count,
        bounds: mesh.bounds,
        size: mesh.bounds.size(),
        memory: MemoryUsage {
            vertices_bytes,
            normals_bytes,
            indices_bytes,
            total_bytes: vertices_bytes + normals_bytes + indices_bytes,
        },
    }
}
