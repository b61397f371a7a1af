//! Grid sampling and per-cell triangulation

use super::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use super::{Mesh, MeshOptions, MeshStage};
use crate::error::{Error, Result, ensure_positive};
use crate::field::Field;
use crate::math::Aabb;
use glam::Vec3;

/// Samples between two sampling progress reports
pub const SAMPLE_PROGRESS_INTERVAL: usize = 16_384;

/// One `f32` per grid sample
const BYTES_PER_SAMPLE: u64 = 4;

/// Bytes of the `(resolution + 1)³` sample grid, `None` on overflow
pub fn grid_memory_bytes(resolution: u32) -> Option<u64> {
    let n = u64::from(resolution) + 1;
    n.checked_mul(n)?.checked_mul(n)?.checked_mul(BYTES_PER_SAMPLE)
}

/// Largest resolution whose grid fits in `limit_bytes`
pub fn max_safe_resolution(limit_bytes: u64) -> u32 {
    let fits = |n: u64| {
        n.checked_pow(3)
            .and_then(|c| c.checked_mul(BYTES_PER_SAMPLE))
            .is_some_and(|bytes| bytes <= limit_bytes)
    };
    // Samples per axis, starting from the floating estimate and corrected
    let mut n = ((limit_bytes / BYTES_PER_SAMPLE) as f64).cbrt().floor() as u64;
    while n > 0 && !fits(n) {
        n -= 1;
    }
    while fits(n + 1) {
        n += 1;
    }
    u32::try_from(n.saturating_sub(1)).unwrap_or(u32::MAX)
}

/// Generate a mesh from a field using Marching Cubes
pub fn marching_cubes(field: &Field, options: &MeshOptions) -> Result<Mesh> {
    marching_cubes_with_progress(field, options, |_, _| {})
}

/// Generate a mesh, reporting `(percent, message)` as work proceeds
///
/// Every check (resolution, bounds, memory budget) runs before the grid is
/// allocated; a failing call does no sampling at all.
pub fn marching_cubes_with_progress<F>(
    field: &Field,
    options: &MeshOptions,
    on_progress: F,
) -> Result<Mesh>
where
    F: FnMut(f32, &str),
{
    let res = options.resolution;
    if res == 0 {
        return Err(Error::invalid("resolution must be at least 1"));
    }
    ensure_positive("normal epsilon", options.normal_epsilon)?;
    let (bounds, from_field) = match options.bounds {
        Some(bounds) => (bounds, false),
        None => (
            field.bounds().ok_or_else(|| {
                Error::MissingBounds(
                    "field is unbounded and no meshing bounds were given".to_string(),
                )
            })?,
            true,
        ),
    };
    // A field whose finite bounds have no volume (e.g. disjoint intersection)
    // has no surface to extract
    let empty = from_field && bounds.min.is_finite() && bounds.max.is_finite();
    if !bounds.is_valid() && !empty {
        return Err(Error::invalid(format!(
            "meshing bounds must be finite with positive extent, got {bounds:?}"
        )));
    }
    let required_bytes = check_memory(res, options.max_memory_mb)?;

    let mut progress = Progress::new(on_progress);
    if !bounds.is_valid() {
        tracing::debug!(?bounds, "field bounds are empty, nothing to mesh");
        progress.enter(MeshStage::Done);
        progress.report(100.0);
        return Ok(Mesh::empty());
    }
    let grid = Grid::new(bounds, res);

    progress.enter(MeshStage::Sampling);
    let values = grid.sample(field, &mut progress).ok_or_else(|| Error::MemoryLimit {
        resolution: res,
        required_bytes,
        limit_bytes: budget_bytes(options.max_memory_mb),
        max_resolution: max_safe_resolution(budget_bytes(options.max_memory_mb)),
    })?;

    progress.enter(MeshStage::Triangulating);
    let mut builder = MeshBuilder::default();
    for k in 0..res {
        for j in 0..res {
            for i in 0..res {
                grid.process_cell(field, &values, [i, j, k], options.normal_epsilon, &mut builder);
            }
        }
        progress.report(50.0 + 45.0 * (k + 1) as f32 / res as f32);
    }

    progress.enter(MeshStage::Finalizing);
    let mesh = builder.finish();
    tracing::info!(
        resolution = res,
        vertices = mesh.vertex_count,
        triangles = mesh.triangle_count,
        "marching cubes finished"
    );

    progress.enter(MeshStage::Done);
    progress.report(100.0);
    Ok(mesh)
}

/// Memory budget in bytes
fn budget_bytes(max_memory_mb: f32) -> u64 {
    (f64::from(max_memory_mb) * 1024.0 * 1024.0) as u64
}

/// Reject grids over the budget before anything is allocated, returning the
/// grid size in bytes
fn check_memory(resolution: u32, max_memory_mb: f32) -> Result<u64> {
    ensure_positive("memory budget", max_memory_mb)?;
    let limit_bytes = budget_bytes(max_memory_mb);
    let over_budget = |required_bytes| Error::MemoryLimit {
        resolution,
        required_bytes,
        limit_bytes,
        max_resolution: max_safe_resolution(limit_bytes),
    };

    // An overflowing size is over any budget
    let required_bytes = grid_memory_bytes(resolution).ok_or_else(|| over_budget(u64::MAX))?;
    if required_bytes > limit_bytes {
        return Err(over_budget(required_bytes));
    }
    if required_bytes.saturating_mul(4) > limit_bytes.saturating_mul(3) {
        tracing::warn!(
            resolution,
            required_bytes,
            limit_bytes,
            "voxel grid uses more than 75% of the memory budget"
        );
    }
    Ok(required_bytes)
}

// ============================================================================
// Progress reporting
// ============================================================================

struct Progress<F> {
    callback: F,
    stage: MeshStage,
}

impl<F: FnMut(f32, &str)> Progress<F> {
    fn new(callback: F) -> Self {
        Self {
            callback,
            stage: MeshStage::Idle,
        }
    }

    fn enter(&mut self, stage: MeshStage) {
        tracing::debug!(from = %self.stage, to = %stage, "mesh stage");
        self.stage = stage;
    }

    fn report(&mut self, percent: f32) {
        (self.callback)(percent, self.stage.message());
    }
}

// ============================================================================
// Voxel grid
// ============================================================================

/// Regular sample lattice over a box
struct Grid {
    origin: Vec3,
    step: Vec3,
    res: u32,
    /// Samples per axis
    n: usize,
}

impl Grid {
    fn new(bounds: Aabb, res: u32) -> Self {
        Self {
            origin: bounds.min,
            step: bounds.size() / res as f32,
            res,
            n: res as usize + 1,
        }
    }

    #[inline]
    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.n * (j + self.n * k)
    }

    #[inline]
    fn point(&self, i: u32, j: u32, k: u32) -> Vec3 {
        self.origin + Vec3::new(i as f32, j as f32, k as f32) * self.step
    }

    /// Sample every grid point in index order, `None` if the grid cannot be
    /// allocated
    fn sample<F: FnMut(f32, &str)>(
        &self,
        field: &Field,
        progress: &mut Progress<F>,
    ) -> Option<Vec<f32>> {
        let total = self.n.checked_mul(self.n)?.checked_mul(self.n)?;
        let mut values = Vec::new();
        values.try_reserve_exact(total).ok()?;
        for k in 0..=self.res {
            for j in 0..=self.res {
                for i in 0..=self.res {
                    values.push(field.evaluate(self.point(i, j, k)));
                    if values.len() % SAMPLE_PROGRESS_INTERVAL == 0 {
                        progress.report(50.0 * values.len() as f32 / total as f32);
                    }
                }
            }
        }
        tracing::debug!(samples = total, "grid sampled");
        Some(values)
    }

    /// Triangulate one cell, appending its triangles to `out`
    fn process_cell(
        &self,
        field: &Field,
        values: &[f32],
        [i, j, k]: [u32; 3],
        normal_epsilon: f32,
        out: &mut MeshBuilder,
    ) {
        let mut corner_positions = [Vec3::ZERO; 8];
        let mut corner_values = [0.0f32; 8];
        let mut cube_index = 0usize;
        for (c, [ox, oy, oz]) in CORNER_OFFSETS.iter().copied().enumerate() {
            let (ci, cj, ck) = (i + ox, j + oy, k + oz);
            corner_positions[c] = self.point(ci, cj, ck);
            corner_values[c] = values[self.index(ci as usize, cj as usize, ck as usize)];
            if corner_values[c] <= 0.0 {
                cube_index |= 1 << c;
            }
        }

        // Entirely outside or entirely inside
        if cube_index == 0 || cube_index == 255 {
            return;
        }

        let edge_flags = EDGE_TABLE[cube_index];
        let mut edge_vertices = [Vec3::ZERO; 12];
        for (edge, &(a, b)) in EDGE_CORNERS.iter().enumerate() {
            if edge_flags & (1 << edge) != 0 {
                edge_vertices[edge] = interpolate(
                    corner_positions[a],
                    corner_positions[b],
                    corner_values[a],
                    corner_values[b],
                );
            }
        }

        for tri in TRI_TABLE[cube_index].chunks_exact(3) {
            if tri[0] < 0 {
                break;
            }
            let corners = [
                edge_vertices[tri[0] as usize],
                edge_vertices[tri[1] as usize],
                edge_vertices[tri[2] as usize],
            ];
            out.push_triangle(field, corners, normal_epsilon);
        }
    }
}

/// Zero crossing on an edge: `t = |v1| / (|v1| + |v2|)` from `p1`
///
/// Snaps to `p1` when both magnitudes vanish.
#[inline]
fn interpolate(p1: Vec3, p2: Vec3, v1: f32, v2: f32) -> Vec3 {
    let denom = v1.abs() + v2.abs();
    if denom <= f32::EPSILON || !denom.is_finite() {
        return p1;
    }
    p1.lerp(p2, v1.abs() / denom)
}

// ============================================================================
// Output assembly
// ============================================================================

#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    /// Append a triangle with three fresh vertices and gradient normals
    fn push_triangle(&mut self, field: &Field, corners: [Vec3; 3], normal_epsilon: f32) {
        let face = Mesh::face_normal(corners);
        for p in corners {
            let gradient = field.gradient(p, normal_epsilon);
            let normal = if gradient == Vec3::ZERO { face } else { gradient };
            self.indices.push((self.vertices.len() / 3) as u32);
            self.vertices.extend_from_slice(&p.to_array());
            self.normals.extend_from_slice(&normal.to_array());
        }
    }

    fn finish(self) -> Mesh {
        Mesh::new(self.vertices, self.normals, self.indices)
    }
}
