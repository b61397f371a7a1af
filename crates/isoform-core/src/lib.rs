//! # Isoform Core
//!
//! A signed distance field (SDF) modeling kernel.
//!
//! Shapes are built as an immutable tree of [`Field`]s: primitives composed
//! with booleans, transforms, modifiers and bounded lattices. The tree is
//! sampled on a regular grid and turned into a triangle mesh with Marching
//! Cubes, then written out as binary STL or ASCII OBJ.
//!
//! ## Quick Start
//!
//! ```rust
//! use isoform_core::prelude::*;
//!
//! # fn main() -> isoform_core::Result<()> {
//! let ball = sphere(Vec3::ZERO, 30.0)?;
//! let hole = cylinder(Vec3::new(-20.0, 0.0, -20.0), Vec3::new(-20.0, 0.0, 20.0), 6.0)?;
//! let part = ball.subtract(hole);
//!
//! let mesh = marching_cubes(&part, &MeshOptions::default().with_resolution(24))?;
//! let stl = to_stl(&mesh, "part");
//! assert_eq!(stl.len(), 84 + 50 * mesh.triangle_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Units and Conventions
//!
//! - **Distances**: Arbitrary units (typically millimetres)
//! - **Angles**: All rotation functions use **radians**
//! - **Precision**: `f32` everywhere, including the voxel grid (4 bytes per sample)
//! - **Coordinate system**: Right-handed, Z-up
//! - **Sign**: negative inside, zero on the surface, positive outside

pub mod diagnostics;
pub mod export;
pub mod field;
pub mod math;
pub mod mesh;
pub mod parametric;

mod error;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    // Fields
    pub use crate::field::{
        Field, FieldKind, MaterialId, Metadata, Sample, SampleOptions, Sdf,
        boolean::{difference, intersection, smooth_intersection, smooth_union, union, xor},
        lattice::{LatticePattern, cubic, diamond, gyroid, lattice, octet, schwarz_d, schwarz_p},
        modifier::{blur, chamfer, fillet, offset, shell, with_material},
        primitives::*,
        sketch::{Sketch, SketchElement, extrude, revolve},
        transform::{mirror, rotate, rotate_about, scale, scale_uniform, translate, twist},
    };

    // Meshing
    pub use crate::mesh::{Mesh, MeshOptions, MeshStage, marching_cubes, marching_cubes_with_progress};
    pub use crate::mesh::stats::{MeshStats, analyze};

    // Export
    pub use crate::export::{ExportFormat, MeshExport, to_obj, to_stl};

    // Diagnostics and parameters
    pub use crate::diagnostics::{Diagnosed, Diagnostic};
    pub use crate::parametric::{Parameter, Parameters, ParametricModel};

    // Math (re-export glam)
    pub use crate::math::Aabb;
    pub use glam::{Quat, Vec2, Vec3};

    // Error handling
    pub use crate::{Error, Result};
}
