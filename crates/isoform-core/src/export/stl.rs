//! STL file export (Binary format)
//!
//! Binary STL layout:
//! - 80 bytes: header (`isoform: {name}`, zero padded)
//! - 4 bytes: number of triangles (u32 little-endian)
//! - For each triangle (50 bytes):
//!   - 12 bytes: face normal (3 x f32 little-endian)
//!   - 36 bytes: 3 vertices (9 x f32 little-endian)
//!   - 2 bytes: attribute byte count (0)
//!
//! Face normals are always recomputed from the triangle edges. The gradient
//! normals stored on the mesh are for shading and are not written here.

use crate::Result;
use crate::mesh::Mesh;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Bytes before the first triangle record
pub const STL_HEADER_LEN: usize = 84;

/// Bytes per triangle record
pub const STL_RECORD_LEN: usize = 50;

/// Write a mesh as binary STL into `writer`
pub fn write_stl<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> Result<()> {
    // Header (80 bytes, truncated or zero padded)
    let header = format!("isoform: {name}");
    let mut header_bytes = [0u8; 80];
    let header_len = header.len().min(80);
    header_bytes[..header_len].copy_from_slice(&header.as_bytes()[..header_len]);
    writer.write_all(&header_bytes)?;

    let num_triangles = u32::try_from(mesh.triangle_count).map_err(|_| {
        crate::Error::Export(format!(
            "{} triangles exceed the STL limit",
            mesh.triangle_count
        ))
    })?;
    writer.write_all(&num_triangles.to_le_bytes())?;

    for tri in mesh.triangles() {
        let normal = Mesh::face_normal(tri);
        for v in std::iter::once(normal).chain(tri) {
            writer.write_all(&v.x.to_le_bytes())?;
            writer.write_all(&v.y.to_le_bytes())?;
            writer.write_all(&v.z.to_le_bytes())?;
        }
        // Attribute byte count
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

/// Encode a mesh as a binary STL buffer
pub fn to_stl(mesh: &Mesh, name: &str) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(STL_HEADER_LEN + STL_RECORD_LEN * mesh.triangle_count);
    // Writing to a Vec cannot fail on IO; only an oversized count can
    if write_stl(mesh, name, &mut buffer).is_err() {
        tracing::error!(triangles = mesh.triangle_count, "mesh too large for STL");
        buffer.clear();
    }
    buffer
}

/// Export a mesh to a binary STL file
pub fn export_stl(mesh: &Mesh, name: &str, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_stl(mesh, name, &mut writer)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), triangles = mesh.triangle_count, "wrote STL");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("isoform_test_{}", name))
    }

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn triangle_mesh() -> Mesh {
        // Counter-clockwise in XY, but with deliberately wrong stored normals
        Mesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn layout_is_header_count_and_records() {
        let bytes = to_stl(&triangle_mesh(), "tri");
        assert_eq!(bytes.len(), 134);
        assert_eq!(&bytes[..12], b"isoform: tri");
        assert!(bytes[12..80].iter().all(|&b| b == 0));
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 1);
        // Attribute bytes
        assert_eq!(&bytes[132..134], &[0, 0]);
    }

    #[test]
    fn face_normal_is_geometric_not_stored() {
        let bytes = to_stl(&triangle_mesh(), "tri");
        let normal = Vec3::new(read_f32(&bytes, 84), read_f32(&bytes, 88), read_f32(&bytes, 92));
        assert_eq!(normal, Vec3::Z);
        // Second vertex follows the normal
        assert_eq!(read_f32(&bytes, 84 + 24), 1.0);
    }

    #[test]
    fn degenerate_triangle_gets_zero_normal() {
        let mesh = Mesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0],
            vec![0.0; 9],
            vec![0, 1, 2],
        );
        let bytes = to_stl(&mesh, "flat");
        for i in 0..3 {
            assert_eq!(read_f32(&bytes, 84 + i * 4), 0.0);
        }
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "x".repeat(200);
        let bytes = to_stl(&Mesh::empty(), &name);
        assert_eq!(bytes.len(), STL_HEADER_LEN);
        assert_eq!(bytes[79], b'x');
    }

    #[test]
    fn export_matches_buffer() {
        let mesh = triangle_mesh();
        let path = temp_path("triangle.stl");
        export_stl(&mesh, "tri", &path).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, to_stl(&mesh, "tri"));

        // Clean up
        let _ = std::fs::remove_file(&path);
    }
}
