//! OBJ file export
//!
//! Vertices and normals are written one line each, in mesh order, and faces
//! reference them with 1-based `v//vn` pairs.

use crate::Result;
use crate::mesh::Mesh;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a mesh as OBJ text into `writer`
pub fn write_obj<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> Result<()> {
    // Header
    writeln!(writer, "# isoform OBJ export")?;
    writeln!(writer, "# Vertices: {}", mesh.vertex_count)?;
    writeln!(writer, "# Triangles: {}", mesh.triangle_count)?;
    writeln!(writer, "o {name}")?;
    writeln!(writer)?;

    for v in mesh.vertices.chunks_exact(3) {
        writeln!(writer, "v {} {} {}", v[0], v[1], v[2])?;
    }
    writeln!(writer)?;

    // Gradient normals from meshing
    for n in mesh.normals.chunks_exact(3) {
        writeln!(writer, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    writeln!(writer)?;

    // Faces (OBJ uses 1-based indexing)
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    Ok(())
}

/// Encode a mesh as OBJ text
pub fn to_obj(mesh: &Mesh, name: &str) -> String {
    let mut buffer = Vec::new();
    // Writing into memory does not fail
    if write_obj(mesh, name, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Export a mesh to an OBJ file
pub fn export_obj(mesh: &Mesh, name: &str, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, name, &mut writer)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), vertices = mesh.vertex_count, "wrote OBJ");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            ],
            [0.0f32, 0.0, 1.0].repeat(6),
            vec![0, 1, 2, 3, 4, 5],
        )
    }

    #[test]
    fn obj_lists_vertices_normals_and_faces() {
        let text = to_obj(&quad(), "quad");
        assert!(text.contains("o quad"));
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 6);
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 6);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 2);
        assert!(text.contains("f 1//1 2//2 3//3"));
        assert!(text.contains("f 4//4 5//5 6//6"));
        assert!(text.contains("vn 0 0 1"));
    }

    #[test]
    fn export_writes_same_text() {
        let path = std::env::temp_dir().join("isoform_test_quad.obj");
        export_obj(&quad(), "quad", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), to_obj(&quad(), "quad"));
        let _ = std::fs::remove_file(&path);
    }
}
