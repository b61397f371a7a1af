//! Export functionality for meshes

mod obj;
mod stl;

use crate::Result;
use crate::mesh::Mesh;
use std::path::Path;

pub use obj::{export_obj, to_obj, write_obj};
pub use stl::{STL_HEADER_LEN, STL_RECORD_LEN, export_stl, to_stl, write_stl};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Stl,
    Obj,
}

impl ExportFormat {
    /// Detect format from file extension (case-insensitive)
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Obj => "obj",
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stl => "STL (Binary)",
            Self::Obj => "OBJ",
        }
    }
}

/// Object name for a file: its stem, or "mesh"
fn object_name(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh")
}

/// Extension trait for exporting meshes
pub trait MeshExport {
    /// Export mesh to file, auto-detecting format from extension
    fn export<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Export mesh to binary STL
    fn export_stl<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Export mesh to OBJ format
    fn export_obj<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl MeshExport for Mesh {
    fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match ExportFormat::from_extension(path) {
            Some(ExportFormat::Stl) => self.export_stl(path),
            Some(ExportFormat::Obj) => self.export_obj(path),
            None => Err(crate::Error::Export(format!(
                "Unknown file extension: {}",
                path.display()
            ))),
        }
    }

    fn export_stl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        export_stl(self, object_name(path), path)
    }

    fn export_obj<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        export_obj(self, object_name(path), path)
    }
}
