use std::path::{Path, PathBuf};

use bon::Builder;
use thiserror::Error;

use crate::error::DlpError;
use crate::mesh::texture::TextureDirs;
use crate::models::library::UnknownLibraryKind;

/// Per-file DLP and catalog processing
pub mod batch;
/// Catalog CSV tables
#[cfg(feature = "csv")]
pub mod catalog_csv;
/// Field-aligned text dumps of scenes and catalogs
pub mod log;
/// Wavefront OBJ/MTL writer
pub mod obj;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Dlp(#[from] DlpError),
    #[error("text formatting failed")]
    Format(#[from] std::fmt::Error),
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
    #[error("cannot tell the catalog type of {path}: {source}")]
    UnknownCatalog {
        path: String,
        #[source]
        source: UnknownLibraryKind,
    },
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("no DLP files found in {0}")]
    NoInputs(String),
}

impl ExportError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        ExportError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Where exported files go and how textures are looked up.
#[derive(Debug, Clone, Builder)]
pub struct ExportOptions {
    /// Output directory. Files are written next to their input when unset.
    #[builder(into)]
    output_dir: Option<PathBuf>,
    /// Root the texture directories are probed below. Defaults to the
    /// directory of the DLP being exported.
    #[builder(into)]
    texture_root: Option<PathBuf>,
    #[builder(default)]
    texture_dirs: TextureDirs,
    /// Also write a `.csv` table when dumping a catalog.
    #[builder(default)]
    write_csv: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ExportOptions {
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn texture_root(&self) -> Option<&Path> {
        self.texture_root.as_deref()
    }

    pub fn texture_dirs(&self) -> &TextureDirs {
        &self.texture_dirs
    }

    pub fn write_csv(&self) -> bool {
        self.write_csv
    }

    /// `input` with its extension replaced, placed in the output directory if
    /// one is set.
    pub fn output_path(&self, input: &Path, extension: &str) -> PathBuf {
        let renamed = input.with_extension(extension);
        match (&self.output_dir, renamed.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => renamed,
        }
    }

    pub fn texture_root_for(&self, input: &Path) -> PathBuf {
        match &self.texture_root {
            Some(root) => root.clone(),
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}
