use std::fmt;

use thiserror::Error;

/// Section of a DLP file or catalog being decoded when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Groups,
    Patches,
    Vertices,
    Materials,
    Textures,
    Physics,
    Catalog,
    /// A record decoded on its own, outside of any document.
    Record,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Header => "header",
            Section::Groups => "groups",
            Section::Patches => "patches",
            Section::Vertices => "vertices",
            Section::Materials => "materials",
            Section::Textures => "textures",
            Section::Physics => "physics",
            Section::Catalog => "catalog",
            Section::Record => "record",
        };
        f.write_str(name)
    }
}

/// Kind of entity an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Vertex,
    Patch,
    Material,
    Texture,
    Physics,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Vertex => "vertex",
            ReferenceKind::Patch => "patch",
            ReferenceKind::Material => "material",
            ReferenceKind::Texture => "texture",
            ReferenceKind::Physics => "physics",
        };
        f.write_str(name)
    }
}

/// Why a file was rejected before any section was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown signature 0x{0:06X} (expected 0x444C50)")]
    Signature(u32),
    #[error("unknown DLP version ({0})")]
    Version(u8),
}

#[derive(Debug, Error)]
pub enum DlpError {
    #[error(
        "truncated input in {section} at 0x{offset:X} (need {needed} bytes, have {available})"
    )]
    TruncatedInput {
        section: Section,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("unsupported format: {0}")]
    UnsupportedFormat(#[from] FormatError),
    #[error("field `{field}` is too long ({len} bytes, capacity {capacity})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        capacity: usize,
    },
    #[error("field `{field}` holds {ch:?}, which has no single-byte form")]
    UnencodableText { field: &'static str, ch: char },
    #[error("{kind} reference {index} out of range (count: {count})")]
    InvalidReference {
        kind: ReferenceKind,
        index: i32,
        count: usize,
    },
    #[error("patch {patch} in group `{group}` has neither a material nor a texture")]
    MissingMaterialAssignment { group: String, patch: usize },
    #[error("negative element count {count} in {section}")]
    InvalidCount { section: Section, count: i32 },
    #[error("patch declares {expected} vertices but holds {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl DlpError {
    /// Attribute a truncation or count failure to the section being decoded.
    pub fn in_section(self, section: Section) -> Self {
        match self {
            DlpError::TruncatedInput {
                offset,
                needed,
                available,
                ..
            } => DlpError::TruncatedInput {
                section,
                offset,
                needed,
                available,
            },
            DlpError::InvalidCount { count, .. } => DlpError::InvalidCount { section, count },
            other => other,
        }
    }
}

pub type DlpResult<T> = Result<T, DlpError>;
