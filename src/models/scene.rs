//! The top-level DLP scene document.

use std::path::Path;

use tracing::{debug, trace};

use crate::data::cursor::BinaryCursor;
use crate::error::{DlpError, DlpResult, FormatError, ReferenceKind, Section};
use crate::models::group::GroupRecord;
use crate::models::library::{
    MaterialRecord, PhysicsRecord, TextureRecord, load_records, save_records,
};
use crate::models::patch::PatchRecord;
use crate::models::types::Vector3;

/// `"DLP"` in the top 24 bits of the header word.
pub const DLP_SIGNATURE: u32 = 0x444C50;
/// The only format version this crate understands.
pub const DLP_VERSION: u8 = 7;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SceneDocument {
    /// Low byte of the header word. Only the low nibble is validated.
    pub version: u8,
    pub groups: Vec<GroupRecord>,
    pub patches: Vec<PatchRecord>,
    pub vertices: Vec<Vector3>,
    pub materials: Vec<MaterialRecord>,
    pub textures: Vec<TextureRecord>,
    pub physics: Vec<PhysicsRecord>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self {
            version: DLP_VERSION,
            groups: Vec::new(),
            patches: Vec::new(),
            vertices: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            physics: Vec::new(),
        }
    }
}

fn read_section_counts(cursor: &mut BinaryCursor) -> DlpResult<(usize, usize, usize)> {
    Ok((
        cursor.read_count()?,
        cursor.read_count()?,
        cursor.read_count()?,
    ))
}

fn read_vector3(cursor: &mut BinaryCursor) -> DlpResult<Vector3> {
    Ok(Vector3 {
        x: cursor.read_f32()?,
        y: cursor.read_f32()?,
        z: cursor.read_f32()?,
    })
}

fn write_vector3(cursor: &mut BinaryCursor, value: &Vector3) -> DlpResult<()> {
    cursor.write_f32(value.x)?;
    cursor.write_f32(value.y)?;
    cursor.write_f32(value.z)
}

impl SceneDocument {
    /// Decode a whole DLP file. Sections are read strictly in file order and
    /// the first failure aborts the decode.
    pub fn open(bytes: impl Into<Vec<u8>>) -> DlpResult<Self> {
        let mut cursor = BinaryCursor::from_bytes(bytes);

        let header = cursor
            .read_i32()
            .map_err(|e| e.in_section(Section::Header))?;
        let version = Self::check_header(header)?;

        let (group_count, patch_count, vertex_count) =
            read_section_counts(&mut cursor).map_err(|e| e.in_section(Section::Header))?;
        debug!(
            "DLP v{version}: {group_count} groups, {patch_count} patches, {vertex_count} vertices"
        );

        let groups = cursor
            .read_array(group_count, GroupRecord::load)
            .map_err(|e| e.in_section(Section::Groups))?;
        let patches = cursor
            .read_array(patch_count, PatchRecord::load)
            .map_err(|e| e.in_section(Section::Patches))?;
        let vertices = cursor
            .read_array(vertex_count, read_vector3)
            .map_err(|e| e.in_section(Section::Vertices))?;

        let materials = load_records(&mut cursor).map_err(|e| e.in_section(Section::Materials))?;
        let textures = load_records(&mut cursor).map_err(|e| e.in_section(Section::Textures))?;
        let physics = load_records(&mut cursor).map_err(|e| e.in_section(Section::Physics))?;
        debug!(
            "libraries: {} materials, {} textures, {} physics",
            materials.len(),
            textures.len(),
            physics.len()
        );

        if cursor.remaining() > 0 {
            trace!(
                "decode stopped at 0x{:X}, {} trailing bytes ignored",
                cursor.tell(),
                cursor.remaining()
            );
        } else {
            trace!("decode stopped at 0x{:X}", cursor.tell());
        }

        Ok(Self {
            version,
            groups,
            patches,
            vertices,
            materials,
            textures,
            physics,
        })
    }

    /// Read `path` fully into memory, then decode it.
    pub fn open_path(path: impl AsRef<Path>) -> DlpResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        debug!("opened {} ({} bytes)", path.display(), bytes.len());
        Self::open(bytes)
    }

    fn check_header(header: i32) -> DlpResult<u8> {
        let word = header as u32;
        let signature = word >> 8;
        if signature != DLP_SIGNATURE {
            return Err(FormatError::Signature(signature).into());
        }
        let version = (word & 0xFF) as u8;
        if version & 0x0F != DLP_VERSION {
            return Err(FormatError::Version(version & 0x0F).into());
        }
        Ok(version)
    }

    /// Encode the document. For a document produced by [`SceneDocument::open`]
    /// this reproduces the input bytes, minus any trailing garbage.
    pub fn save(&self) -> DlpResult<Vec<u8>> {
        let mut cursor = BinaryCursor::new();
        cursor.write_i32(((DLP_SIGNATURE << 8) | u32::from(self.version)) as i32)?;
        cursor.write_count("group count", self.groups.len())?;
        cursor.write_count("patch count", self.patches.len())?;
        cursor.write_count("vertex count", self.vertices.len())?;
        cursor.write_array(&self.groups, |c, group| group.save(c))?;
        cursor.write_array(&self.patches, |c, patch| patch.save(c))?;
        cursor.write_array(&self.vertices, write_vector3)?;
        save_records(&mut cursor, &self.materials)?;
        save_records(&mut cursor, &self.textures)?;
        save_records(&mut cursor, &self.physics)?;
        Ok(cursor.into_bytes())
    }

    /// Format version from the header's low nibble.
    pub fn format_version(&self) -> u8 {
        self.version & 0x0F
    }

    pub fn patch(&self, index: i32) -> DlpResult<&PatchRecord> {
        lookup(&self.patches, ReferenceKind::Patch, index)
    }

    /// Position of a zero-based document vertex index.
    pub fn vertex(&self, index: i32) -> DlpResult<&Vector3> {
        lookup(&self.vertices, ReferenceKind::Vertex, index)
    }

    /// Look up a 1-based material id. Id 0 is "none".
    pub fn material(&self, id: i16) -> DlpResult<Option<&MaterialRecord>> {
        lookup_id(&self.materials, ReferenceKind::Material, id)
    }

    pub fn texture(&self, id: i16) -> DlpResult<Option<&TextureRecord>> {
        lookup_id(&self.textures, ReferenceKind::Texture, id)
    }

    pub fn physics_entry(&self, id: i16) -> DlpResult<Option<&PhysicsRecord>> {
        lookup_id(&self.physics, ReferenceKind::Physics, id)
    }

    /// Name of a 1-based material id, or an empty string for id 0.
    pub fn material_name(&self, id: i16) -> DlpResult<&str> {
        Ok(self.material(id)?.map_or("", |m| m.name.as_str()))
    }

    pub fn texture_name(&self, id: i16) -> DlpResult<&str> {
        Ok(self.texture(id)?.map_or("", |t| t.name.as_str()))
    }

    pub fn physics_name(&self, id: i16) -> DlpResult<&str> {
        Ok(self.physics_entry(id)?.map_or("", |p| p.name.as_str()))
    }
}

fn lookup<T>(items: &[T], kind: ReferenceKind, index: i32) -> DlpResult<&T> {
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or(DlpError::InvalidReference {
            kind,
            index,
            count: items.len(),
        })
}

fn lookup_id<T>(items: &[T], kind: ReferenceKind, id: i16) -> DlpResult<Option<&T>> {
    if id == 0 {
        return Ok(None);
    }
    let id = i32::from(id);
    lookup(items, kind, id - 1)
        .map(Some)
        .map_err(|_| DlpError::InvalidReference {
            kind,
            index: id,
            count: items.len(),
        })
}
