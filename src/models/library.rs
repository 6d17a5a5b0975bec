//! Material, texture and physics library records.
//!
//! These records appear both at the end of every DLP file and in the flat
//! `MATERIAL.DB` / `TEXTURE.DB` / `PHYSICS.DB` catalogs, which are nothing
//! more than an `i32` count followed by that many records.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::data::cursor::BinaryCursor;
use crate::data::layout::{FieldVisitor, FixedRecord};
use crate::error::{DlpResult, Section};
use crate::models::types::{ColorRGB, ColorRGBA, Vector2};

/// Width of the NUL-padded name field shared by all library records.
pub const NAME_LEN: usize = 32;

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MaterialRecord {
    pub name: String,
    pub emission: ColorRGBA,
    pub ambient: ColorRGBA,
    pub diffuse: ColorRGBA,
    pub specular: ColorRGBA,
    pub shininess: f32,
    pub reserved: i16,
}

impl FixedRecord for MaterialRecord {
    fn visit_fields<V: FieldVisitor>(&mut self, visitor: &mut V) -> DlpResult<()> {
        visitor.fixed_string("name", &mut self.name, NAME_LEN)?;
        visitor.rgba("emission", &mut self.emission)?;
        visitor.rgba("ambient", &mut self.ambient)?;
        visitor.rgba("diffuse", &mut self.diffuse)?;
        visitor.rgba("specular", &mut self.specular)?;
        visitor.f32("shininess", &mut self.shininess)?;
        visitor.i16("reserved", &mut self.reserved)
    }
}

/// Texture flag bits with a known meaning.
pub mod texture_flags {
    pub const COLOR: u8 = 1 << 0;
    pub const SWRAP: u8 = 1 << 1;
    pub const TWRAP: u8 = 1 << 2;
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureRecord {
    pub name: String,
    pub flags: u8,
    pub unknown1: u8,
    pub unknown2: u8,
}

impl FixedRecord for TextureRecord {
    fn visit_fields<V: FieldVisitor>(&mut self, visitor: &mut V) -> DlpResult<()> {
        visitor.fixed_string("name", &mut self.name, NAME_LEN)?;
        visitor.u8("flags", &mut self.flags)?;
        visitor.u8("unknown1", &mut self.unknown1)?;
        visitor.u8("unknown2", &mut self.unknown2)?;
        visitor.padding(1)
    }
}

impl TextureRecord {
    /// Names of the set flag bits, in bit order. Bits without a known name
    /// are reported as `FLAG_<value>`.
    pub fn flag_names(&self) -> Vec<String> {
        (0..8)
            .map(|bit| 1u8 << bit)
            .filter(|mask| self.flags & mask != 0)
            .map(|mask| match mask {
                texture_flags::COLOR => "color".to_string(),
                texture_flags::SWRAP => "swrap".to_string(),
                texture_flags::TWRAP => "twrap".to_string(),
                other => format!("FLAG_{other}"),
            })
            .collect()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PhysicsRecord {
    pub name: String,
    pub friction: f32,
    pub elasticity: f32,
    pub drag: f32,
    pub bump_height: f32,
    pub bump_width: f32,
    pub sink_depth: f32,
    pub ptx_rate: f32,
    pub kind: i32,
    pub sound: i32,
    pub velocity: Vector2,
    pub ptx_color: ColorRGB,
}

impl FixedRecord for PhysicsRecord {
    fn visit_fields<V: FieldVisitor>(&mut self, visitor: &mut V) -> DlpResult<()> {
        visitor.fixed_string("name", &mut self.name, NAME_LEN)?;
        visitor.f32("friction", &mut self.friction)?;
        visitor.f32("elasticity", &mut self.elasticity)?;
        visitor.f32("drag", &mut self.drag)?;
        visitor.f32("bumpheight", &mut self.bump_height)?;
        visitor.f32("bumpwidth", &mut self.bump_width)?;
        visitor.f32("sinkdepth", &mut self.sink_depth)?;
        visitor.f32("ptxrate", &mut self.ptx_rate)?;
        visitor.i32("type", &mut self.kind)?;
        visitor.i32("sound", &mut self.sound)?;
        visitor.vec2("velocity", &mut self.velocity)?;
        visitor.rgb("ptxcolor", &mut self.ptx_color)
    }
}

/// Which record type a catalog holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryKind {
    Material,
    Texture,
    Physics,
}

impl LibraryKind {
    /// Title used in the catalog log header.
    pub fn library_name(self) -> &'static str {
        match self {
            LibraryKind::Material => "Material library",
            LibraryKind::Texture => "Texture library",
            LibraryKind::Physics => "Physics library",
        }
    }

    /// Label for the entry count in the catalog log header.
    pub fn entries_name(self) -> &'static str {
        match self {
            LibraryKind::Material => "Materials",
            LibraryKind::Texture => "Textures",
            LibraryKind::Physics => "Physics",
        }
    }
}

/// A file stem or name that isn't `material`, `texture` or `physics`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not MATERIAL, TEXTURE or PHYSICS")]
pub struct UnknownLibraryKind(pub String);

/// Parses catalog file stems such as `MATERIAL` or `textures`, ignoring case.
impl FromStr for LibraryKind {
    type Err = UnknownLibraryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "material" | "materials" => Ok(LibraryKind::Material),
            "texture" | "textures" => Ok(LibraryKind::Texture),
            "physics" => Ok(LibraryKind::Physics),
            _ => Err(UnknownLibraryKind(s.to_string())),
        }
    }
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LibraryKind::Material => "material",
            LibraryKind::Texture => "texture",
            LibraryKind::Physics => "physics",
        };
        f.write_str(name)
    }
}

/// A decoded library catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Catalog {
    Materials(Vec<MaterialRecord>),
    Textures(Vec<TextureRecord>),
    Physics(Vec<PhysicsRecord>),
}

impl Catalog {
    pub fn open(kind: LibraryKind, bytes: impl Into<Vec<u8>>) -> DlpResult<Self> {
        let mut cursor = BinaryCursor::from_bytes(bytes);
        let catalog = match kind {
            LibraryKind::Material => Catalog::Materials(load_records(&mut cursor)?),
            LibraryKind::Texture => Catalog::Textures(load_records(&mut cursor)?),
            LibraryKind::Physics => Catalog::Physics(load_records(&mut cursor)?),
        };
        tracing::debug!(
            "{kind} catalog: {} entries, read up to 0x{:X}",
            catalog.len(),
            cursor.tell()
        );
        Ok(catalog)
    }

    pub fn save(&self) -> DlpResult<Vec<u8>> {
        let mut cursor = BinaryCursor::new();
        match self {
            Catalog::Materials(records) => save_records(&mut cursor, records)?,
            Catalog::Textures(records) => save_records(&mut cursor, records)?,
            Catalog::Physics(records) => save_records(&mut cursor, records)?,
        }
        Ok(cursor.into_bytes())
    }

    pub fn kind(&self) -> LibraryKind {
        match self {
            Catalog::Materials(_) => LibraryKind::Material,
            Catalog::Textures(_) => LibraryKind::Texture,
            Catalog::Physics(_) => LibraryKind::Physics,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Catalog::Materials(records) => records.len(),
            Catalog::Textures(records) => records.len(),
            Catalog::Physics(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read an `i32` count followed by that many records.
pub fn load_records<T: FixedRecord>(cursor: &mut BinaryCursor) -> DlpResult<Vec<T>> {
    let count = cursor
        .read_count()
        .map_err(|e| e.in_section(Section::Catalog))?;
    cursor
        .read_array(count, |c| T::load(c))
        .map_err(|e| e.in_section(Section::Catalog))
}

pub fn save_records<T: FixedRecord>(cursor: &mut BinaryCursor, records: &[T]) -> DlpResult<()> {
    cursor.write_count("count", records.len())?;
    cursor.write_array(records, |c, record| record.save(c))
}
