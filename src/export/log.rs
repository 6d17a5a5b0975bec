//! Plain-text dumps of scene documents and library catalogs.
//!
//! Every record kind goes through [`write_record`], which picks the layout
//! from the [`RecordRef`] variant.

use std::fmt::{self, Write};

use itertools::Itertools;

use crate::error::DlpResult;
use crate::export::ExportError;
use crate::models::group::GroupRecord;
use crate::models::library::{Catalog, MaterialRecord, PhysicsRecord, TextureRecord};
use crate::models::patch::PatchRecord;
use crate::models::scene::SceneDocument;
use crate::models::types::ColorRGBA;

/// Index values per line in a group's `vx`/`patch` lists.
const GROUP_INDICES_PER_LINE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Material,
    Texture,
    Physics,
    Patch,
    Group,
}

/// Library names a patch refers to, resolved against its document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchNames<'a> {
    pub material: Option<&'a str>,
    pub texture: Option<&'a str>,
    pub physics: Option<&'a str>,
}

impl<'a> PatchNames<'a> {
    pub fn resolve(doc: &'a SceneDocument, patch: &PatchRecord) -> DlpResult<Self> {
        Ok(Self {
            material: doc.material(patch.header.material_id)?.map(|m| m.name.as_str()),
            texture: doc.texture(patch.header.texture_id)?.map(|t| t.name.as_str()),
            physics: doc
                .physics_entry(patch.header.physics_id)?
                .map(|p| p.name.as_str()),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RecordRef<'a> {
    Material(&'a MaterialRecord),
    Texture(&'a TextureRecord),
    Physics(&'a PhysicsRecord),
    Patch(&'a PatchRecord, PatchNames<'a>),
    Group(&'a GroupRecord),
}

impl RecordRef<'_> {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordRef::Material(_) => RecordKind::Material,
            RecordRef::Texture(_) => RecordKind::Texture,
            RecordRef::Physics(_) => RecordKind::Physics,
            RecordRef::Patch(..) => RecordKind::Patch,
            RecordRef::Group(_) => RecordKind::Group,
        }
    }
}

pub fn write_record(out: &mut impl Write, record: RecordRef<'_>) -> fmt::Result {
    match record {
        RecordRef::Material(material) => write_material(out, material),
        RecordRef::Texture(texture) => write_texture(out, texture),
        RecordRef::Physics(physics) => write_physics(out, physics),
        RecordRef::Patch(patch, names) => write_patch(out, patch, names),
        RecordRef::Group(group) => write_group(out, group),
    }
}

fn write_material(out: &mut impl Write, material: &MaterialRecord) -> fmt::Result {
    writeln!(out, "material {} {{", material.name)?;
    let mut color = |name: &str, c: &ColorRGBA| {
        writeln!(
            out,
            "\t{name:<16} {:<12.3} {:<12.3} {:<12.3} {:<12.3}",
            c.r, c.g, c.b, c.a
        )
    };
    color("emission", &material.emission)?;
    color("ambient", &material.ambient)?;
    color("diffuse", &material.diffuse)?;
    color("specular", &material.specular)?;
    writeln!(out, "\t{:<16} {:<12.2}", "shininess", material.shininess)?;
    writeln!(out, "}}")
}

fn write_texture(out: &mut impl Write, texture: &TextureRecord) -> fmt::Result {
    writeln!(out, "texture {} {{", texture.name)?;
    writeln!(
        out,
        "\tsource \"..\\tex\\{}.tif\"",
        texture.name.to_lowercase()
    )?;
    let flags = texture.flag_names().iter().map(|f| format!("{f} ")).join("");
    writeln!(out, "\t{flags}\n}}")
}

fn write_physics(out: &mut impl Write, physics: &PhysicsRecord) -> fmt::Result {
    writeln!(out, "physics {} {{", physics.name)?;
    let floats = [
        ("friction", physics.friction),
        ("elasticity", physics.elasticity),
        ("drag", physics.drag),
        ("bumpheight", physics.bump_height),
        ("bumpwidth", physics.bump_width),
        ("sinkdepth", physics.sink_depth),
        ("ptxrate", physics.ptx_rate),
    ];
    for (name, value) in floats {
        writeln!(out, "\t{name:<10} {value:>12.3}")?;
    }
    writeln!(out, "\t{:<5} {}", "type", physics.kind)?;
    writeln!(out, "\t{:<5} {}", "sound", physics.sound)?;
    let v = &physics.velocity;
    writeln!(out, "\t{:<10} {:>12.3} {:>12.3}", "velocity", v.x, v.y)?;
    let c = &physics.ptx_color;
    writeln!(
        out,
        "\t{:<10} {:>12.3} {:>12.3} {:>12.3}",
        "ptxcolor", c.r, c.g, c.b
    )?;
    writeln!(out, "}}")
}

fn write_patch(out: &mut impl Write, patch: &PatchRecord, names: PatchNames<'_>) -> fmt::Result {
    let header = &patch.header;
    writeln!(out, "patch {{")?;
    writeln!(out, "\t# unknown: {}", header.reserved)?;
    writeln!(out, "\t{:<8} {} {}", "res", header.resolution, header.stride)?;
    writeln!(out, "\t{:<8} 50", "priority")?;
    writeln!(out, "\t{:<8} 1 1", "map")?;
    writeln!(out, "\t{:<8} {:.6} {:.6}", "tile", 1.0, 1.0)?;
    for (key, name) in [
        ("material", names.material),
        ("texture", names.texture),
        ("physics", names.physics),
    ] {
        if let Some(name) = name {
            writeln!(out, "\t{key:<8} {name}")?;
        }
    }

    let user_props = patch.user_data_text();
    if !user_props.is_empty() {
        writeln!(out, "\tuserprops \"{user_props}\"")?;
    }
    let flags = patch.flag_names().map(|f| format!("{f} ")).join("");
    writeln!(out, "\tflags {{ {flags}}}")?;

    let vertices = &patch.vertices;
    let indices = vertices.iter().map(|v| format!("{} ", v.vertex_index)).join("");
    writeln!(out, "\tvx\t{indices}")?;
    let smap = vertices.iter().map(|v| format!("{:9.6} ", v.s)).join("");
    writeln!(out, "\tsmap\n\t\t{smap}")?;
    let tmap = vertices.iter().map(|v| format!("{:9.6} ", v.t)).join("");
    writeln!(out, "\ttmap\n\t\t{tmap}")?;
    writeln!(out, "\tnormals {{")?;
    for v in vertices {
        let n = &v.normal;
        writeln!(out, "\t\t{:9.6} {:9.6} {:9.6}", n.x, n.y, n.z)?;
    }
    writeln!(out, "\t}}")?;
    writeln!(out, "}}")
}

fn index_rows(indices: &[i16]) -> String {
    indices
        .chunks(GROUP_INDICES_PER_LINE)
        .map(|row| row.iter().map(|i| format!("{i:7}")).join(""))
        .join("\n\t")
}

fn write_group(out: &mut impl Write, group: &GroupRecord) -> fmt::Result {
    writeln!(out, "group {} {{", group.name)?;
    if !group.vertex_indices.is_empty() {
        writeln!(out, "\tvx\n\t{}", index_rows(&group.vertex_indices))?;
    }
    if !group.patch_indices.is_empty() {
        writeln!(out, "\tpatch\n\t{}", index_rows(&group.patch_indices))?;
    }
    writeln!(out, "}}")
}

/// Dump a whole scene. `file_name` only appears in the header comment.
pub fn scene_log(doc: &SceneDocument, file_name: &str) -> Result<String, ExportError> {
    let mut out = String::new();
    writeln!(out, "# ARTS7 {file_name}")?;
    for (label, count) in [
        ("Vertices", doc.vertices.len()),
        ("Patches", doc.patches.len()),
        ("Groups", doc.groups.len()),
        ("Materials", doc.materials.len()),
        ("Textures", doc.textures.len()),
        ("Physics", doc.physics.len()),
    ] {
        writeln!(out, "# {label:<14} {count}")?;
    }
    writeln!(out)?;

    let libraries = doc
        .materials
        .iter()
        .map(RecordRef::Material)
        .chain(doc.textures.iter().map(RecordRef::Texture))
        .chain(doc.physics.iter().map(RecordRef::Physics));
    for record in libraries {
        write_record(&mut out, record)?;
        writeln!(out)?;
    }

    for v in &doc.vertices {
        writeln!(out, "vx {:12.6} {:12.6} {:12.6}", v.x, v.y, v.z)?;
    }
    writeln!(out)?;

    for patch in &doc.patches {
        let names = PatchNames::resolve(doc, patch)?;
        write_record(&mut out, RecordRef::Patch(patch, names))?;
        writeln!(out)?;
    }
    for group in &doc.groups {
        write_record(&mut out, RecordRef::Group(group))?;
        writeln!(out)?;
    }

    writeln!(out, "# EOF")?;
    Ok(out)
}

/// Dump a library catalog.
pub fn catalog_log(catalog: &Catalog) -> Result<String, ExportError> {
    let kind = catalog.kind();
    let mut out = String::new();
    writeln!(out, "# {}", kind.library_name())?;
    writeln!(out, "# {:<12} {}", kind.entries_name(), catalog.len())?;
    writeln!(out)?;

    let records: Vec<RecordRef<'_>> = match catalog {
        Catalog::Materials(records) => records.iter().map(RecordRef::Material).collect(),
        Catalog::Textures(records) => records.iter().map(RecordRef::Texture).collect(),
        Catalog::Physics(records) => records.iter().map(RecordRef::Physics).collect(),
    };
    for record in records {
        write_record(&mut out, record)?;
        writeln!(out)?;
    }
    Ok(out)
}
