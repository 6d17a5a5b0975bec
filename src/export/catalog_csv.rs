//! One row per library record, colors as 0-255 integers.
//!
//! Tables can be read back into a [`Catalog`]. Color columns come back as
//! `value / 255`, so only colors that were already whole 8-bit steps survive
//! a catalog -> table -> catalog trip unchanged.

use std::fmt::Display;
use std::str::FromStr;

use crate::export::ExportError;
use crate::models::library::{Catalog, LibraryKind, MaterialRecord, PhysicsRecord, TextureRecord};
use crate::models::types::{ColorRGB, ColorRGBA, Vector2};

const MATERIAL_COLUMNS: &[&str] = &[
    "name",
    "emisR",
    "emisG",
    "emisB",
    "emisA",
    "ambR",
    "ambG",
    "ambB",
    "ambA",
    "difR",
    "difG",
    "difB",
    "difA",
    "specR",
    "specG",
    "specB",
    "specA",
    "shininess",
    "reserved",
];

const TEXTURE_COLUMNS: &[&str] = &["name", "flags", "unk1", "unk2"];

const PHYSICS_COLUMNS: &[&str] = &[
    "name",
    "friction",
    "elasticity",
    "drag",
    "bumpheight",
    "bumpwidth",
    "sinkdepth",
    "ptxrate",
    "type",
    "sound",
    "velX",
    "velY",
    "ptxcolorR",
    "ptxcolorG",
    "ptxcolorB",
];

fn material_row(m: &MaterialRecord) -> Vec<String> {
    let mut row = vec![m.name.clone()];
    for color in [&m.emission, &m.ambient, &m.diffuse, &m.specular] {
        row.extend(color.to_u8().iter().map(u8::to_string));
    }
    row.push(m.shininess.to_string());
    row.push(m.reserved.to_string());
    row
}

fn texture_row(t: &TextureRecord) -> Vec<String> {
    vec![
        t.name.clone(),
        t.flags.to_string(),
        t.unknown1.to_string(),
        t.unknown2.to_string(),
    ]
}

fn physics_row(p: &PhysicsRecord) -> Vec<String> {
    let mut row = vec![p.name.clone()];
    row.extend(
        [
            p.friction,
            p.elasticity,
            p.drag,
            p.bump_height,
            p.bump_width,
            p.sink_depth,
            p.ptx_rate,
        ]
        .iter()
        .map(f32::to_string),
    );
    row.push(p.kind.to_string());
    row.push(p.sound.to_string());
    row.push(p.velocity.x.to_string());
    row.push(p.velocity.y.to_string());
    row.extend(p.ptx_color.to_u8().iter().map(u8::to_string));
    row
}

pub fn columns(catalog: &Catalog) -> &'static [&'static str] {
    match catalog {
        Catalog::Materials(_) => MATERIAL_COLUMNS,
        Catalog::Textures(_) => TEXTURE_COLUMNS,
        Catalog::Physics(_) => PHYSICS_COLUMNS,
    }
}

/// Render the catalog as CSV with a header row.
pub fn write_catalog_csv(catalog: &Catalog) -> Result<String, ExportError> {
    let rows: Vec<Vec<String>> = match catalog {
        Catalog::Materials(records) => records.iter().map(material_row).collect(),
        Catalog::Textures(records) => records.iter().map(texture_row).collect(),
        Catalog::Physics(records) => records.iter().map(physics_row).collect(),
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns(catalog))
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    for row in &rows {
        writer
            .write_record(row)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))
}

fn csv_error(e: csv::Error) -> ExportError {
    ExportError::Csv(e.to_string())
}

/// One data row, with fields looked up by column name.
struct Row<'a> {
    headers: &'a csv::StringRecord,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn line(&self) -> u64 {
        self.record.position().map_or(0, |pos| pos.line())
    }

    fn text(&self, column: &str) -> Result<&str, ExportError> {
        self.headers
            .iter()
            .position(|header| header == column)
            .and_then(|index| self.record.get(index))
            .ok_or_else(|| {
                ExportError::Csv(format!("line {}: missing column `{column}`", self.line()))
            })
    }

    fn parse<T>(&self, column: &str) -> Result<T, ExportError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let text = self.text(column)?;
        text.trim().parse().map_err(|e| {
            ExportError::Csv(format!(
                "line {}: bad value `{text}` in column `{column}`: {e}",
                self.line()
            ))
        })
    }

    /// An 8-bit color column as a float channel.
    fn channel(&self, column: &str) -> Result<f32, ExportError> {
        Ok(self.parse::<i32>(column)? as f32 / 255.0)
    }

    fn rgb(&self, prefix: &str) -> Result<ColorRGB, ExportError> {
        Ok(ColorRGB {
            r: self.channel(&format!("{prefix}R"))?,
            g: self.channel(&format!("{prefix}G"))?,
            b: self.channel(&format!("{prefix}B"))?,
        })
    }

    fn rgba(&self, prefix: &str) -> Result<ColorRGBA, ExportError> {
        let rgb = self.rgb(prefix)?;
        Ok(ColorRGBA {
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
            a: self.channel(&format!("{prefix}A"))?,
        })
    }
}

fn material_from_row(row: &Row<'_>) -> Result<MaterialRecord, ExportError> {
    Ok(MaterialRecord {
        name: row.text("name")?.to_string(),
        emission: row.rgba("emis")?,
        ambient: row.rgba("amb")?,
        diffuse: row.rgba("dif")?,
        specular: row.rgba("spec")?,
        shininess: row.parse("shininess")?,
        reserved: row.parse("reserved")?,
    })
}

fn texture_from_row(row: &Row<'_>) -> Result<TextureRecord, ExportError> {
    Ok(TextureRecord {
        name: row.text("name")?.to_string(),
        flags: row.parse("flags")?,
        unknown1: row.parse("unk1")?,
        unknown2: row.parse("unk2")?,
    })
}

fn physics_from_row(row: &Row<'_>) -> Result<PhysicsRecord, ExportError> {
    Ok(PhysicsRecord {
        name: row.text("name")?.to_string(),
        friction: row.parse("friction")?,
        elasticity: row.parse("elasticity")?,
        drag: row.parse("drag")?,
        bump_height: row.parse("bumpheight")?,
        bump_width: row.parse("bumpwidth")?,
        sink_depth: row.parse("sinkdepth")?,
        ptx_rate: row.parse("ptxrate")?,
        kind: row.parse("type")?,
        sound: row.parse("sound")?,
        velocity: Vector2 {
            x: row.parse("velX")?,
            y: row.parse("velY")?,
        },
        ptx_color: row.rgb("ptxcolor")?,
    })
}

fn read_rows<T>(
    text: &str,
    mut from_row: impl FnMut(&Row<'_>) -> Result<T, ExportError>,
) -> Result<Vec<T>, ExportError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers().map_err(csv_error)?.clone();
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        records.push(from_row(&Row {
            headers: &headers,
            record: &record,
        })?);
    }
    Ok(records)
}

/// Parse a table written by [`write_catalog_csv`] (or edited by hand) back
/// into a catalog. Columns are matched by name, so their order is free.
pub fn read_catalog_csv(kind: LibraryKind, text: &str) -> Result<Catalog, ExportError> {
    let catalog = match kind {
        LibraryKind::Material => Catalog::Materials(read_rows(text, material_from_row)?),
        LibraryKind::Texture => Catalog::Textures(read_rows(text, texture_from_row)?),
        LibraryKind::Physics => Catalog::Physics(read_rows(text, physics_from_row)?),
    };
    tracing::debug!("{kind} table: {} rows", catalog.len());
    Ok(catalog)
}
