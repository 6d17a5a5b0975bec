//! Wavefront OBJ + MTL text for an extracted [`Mesh`].
//!
//! Group-local indices are shifted by the number of positions and corners
//! written for earlier groups so the file indexes globally.

use std::fmt::Write;

use itertools::Itertools;

use crate::export::ExportError;
use crate::mesh::{Mesh, MeshElement};
use crate::models::types::ColorRGB;

/// The OBJ text. `mtl_file` is referenced from the `mtllib` line.
pub fn write_obj(mesh: &Mesh, mtl_file: &str) -> Result<String, ExportError> {
    let mut out = String::new();
    writeln!(out, "# dlpunpack OBJ export")?;
    writeln!(
        out,
        "# {} groups, {} materials",
        mesh.groups.len(),
        mesh.materials.len()
    )?;
    writeln!(out, "mtllib {mtl_file}")?;

    let mut position_base = 0;
    let mut corner_base = 0;
    for group in &mesh.groups {
        if group.face_count() == 0 {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "o {}", group.name)?;
        writeln!(out, "g {}", group.name)?;
        for v in &group.positions {
            writeln!(out, "v {:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
        }
        for n in &group.normals {
            writeln!(out, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
        }
        for uv in &group.uvs {
            writeln!(out, "vt {:.6} {:.6}", uv.x, uv.y)?;
        }
        for element in &group.elements {
            match element {
                MeshElement::UseMaterial(name) => writeln!(out, "usemtl {name}")?,
                MeshElement::Face(corners) => {
                    let corners = corners.iter().format_with(" ", |c, f| {
                        f(&format_args!(
                            "{}/{}/{}",
                            c.position + position_base,
                            c.uv + corner_base,
                            c.normal + corner_base
                        ))
                    });
                    writeln!(out, "f {corners}")?;
                }
            }
        }
        position_base += group.positions.len();
        corner_base += group.uvs.len();
    }
    Ok(out)
}

fn write_color(out: &mut String, key: &str, color: &ColorRGB) -> std::fmt::Result {
    writeln!(out, "{key} {:.4} {:.4} {:.4}", color.r, color.g, color.b)
}

/// The MTL text, one `newmtl` block per material in first-use order.
pub fn write_mtl(mesh: &Mesh) -> Result<String, ExportError> {
    let mut out = String::new();
    writeln!(out, "# dlpunpack MTL export")?;
    writeln!(out, "# {} materials", mesh.materials.len())?;

    for material in &mesh.materials {
        writeln!(out)?;
        writeln!(out, "newmtl {}", material.name)?;
        if let Some(colors) = &material.colors {
            write_color(&mut out, "Ka", &colors.ambient)?;
            write_color(&mut out, "Kd", &colors.diffuse)?;
            write_color(&mut out, "Ks", &colors.specular)?;
            writeln!(out, "Ns {:.4}", colors.shininess)?;
        }
        // Alpha-tested materials take their opacity from the bitmap instead.
        if !material.is_alpha_tested() {
            writeln!(out, "d {:.4}", 1.0)?;
        }
        writeln!(out, "illum 2")?;
        if let Some(texture) = &material.texture {
            writeln!(out, "map_Ka {}", texture.path)?;
            writeln!(out, "map_Kd {}", texture.path)?;
            writeln!(out, "map_Ks {}", texture.path)?;
            if texture.is_alpha_tested() {
                writeln!(out, "map_d {}", texture.path)?;
            }
        }
    }
    Ok(out)
}
