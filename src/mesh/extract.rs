use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::error::{DlpError, DlpResult};
use crate::mesh::texture::{TextureDirs, TextureProbe};
use crate::mesh::{FaceCorner, GroupMesh, MaterialBlock, MaterialColors, Mesh, MeshElement};
use crate::models::group::GroupRecord;
use crate::models::scene::SceneDocument;
use crate::models::types::Vector2;

/// Name of the output material for a (material, texture) pair. Empty when
/// neither is set.
pub fn composite_material_name(material: &str, texture: &str) -> String {
    match (material.is_empty(), texture.is_empty()) {
        (false, false) => format!("{material}|{texture}"),
        (false, true) => material.to_string(),
        (true, false) => texture.to_string(),
        (true, true) => String::new(),
    }
}

/// Converts a scene document into per-group indexed meshes.
pub struct MeshExtractor<'a, P> {
    probe: &'a P,
    dirs: TextureDirs,
}

impl<'a, P: TextureProbe> MeshExtractor<'a, P> {
    pub fn new(probe: &'a P) -> Self {
        Self {
            probe,
            dirs: TextureDirs::default(),
        }
    }

    pub fn with_dirs(mut self, dirs: TextureDirs) -> Self {
        self.dirs = dirs;
        self
    }

    pub fn convert(&self, doc: &SceneDocument) -> DlpResult<Mesh> {
        let mut state = ConvertState::default();
        let mut groups = Vec::with_capacity(doc.groups.len());
        for group in &doc.groups {
            let mesh = self.convert_group(doc, group, &mut state)?;
            debug!(
                "group {}: {} positions, {} corners, {} faces",
                mesh.name,
                mesh.positions.len(),
                mesh.normals.len(),
                mesh.face_count()
            );
            groups.push(mesh);
        }
        debug!("{} materials", state.materials.len());
        Ok(Mesh {
            groups,
            materials: state.materials,
        })
    }

    fn convert_group(
        &self,
        doc: &SceneDocument,
        group: &GroupRecord,
        state: &mut ConvertState,
    ) -> DlpResult<GroupMesh> {
        let mut mesh = GroupMesh {
            name: group.name.clone(),
            ..Default::default()
        };
        let mut local_positions: HashMap<i16, usize> = HashMap::new();
        let mut current = (0i16, 0i16);
        let mut occurrence = 0usize;

        for &patch_index in &group.patch_indices {
            let patch = doc.patch(i32::from(patch_index))?;
            patch.check_vertex_count()?;
            if !patch.is_exportable() {
                trace!(
                    "group {}: skipping patch {patch_index} (resolution {}, stride {})",
                    group.name, patch.header.resolution, patch.header.stride
                );
                continue;
            }

            let pair = (patch.header.material_id, patch.header.texture_id);
            if pair != current {
                let name = self.use_material(doc, pair, state)?;
                if name.is_empty() {
                    return Err(DlpError::MissingMaterialAssignment {
                        group: group.name.clone(),
                        patch: patch_index as usize,
                    });
                }
                mesh.elements.push(MeshElement::UseMaterial(name));
                current = pair;
            }

            // Exportable patches have stride 1, so the slots are the vertices.
            let resolution = patch.vertices.len();
            let mut corners = Vec::with_capacity(resolution);
            for (slot, vertex) in patch.vertices.iter().enumerate() {
                let position = match local_positions.get(&vertex.vertex_index) {
                    Some(&local) => local,
                    None => {
                        let position = doc.vertex(i32::from(vertex.vertex_index))?;
                        mesh.positions.push(*position);
                        let local = mesh.positions.len() - 1;
                        local_positions.insert(vertex.vertex_index, local);
                        local
                    }
                };
                mesh.normals.push(vertex.normal);
                mesh.uvs.push(Vector2 {
                    x: vertex.s,
                    y: -vertex.t - 1.0,
                });
                let emitted = occurrence + slot + 1;
                corners.push(FaceCorner {
                    position: position + 1,
                    uv: emitted,
                    normal: emitted,
                });
            }
            occurrence += resolution;
            mesh.elements.push(MeshElement::Face(corners));
        }

        Ok(mesh)
    }

    /// Resolve the material name for `pair`, adding a material block the
    /// first time the name pair is seen. Returns an empty name when the pair
    /// references neither a material nor a texture.
    fn use_material(
        &self,
        doc: &SceneDocument,
        (material_id, texture_id): (i16, i16),
        state: &mut ConvertState,
    ) -> DlpResult<String> {
        let material = doc.material(material_id)?;
        let texture = doc.texture(texture_id)?;
        let material_name = material.map_or("", |m| m.name.as_str());
        let texture_name = texture.map_or("", |t| t.name.as_str());
        let composite = composite_material_name(material_name, texture_name);
        if composite.is_empty() {
            return Ok(composite);
        }

        let key = (material_name.to_string(), texture_name.to_string());
        if let Some(name) = state.names.get(&key) {
            return Ok(name.clone());
        }

        let name = state.unique_name(composite);
        let colors = material.filter(|m| !m.name.is_empty()).map(|m| MaterialColors {
            ambient: m.ambient.rgb(),
            diffuse: m.diffuse.rgb(),
            specular: m.specular.rgb(),
            shininess: m.shininess,
        });
        let texture = (!texture_name.is_empty())
            .then(|| self.dirs.resolve(self.probe, texture_name));
        trace!("new material {name}");
        state.materials.push(MaterialBlock {
            name: name.clone(),
            colors,
            texture,
        });
        state.names.insert(key, name.clone());
        Ok(name)
    }
}

#[derive(Default)]
struct ConvertState {
    /// Output material name per (material, texture) name pair.
    names: HashMap<(String, String), String>,
    taken: HashSet<String>,
    materials: Vec<MaterialBlock>,
}

impl ConvertState {
    /// `base`, or `base#2`, `base#3`, ... when another name pair already
    /// produced the same output name (e.g. `a|b` + none vs `a` + `b`).
    fn unique_name(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}#{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::error::ReferenceKind;
    use crate::models::library::{MaterialRecord, TextureRecord};
    use crate::models::patch::{PatchHeader, PatchRecord, VertexRecord};
    use crate::models::scene::tests::{sample_document, triangle};
    use crate::models::types::{ColorRGBA, Vector3};

    fn no_textures(_: &Path) -> bool {
        false
    }

    fn convert(doc: &SceneDocument) -> DlpResult<Mesh> {
        MeshExtractor::new(&no_textures).convert(doc)
    }

    fn grid_document(patches: Vec<PatchRecord>) -> SceneDocument {
        let patch_indices = (0..patches.len() as i16).collect();
        SceneDocument {
            groups: vec![GroupRecord {
                name: "grid".to_string(),
                vertex_indices: Vec::new(),
                patch_indices,
            }],
            patches,
            vertices: (0..8).map(|i| Vector3::new(i as f32, 0.0, 0.0)).collect(),
            materials: vec![
                MaterialRecord {
                    name: "red".to_string(),
                    diffuse: ColorRGBA {
                        r: 1.0,
                        g: 0.0,
                        b: 0.0,
                        a: 1.0,
                    },
                    shininess: 8.0,
                    ..Default::default()
                },
                MaterialRecord {
                    name: "blue".to_string(),
                    ..Default::default()
                },
            ],
            textures: vec![TextureRecord {
                name: "BRICK".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn composite_names() {
        assert_eq!(composite_material_name("mat", "tex"), "mat|tex");
        assert_eq!(composite_material_name("mat", ""), "mat");
        assert_eq!(composite_material_name("", "tex"), "tex");
        assert_eq!(composite_material_name("", ""), "");
    }

    #[test]
    fn shared_positions_are_deduplicated() {
        let doc = grid_document(vec![triangle([0, 1, 2], 1, 0), triangle([2, 3, 4], 1, 0)]);
        let mesh = convert(&doc).unwrap();
        let group = &mesh.groups[0];

        assert_eq!(group.positions.len(), 5);
        assert_eq!(group.normals.len(), 6);
        assert_eq!(group.uvs.len(), 6);

        let faces: Vec<_> = group.faces().collect();
        let positions: Vec<_> = faces[1].iter().map(|c| c.position).collect();
        assert_eq!(positions, [3, 4, 5]);
        let uvs: Vec<_> = faces[1].iter().map(|c| c.uv).collect();
        assert_eq!(uvs, [4, 5, 6]);
        assert!(faces[1].iter().all(|c| c.uv == c.normal));
    }

    #[test]
    fn positions_are_local_to_each_group() {
        let mut doc = grid_document(vec![triangle([5, 6, 7], 1, 0)]);
        doc.groups.push(doc.groups[0].clone());
        doc.groups[1].name = "copy".to_string();

        let mesh = convert(&doc).unwrap();
        for group in &mesh.groups {
            assert_eq!(group.positions[0], Vector3::new(5.0, 0.0, 0.0));
            let first = group.faces().next().unwrap();
            assert_eq!(first[0].position, 1);
            assert_eq!(first[0].uv, 1);
        }
    }

    #[test]
    fn uv_t_is_flipped_and_biased() {
        let doc = grid_document(vec![triangle([0, 1, 2], 1, 0)]);
        let mesh = convert(&doc).unwrap();
        assert_eq!(mesh.groups[0].uvs[0], Vector2 { x: 0.5, y: -1.25 });
    }

    #[test]
    fn ineligible_patches_are_skipped() {
        let mut wide = triangle([0, 1, 2], 1, 0);
        wide.header.stride = 2;
        wide.vertices.extend(wide.vertices.clone());
        let pentagon = PatchRecord {
            header: PatchHeader {
                resolution: 5,
                stride: 1,
                material_id: 1,
                ..Default::default()
            },
            vertices: (0..5)
                .map(|i| VertexRecord {
                    vertex_index: i,
                    ..Default::default()
                })
                .collect(),
            user_data: Vec::new(),
        };
        let doc = grid_document(vec![wide, pentagon, triangle([3, 4, 5], 1, 0)]);
        let mesh = convert(&doc).unwrap();
        let group = &mesh.groups[0];

        assert_eq!(group.face_count(), 1);
        assert_eq!(group.positions.len(), 3);
        assert_eq!(group.positions[0], Vector3::new(3.0, 0.0, 0.0));
        let first = group.faces().next().unwrap();
        assert_eq!(first[0].uv, 1);
    }

    #[test]
    fn quads_are_exported() {
        let mut quad = triangle([0, 1, 2], 1, 0);
        quad.header.resolution = 4;
        quad.vertices.push(VertexRecord {
            vertex_index: 3,
            ..Default::default()
        });
        let doc = grid_document(vec![quad, triangle([0, 2, 3], 1, 0)]);
        let mesh = convert(&doc).unwrap();
        let faces: Vec<_> = mesh.groups[0].faces().collect();
        assert_eq!(faces[0].len(), 4);
        let uvs: Vec<_> = faces[1].iter().map(|c| c.uv).collect();
        assert_eq!(uvs, [5, 6, 7]);
    }

    #[test]
    fn consecutive_patches_share_one_material_marker() {
        let doc = grid_document(vec![
            triangle([0, 1, 2], 1, 0),
            triangle([1, 2, 3], 1, 0),
            triangle([2, 3, 4], 1, 0),
            triangle([3, 4, 5], 2, 1),
        ]);
        let mesh = convert(&doc).unwrap();
        let group = &mesh.groups[0];

        let markers: Vec<_> = group.material_changes().collect();
        assert_eq!(markers, ["red", "blue|BRICK"]);
        assert_eq!(mesh.materials.len(), 2);
        assert!(matches!(group.elements[0], MeshElement::UseMaterial(_)));
        assert!(matches!(group.elements[4], MeshElement::UseMaterial(_)));
    }

    #[test]
    fn repeated_pair_adds_marker_but_no_block() {
        let doc = grid_document(vec![
            triangle([0, 1, 2], 1, 0),
            triangle([1, 2, 3], 2, 0),
            triangle([2, 3, 4], 1, 0),
        ]);
        let mesh = convert(&doc).unwrap();
        let markers: Vec<_> = mesh.groups[0].material_changes().collect();
        assert_eq!(markers, ["red", "blue", "red"]);
        let names: Vec<_> = mesh.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["red", "blue"]);
    }

    #[test]
    fn material_blocks_carry_colors_and_texture() {
        let doc = grid_document(vec![triangle([0, 1, 2], 1, 1), triangle([0, 1, 2], 0, 1)]);
        let probe = |path: &Path| path.starts_with("TEX16A");
        let mesh = MeshExtractor::new(&probe).convert(&doc).unwrap();

        let red = &mesh.materials[0];
        assert_eq!(red.name, "red|BRICK");
        let colors = red.colors.unwrap();
        assert_eq!(colors.diffuse.r, 1.0);
        assert_eq!(colors.shininess, 8.0);
        assert!(red.is_alpha_tested());
        assert_eq!(red.texture.as_ref().unwrap().path, "TEX16A/BRICK.DDS");

        let bare = &mesh.materials[1];
        assert_eq!(bare.name, "BRICK");
        assert!(bare.colors.is_none());
    }

    #[test]
    fn custom_texture_dirs() {
        let doc = grid_document(vec![triangle([0, 1, 2], 0, 1)]);
        let probe = |path: &Path| path.starts_with("opaque");
        let mesh = MeshExtractor::new(&probe)
            .with_dirs(TextureDirs {
                opaque: "opaque".to_string(),
                alpha: "alpha".to_string(),
            })
            .convert(&doc)
            .unwrap();
        assert_eq!(
            mesh.materials[0].texture.as_ref().unwrap().path,
            "opaque/BRICK.DDS"
        );
    }

    #[test]
    fn unassigned_patch_after_assigned_one_is_fatal() {
        let doc = grid_document(vec![triangle([0, 1, 2], 1, 0), triangle([1, 2, 3], 0, 0)]);
        assert!(matches!(
            convert(&doc),
            Err(DlpError::MissingMaterialAssignment { patch: 1, .. })
        ));
    }

    #[test]
    fn leading_unassigned_patch_matches_initial_pair() {
        let doc = grid_document(vec![triangle([0, 1, 2], 0, 0)]);
        let mesh = convert(&doc).unwrap();
        assert_eq!(mesh.groups[0].face_count(), 1);
        assert_eq!(mesh.groups[0].material_changes().count(), 0);
        assert!(mesh.materials.is_empty());
    }

    #[test]
    fn bad_references_fail() {
        let doc = grid_document(vec![triangle([0, 1, 2], 3, 0)]);
        assert!(matches!(
            convert(&doc),
            Err(DlpError::InvalidReference {
                kind: ReferenceKind::Material,
                index: 3,
                ..
            })
        ));

        let doc = grid_document(vec![triangle([0, 1, 9], 1, 0)]);
        assert!(matches!(
            convert(&doc),
            Err(DlpError::InvalidReference {
                kind: ReferenceKind::Vertex,
                index: 9,
                ..
            })
        ));

        let mut doc = grid_document(vec![triangle([0, 1, 2], 1, 0)]);
        doc.groups[0].patch_indices.push(4);
        assert!(matches!(
            convert(&doc),
            Err(DlpError::InvalidReference {
                kind: ReferenceKind::Patch,
                ..
            })
        ));
    }

    #[test]
    fn colliding_output_names_get_a_suffix() {
        let mut doc = grid_document(vec![
            triangle([0, 1, 2], 1, 0),
            triangle([1, 2, 3], 2, 1),
            triangle([2, 3, 4], 1, 0),
        ]);
        doc.materials[0].name = "a|b".to_string();
        doc.materials[1].name = "a".to_string();
        doc.textures[0].name = "b".to_string();

        let mesh = convert(&doc).unwrap();
        let names: Vec<_> = mesh.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a|b", "a|b#2"]);
        let markers: Vec<_> = mesh.groups[0].material_changes().collect();
        assert_eq!(markers, ["a|b", "a|b#2", "a|b"]);
    }

    #[test]
    fn short_vertex_list_is_rejected() {
        let mut short = triangle([0, 1, 2], 1, 0);
        short.vertices.pop();
        let doc = grid_document(vec![short]);
        assert!(matches!(
            convert(&doc),
            Err(DlpError::VertexCountMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn sample_document_converts() {
        let mesh = convert(&sample_document()).unwrap();
        assert_eq!(mesh.groups.len(), 1);
        assert_eq!(mesh.groups[0].positions.len(), 4);
        let names: Vec<_> = mesh.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["paint", "paint|decal"]);
    }
}
