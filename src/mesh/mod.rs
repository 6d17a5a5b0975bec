//! Indexed polygon meshes derived from a [`SceneDocument`](crate::models::scene::SceneDocument).

/// Group/patch walk producing [`Mesh`] output
pub mod extract;
/// Texture bitmap lookup
pub mod texture;

use crate::models::types::{ColorRGB, Vector2, Vector3};
use texture::ResolvedTexture;

/// 1-based indices into the owning group's position, UV and normal lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCorner {
    pub position: usize,
    pub uv: usize,
    pub normal: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshElement {
    /// Following faces use the named material.
    UseMaterial(String),
    Face(Vec<FaceCorner>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupMesh {
    pub name: String,
    /// Deduplicated by document vertex index.
    pub positions: Vec<Vector3>,
    /// One per emitted corner.
    pub normals: Vec<Vector3>,
    /// One per emitted corner.
    pub uvs: Vec<Vector2>,
    pub elements: Vec<MeshElement>,
}

impl GroupMesh {
    pub fn faces(&self) -> impl Iterator<Item = &[FaceCorner]> {
        self.elements.iter().filter_map(|element| match element {
            MeshElement::Face(corners) => Some(corners.as_slice()),
            MeshElement::UseMaterial(_) => None,
        })
    }

    pub fn face_count(&self) -> usize {
        self.faces().count()
    }

    pub fn material_changes(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|element| match element {
            MeshElement::UseMaterial(name) => Some(name.as_str()),
            MeshElement::Face(_) => None,
        })
    }
}

/// Lighting terms copied from a material library record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialColors {
    pub ambient: ColorRGB,
    pub diffuse: ColorRGB,
    pub specular: ColorRGB,
    pub shininess: f32,
}

/// One output material, keyed by its (material, texture) name pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialBlock {
    /// `material`, `texture` or `material|texture`.
    pub name: String,
    pub colors: Option<MaterialColors>,
    pub texture: Option<ResolvedTexture>,
}

impl MaterialBlock {
    pub fn is_alpha_tested(&self) -> bool {
        self.texture
            .as_ref()
            .is_some_and(ResolvedTexture::is_alpha_tested)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub groups: Vec<GroupMesh>,
    /// Document-wide, in first-use order.
    pub materials: Vec<MaterialBlock>,
}
