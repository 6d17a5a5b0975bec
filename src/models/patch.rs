//! Patch (polygon) and patch vertex records.

use crate::data::cursor::BinaryCursor;
use crate::data::layout::{FieldVisitor, FixedRecord};
use crate::error::{DlpError, DlpResult, Section};
use crate::models::types::Vector3;

/// Render flag bits stored in [`PatchHeader::flags`], with their log names.
pub mod patch_flags {
    pub const CPV: i16 = 1 << 0;
    pub const EMISSION: i16 = 1 << 1;
    pub const SHADE: i16 = 1 << 2;
    pub const SOLID: i16 = 1 << 3;
    pub const CULL: i16 = 1 << 4;
    pub const ZWRITE: i16 = 1 << 5;
    pub const ZREAD: i16 = 1 << 6;
    pub const SHADOW: i16 = 1 << 7;
    pub const FLAT: i16 = 1 << 8;
    pub const ANTIALIAS: i16 = 1 << 9;
    pub const INTERPENETRATE: i16 = 1 << 10;

    /// Flags in the order the log writer prints them.
    pub const NAMES: &[(i16, &str)] = &[
        (CPV, "cpv"),
        (EMISSION, "emission"),
        (SHADE, "shade"),
        (SOLID, "solid"),
        (CULL, "cull"),
        (ZREAD, "zread"),
        (ZWRITE, "zwrite"),
        (FLAT, "flat"),
        (ANTIALIAS, "antialias"),
        (INTERPENETRATE, "interpenetrate"),
        (SHADOW, "shadow"),
    ];
}

/// One vertex slot of a patch.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexRecord {
    /// Zero-based index into the document's vertex positions.
    pub vertex_index: i16,
    pub normal: Vector3,
    pub s: f32,
    pub t: f32,
    /// Packed vertex color.
    pub color: i32,
}

impl FixedRecord for VertexRecord {
    fn visit_fields<V: FieldVisitor>(&mut self, visitor: &mut V) -> DlpResult<()> {
        visitor.i16("vx", &mut self.vertex_index)?;
        visitor.vec3("normal", &mut self.normal)?;
        visitor.f32("smap", &mut self.s)?;
        visitor.f32("tmap", &mut self.t)?;
        visitor.i32("color", &mut self.color)
    }
}

/// The fixed-width fields that precede a patch's vertices.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PatchHeader {
    pub resolution: i16,
    pub stride: i16,
    pub reserved: i16,
    pub flags: i16,
    /// 1-based material id, 0 for none.
    pub material_id: i16,
    /// 1-based texture id, 0 for none.
    pub texture_id: i16,
    /// 1-based physics id, 0 for none.
    pub physics_id: i16,
}

impl FixedRecord for PatchHeader {
    fn visit_fields<V: FieldVisitor>(&mut self, visitor: &mut V) -> DlpResult<()> {
        visitor.i16("resolution", &mut self.resolution)?;
        visitor.i16("stride", &mut self.stride)?;
        visitor.i16("reserved", &mut self.reserved)?;
        visitor.i16("flags", &mut self.flags)?;
        visitor.i16("material", &mut self.material_id)?;
        visitor.i16("texture", &mut self.texture_id)?;
        visitor.i16("physics", &mut self.physics_id)
    }
}

impl PatchHeader {
    /// Number of vertex records that follow the header: `resolution * stride`.
    /// A negative product fails with [`DlpError::InvalidCount`].
    pub fn vertex_count(&self) -> DlpResult<usize> {
        let count = i32::from(self.resolution) * i32::from(self.stride);
        usize::try_from(count).map_err(|_| DlpError::InvalidCount {
            section: Section::Record,
            count,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PatchRecord {
    pub header: PatchHeader,
    /// Exactly `resolution * stride` entries.
    pub vertices: Vec<VertexRecord>,
    /// Raw user property bytes. May contain NULs.
    pub user_data: Vec<u8>,
}

impl PatchRecord {
    pub fn load(cursor: &mut BinaryCursor) -> DlpResult<Self> {
        let header = PatchHeader::load(cursor)?;
        let vertices = cursor.read_array(header.vertex_count()?, VertexRecord::load)?;
        let user_data = cursor.read_length_prefixed()?;
        Ok(Self {
            header,
            vertices,
            user_data,
        })
    }

    pub fn save(&self, cursor: &mut BinaryCursor) -> DlpResult<()> {
        self.check_vertex_count()?;
        self.header.save(cursor)?;
        cursor.write_array(&self.vertices, |c, vertex| vertex.save(c))?;
        cursor.write_length_prefixed("userprops", &self.user_data)
    }

    /// Fails unless the patch holds exactly `resolution * stride` vertices.
    pub fn check_vertex_count(&self) -> DlpResult<()> {
        let expected = self.header.vertex_count()?;
        if self.vertices.len() != expected {
            return Err(DlpError::VertexCountMismatch {
                expected,
                actual: self.vertices.len(),
            });
        }
        Ok(())
    }

    /// Only single-row triangles and quads map onto output polygons.
    pub fn is_exportable(&self) -> bool {
        self.header.stride == 1 && (3..=4).contains(&self.header.resolution)
    }

    /// User properties as text, up to the first NUL.
    pub fn user_data_text(&self) -> String {
        crate::data::parser_utils::decode_c_string(&self.user_data)
    }

    /// Log names of the set render flags.
    pub fn flag_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        patch_flags::NAMES
            .iter()
            .filter(|(mask, _)| self.header.flags & mask != 0)
            .map(|(_, name)| *name)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn vertex(index: i16, s: f32, t: f32) -> VertexRecord {
        VertexRecord {
            vertex_index: index,
            normal: Vector3::new(0.0, 1.0, 0.0),
            s,
            t,
            color: -1,
        }
    }

    fn sample_patch() -> PatchRecord {
        PatchRecord {
            header: PatchHeader {
                resolution: 4,
                stride: 1,
                reserved: 0,
                flags: patch_flags::SHADE | patch_flags::SOLID,
                material_id: 1,
                texture_id: 2,
                physics_id: 0,
            },
            vertices: (0..4).map(|i| vertex(i, 0.0, 1.0)).collect(),
            user_data: b"lod=1".to_vec(),
        }
    }

    #[test]
    fn vertex_record_is_26_bytes() {
        assert_eq!(VertexRecord::encoded_len(), 26);
        assert_eq!(PatchHeader::encoded_len(), 14);
    }

    #[test]
    fn patch_round_trip() {
        let patch = sample_patch();
        let mut cursor = BinaryCursor::new();
        patch.save(&mut cursor).unwrap();
        assert_eq!(cursor.len(), 14 + 4 * 26 + 4 + 5);

        let bytes = cursor.into_bytes();
        let mut cursor = BinaryCursor::from_bytes(bytes.clone());
        let decoded = PatchRecord::load(&mut cursor).unwrap();
        assert_eq!(decoded, patch);
        assert_eq!(decoded.vertices.len(), decoded.header.vertex_count().unwrap());

        let mut again = BinaryCursor::new();
        decoded.save(&mut again).unwrap();
        assert_eq!(again.into_bytes(), bytes);
    }

    #[test]
    fn save_rejects_inconsistent_vertex_count() {
        let mut patch = sample_patch();
        patch.header.stride = 2;
        let mut cursor = BinaryCursor::new();
        assert!(matches!(
            patch.save(&mut cursor),
            Err(DlpError::VertexCountMismatch {
                expected: 8,
                actual: 4
            })
        ));
        assert!(cursor.is_empty());
    }

    #[test]
    fn negative_vertex_count_is_rejected() {
        let mut cursor = BinaryCursor::new();
        for value in [-2i16, 3, 0, 0, 0, 0, 0] {
            cursor.write_i16(value).unwrap();
        }
        cursor.write_length_prefixed("userprops", b"").unwrap();

        let mut cursor = BinaryCursor::from_bytes(cursor.into_bytes());
        assert!(matches!(
            PatchRecord::load(&mut cursor),
            Err(DlpError::InvalidCount { count: -6, .. })
        ));

        let patch = PatchRecord {
            header: PatchHeader {
                resolution: 3,
                stride: -1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            patch.save(&mut BinaryCursor::new()),
            Err(DlpError::InvalidCount { count: -3, .. })
        ));
    }

    #[test]
    fn eligibility() {
        let mut patch = sample_patch();
        assert!(patch.is_exportable());
        patch.header.resolution = 3;
        assert!(patch.is_exportable());
        patch.header.resolution = 5;
        assert!(!patch.is_exportable());
        patch.header.resolution = 4;
        patch.header.stride = 2;
        assert!(!patch.is_exportable());
    }

    #[test]
    fn flags_print_in_log_order() {
        let mut patch = sample_patch();
        patch.header.flags = patch_flags::SHADOW | patch_flags::ZWRITE | patch_flags::ZREAD;
        let names: Vec<_> = patch.flag_names().collect();
        assert_eq!(names, ["zread", "zwrite", "shadow"]);
    }

    proptest! {
        #[test]
        fn decoded_patch_holds_resolution_times_stride_vertices(
            resolution in 0i16..6,
            stride in 0i16..4,
            user in prop::collection::vec(any::<u8>(), 0..16),
        ) {
            let count = (resolution * stride) as usize;
            let mut cursor = BinaryCursor::new();
            for value in [resolution, stride, 0, 0, 0, 0, 0] {
                cursor.write_i16(value).unwrap();
            }
            for i in 0..count {
                vertex(i as i16, 0.5, 0.25).save(&mut cursor).unwrap();
            }
            cursor.write_length_prefixed("userprops", &user).unwrap();
            let bytes = cursor.into_bytes();

            let mut cursor = BinaryCursor::from_bytes(bytes.clone());
            let patch = PatchRecord::load(&mut cursor).unwrap();
            prop_assert_eq!(patch.vertices.len(), count);
            prop_assert_eq!(&patch.user_data, &user);

            let mut again = BinaryCursor::new();
            patch.save(&mut again).unwrap();
            prop_assert_eq!(again.into_bytes(), bytes);
        }
    }
}
