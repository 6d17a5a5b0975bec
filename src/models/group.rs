use crate::data::cursor::BinaryCursor;
use crate::data::parser_utils::encode_c_string;
use crate::error::{DlpError, DlpResult};

/// Longest name (excluding the terminating NUL) a one-byte length prefix allows.
pub const MAX_GROUP_NAME_LEN: usize = u8::MAX as usize - 1;

/// A named set of vertex and patch indices, exported as one mesh object.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GroupRecord {
    pub name: String,
    /// Indices into the document's vertex positions.
    pub vertex_indices: Vec<i16>,
    /// Indices into the document's patches.
    pub patch_indices: Vec<i16>,
}

impl GroupRecord {
    /// Layout: `u8 len`, `len` name bytes (NUL-terminated), `i32` vertex count,
    /// `i32` patch count, the vertex indices, then the patch indices.
    pub fn load(cursor: &mut BinaryCursor) -> DlpResult<Self> {
        let name_len = cursor.read_u8()? as usize;
        let name = cursor.read_fixed_string(name_len)?;
        let vertex_count = cursor.read_count()?;
        let patch_count = cursor.read_count()?;
        let vertex_indices = cursor.read_array(vertex_count, BinaryCursor::read_i16)?;
        let patch_indices = cursor.read_array(patch_count, BinaryCursor::read_i16)?;
        Ok(Self {
            name,
            vertex_indices,
            patch_indices,
        })
    }

    pub fn save(&self, cursor: &mut BinaryCursor) -> DlpResult<()> {
        let name = encode_c_string("group name", &self.name)?;
        if name.len() > MAX_GROUP_NAME_LEN {
            return Err(DlpError::FieldTooLong {
                field: "group name",
                len: name.len(),
                capacity: MAX_GROUP_NAME_LEN + 1,
            });
        }
        cursor.write_u8(name.len() as u8 + 1)?;
        cursor.write_bytes(&name)?;
        cursor.write_u8(0)?;
        cursor.write_count("vertex count", self.vertex_indices.len())?;
        cursor.write_count("patch count", self.patch_indices.len())?;
        cursor.write_array(&self.vertex_indices, |c, &index| c.write_i16(index))?;
        cursor.write_array(&self.patch_indices, |c, &index| c.write_i16(index))
    }
}
