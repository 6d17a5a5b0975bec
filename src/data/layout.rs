//! Declarative field layouts for fixed-size records.
//!
//! A record describes its fields exactly once, in file order, through
//! [`FixedRecord::visit_fields`]. Decoding, encoding, listing the layout and
//! computing the encoded size are all [`FieldVisitor`]s over that one
//! description, so a record's load and save paths cannot disagree.

use crate::data::cursor::BinaryCursor;
use crate::error::DlpResult;
use crate::models::types::{ColorRGB, ColorRGBA, Vector2, Vector3};

/// Width and interpretation of one encoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    I16,
    I32,
    F32,
    /// NUL-padded text in a field of the given width.
    FixedString(usize),
    /// Alignment bytes, written as zero and ignored on read.
    Padding(usize),
}

impl FieldKind {
    pub fn width(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::I16 => 2,
            FieldKind::I32 | FieldKind::F32 => 4,
            FieldKind::FixedString(n) | FieldKind::Padding(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

pub trait FieldVisitor {
    fn u8(&mut self, name: &'static str, value: &mut u8) -> DlpResult<()>;
    fn i16(&mut self, name: &'static str, value: &mut i16) -> DlpResult<()>;
    fn i32(&mut self, name: &'static str, value: &mut i32) -> DlpResult<()>;
    fn f32(&mut self, name: &'static str, value: &mut f32) -> DlpResult<()>;
    fn fixed_string(&mut self, name: &'static str, value: &mut String, width: usize)
    -> DlpResult<()>;
    fn padding(&mut self, width: usize) -> DlpResult<()>;

    fn vec2(&mut self, name: &'static str, value: &mut Vector2) -> DlpResult<()> {
        self.f32(name, &mut value.x)?;
        self.f32(name, &mut value.y)
    }

    fn vec3(&mut self, name: &'static str, value: &mut Vector3) -> DlpResult<()> {
        self.f32(name, &mut value.x)?;
        self.f32(name, &mut value.y)?;
        self.f32(name, &mut value.z)
    }

    fn rgb(&mut self, name: &'static str, value: &mut ColorRGB) -> DlpResult<()> {
        self.f32(name, &mut value.r)?;
        self.f32(name, &mut value.g)?;
        self.f32(name, &mut value.b)
    }

    fn rgba(&mut self, name: &'static str, value: &mut ColorRGBA) -> DlpResult<()> {
        self.f32(name, &mut value.r)?;
        self.f32(name, &mut value.g)?;
        self.f32(name, &mut value.b)?;
        self.f32(name, &mut value.a)
    }
}

/// A record whose encoding is a fixed sequence of fields.
pub trait FixedRecord: Default + Clone {
    fn visit_fields<V: FieldVisitor>(&mut self, visitor: &mut V) -> DlpResult<()>;

    fn load(cursor: &mut BinaryCursor) -> DlpResult<Self> {
        let mut record = Self::default();
        record.visit_fields(&mut FieldReader { cursor })?;
        Ok(record)
    }

    fn save(&self, cursor: &mut BinaryCursor) -> DlpResult<()> {
        // Visiting needs `&mut`; encoding must not touch the caller's record.
        self.clone().visit_fields(&mut FieldWriter { cursor })
    }

    /// The record's fields in file order.
    fn layout() -> Vec<Field> {
        let mut collector = LayoutCollector::default();
        // The collector never fails.
        let _ = Self::default().visit_fields(&mut collector);
        collector.fields
    }

    /// Encoded size in bytes.
    fn encoded_len() -> usize {
        Self::layout().iter().map(|field| field.kind.width()).sum()
    }
}

struct FieldReader<'a> {
    cursor: &'a mut BinaryCursor,
}

impl FieldVisitor for FieldReader<'_> {
    fn u8(&mut self, _name: &'static str, value: &mut u8) -> DlpResult<()> {
        *value = self.cursor.read_u8()?;
        Ok(())
    }

    fn i16(&mut self, _name: &'static str, value: &mut i16) -> DlpResult<()> {
        *value = self.cursor.read_i16()?;
        Ok(())
    }

    fn i32(&mut self, _name: &'static str, value: &mut i32) -> DlpResult<()> {
        *value = self.cursor.read_i32()?;
        Ok(())
    }

    fn f32(&mut self, _name: &'static str, value: &mut f32) -> DlpResult<()> {
        *value = self.cursor.read_f32()?;
        Ok(())
    }

    fn fixed_string(
        &mut self,
        _name: &'static str,
        value: &mut String,
        width: usize,
    ) -> DlpResult<()> {
        *value = self.cursor.read_fixed_string(width)?;
        Ok(())
    }

    fn padding(&mut self, width: usize) -> DlpResult<()> {
        self.cursor.read_bytes(width)?;
        Ok(())
    }
}

struct FieldWriter<'a> {
    cursor: &'a mut BinaryCursor,
}

impl FieldVisitor for FieldWriter<'_> {
    fn u8(&mut self, _name: &'static str, value: &mut u8) -> DlpResult<()> {
        self.cursor.write_u8(*value)
    }

    fn i16(&mut self, _name: &'static str, value: &mut i16) -> DlpResult<()> {
        self.cursor.write_i16(*value)
    }

    fn i32(&mut self, _name: &'static str, value: &mut i32) -> DlpResult<()> {
        self.cursor.write_i32(*value)
    }

    fn f32(&mut self, _name: &'static str, value: &mut f32) -> DlpResult<()> {
        self.cursor.write_f32(*value)
    }

    fn fixed_string(&mut self, name: &'static str, value: &mut String, width: usize) -> DlpResult<()> {
        self.cursor.write_fixed_string(name, value.as_str(), width)
    }

    fn padding(&mut self, width: usize) -> DlpResult<()> {
        self.cursor.write_bytes(&vec![0u8; width])
    }
}

#[derive(Default)]
struct LayoutCollector {
    fields: Vec<Field>,
}

impl LayoutCollector {
    fn push(&mut self, name: &'static str, kind: FieldKind) -> DlpResult<()> {
        self.fields.push(Field { name, kind });
        Ok(())
    }
}

impl FieldVisitor for LayoutCollector {
    fn u8(&mut self, name: &'static str, _value: &mut u8) -> DlpResult<()> {
        self.push(name, FieldKind::U8)
    }

    fn i16(&mut self, name: &'static str, _value: &mut i16) -> DlpResult<()> {
        self.push(name, FieldKind::I16)
    }

    fn i32(&mut self, name: &'static str, _value: &mut i32) -> DlpResult<()> {
        self.push(name, FieldKind::I32)
    }

    fn f32(&mut self, name: &'static str, _value: &mut f32) -> DlpResult<()> {
        self.push(name, FieldKind::F32)
    }

    fn fixed_string(&mut self, name: &'static str, _value: &mut String, width: usize) -> DlpResult<()> {
        self.push(name, FieldKind::FixedString(width))
    }

    fn padding(&mut self, width: usize) -> DlpResult<()> {
        self.push("padding", FieldKind::Padding(width))
    }
}
