//! Bounded field readers and writers shared by every fragment layout
//!
//! A [`FragmentReader`] only ever sees one record's payload, so running past
//! the end of a field is reported as [`Error::FragmentTruncated`] naming the
//! field rather than bleeding into the next record.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::name_table::{NameRef, NameRemap, NameTable};
use super::version::WorldFormat;
use crate::error::{Error, Result};

/// Everything a fragment decoder may consult besides its own bytes.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub format: WorldFormat,
    pub names: &'a NameTable,
    /// 1-based ordinal of the record being decoded, used in errors.
    pub ordinal: u32,
    /// Reject name slots that do not hit a name table entry.
    pub validate_names: bool,
}

impl<'a> DecodeContext<'a> {
    #[must_use]
    pub fn new(format: WorldFormat, names: &'a NameTable) -> Self {
        Self {
            format,
            names,
            ordinal: 0,
            validate_names: true,
        }
    }

    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }

    #[must_use]
    pub fn with_validate_names(mut self, validate: bool) -> Self {
        self.validate_names = validate;
        self
    }
}

/// Everything a fragment encoder may consult besides its own fields.
#[derive(Debug, Clone, Copy)]
pub struct EncodeContext<'a> {
    pub format: WorldFormat,
    pub names: &'a NameRemap,
}

impl<'a> EncodeContext<'a> {
    #[must_use]
    pub fn new(format: WorldFormat, names: &'a NameRemap) -> Self {
        Self { format, names }
    }
}

/// Little-endian reader over a single fragment payload.
pub struct FragmentReader<'a> {
    cursor: Cursor<&'a [u8]>,
    type_code: u32,
    ordinal: u32,
    format: WorldFormat,
    names: &'a NameTable,
    validate_names: bool,
}

impl<'a> FragmentReader<'a> {
    pub fn new(payload: &'a [u8], type_code: u32, ctx: &DecodeContext<'a>) -> Self {
        Self {
            cursor: Cursor::new(payload),
            type_code,
            ordinal: ctx.ordinal,
            format: ctx.format,
            names: ctx.names,
            validate_names: ctx.validate_names,
        }
    }

    fn truncated(&self, field: &'static str) -> Error {
        Error::FragmentTruncated {
            ordinal: self.ordinal,
            type_code: self.type_code,
            field,
        }
    }

    #[must_use]
    pub fn format(&self) -> WorldFormat {
        self.format
    }

    #[must_use]
    pub fn type_code(&self) -> u32 {
        self.type_code
    }

    /// Bytes left in the payload.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len();
        len.saturating_sub(self.cursor.position() as usize)
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| self.truncated(field))
    }

    pub fn i8(&mut self, field: &'static str) -> Result<i8> {
        self.cursor.read_i8().map_err(|_| self.truncated(field))
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16> {
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated(field))
    }

    pub fn i16(&mut self, field: &'static str) -> Result<i16> {
        self.cursor
            .read_i16::<LittleEndian>()
            .map_err(|_| self.truncated(field))
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated(field))
    }

    pub fn i32(&mut self, field: &'static str) -> Result<i32> {
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| self.truncated(field))
    }

    pub fn f32(&mut self, field: &'static str) -> Result<f32> {
        self.cursor
            .read_f32::<LittleEndian>()
            .map_err(|_| self.truncated(field))
    }

    pub fn vec2(&mut self, field: &'static str) -> Result<[f32; 2]> {
        Ok([self.f32(field)?, self.f32(field)?])
    }

    pub fn vec3(&mut self, field: &'static str) -> Result<[f32; 3]> {
        Ok([self.f32(field)?, self.f32(field)?, self.f32(field)?])
    }

    pub fn vec4(&mut self, field: &'static str) -> Result<[f32; 4]> {
        Ok([
            self.f32(field)?,
            self.f32(field)?,
            self.f32(field)?,
            self.f32(field)?,
        ])
    }

    pub fn bytes(&mut self, len: usize, field: &'static str) -> Result<Vec<u8>> {
        if len > self.remaining() {
            return Err(self.truncated(field));
        }
        let mut buf = vec![0u8; len];
        self.cursor
            .read_exact(&mut buf)
            .map_err(|_| self.truncated(field))?;
        Ok(buf)
    }

    /// Everything left in the payload.
    pub fn rest(&mut self) -> Vec<u8> {
        let start = (self.cursor.position() as usize).min(self.cursor.get_ref().len());
        let rest = self.cursor.get_ref()[start..].to_vec();
        self.cursor.set_position(self.cursor.get_ref().len() as u64);
        rest
    }

    /// Check that `count` elements of `element_size` bytes can still be read.
    ///
    /// Called before allocating so a corrupt count fails instead of
    /// reserving memory for data that is not there.
    pub fn count(&mut self, count: usize, element_size: usize, field: &'static str) -> Result<usize> {
        match count.checked_mul(element_size) {
            Some(needed) if needed <= self.remaining() => Ok(count),
            _ => Err(self.truncated(field)),
        }
    }

    /// Read `count` elements with `read_one`, after a bounds check.
    pub fn array<T>(
        &mut self,
        count: usize,
        element_size: usize,
        field: &'static str,
        mut read_one: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let count = self.count(count, element_size, field)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read_one(self)?);
        }
        Ok(items)
    }

    pub fn u32_array(&mut self, count: usize, field: &'static str) -> Result<Vec<u32>> {
        self.array(count, 4, field, |r| r.u32(field))
    }

    pub fn vec3_array(&mut self, count: usize, field: &'static str) -> Result<Vec<[f32; 3]>> {
        self.array(count, 12, field, |r| r.vec3(field))
    }

    /// Read a name slot.
    pub fn name_ref(&mut self, field: &'static str) -> Result<NameRef> {
        let raw = self.i32(field)?;
        self.name_from_raw(raw)
    }

    /// Interpret an already-read name slot.
    pub fn name_from_raw(&self, raw: i32) -> Result<NameRef> {
        let name = NameRef::from_raw(raw).ok_or(Error::InvalidNameRef {
            ordinal: self.ordinal,
            value: raw,
        })?;
        if self.validate_names {
            if let NameRef::Offset(offset) = name {
                if self.names.get(offset).is_none() {
                    return Err(Error::NameNotFound {
                        ordinal: self.ordinal,
                        offset,
                    });
                }
            }
        }
        Ok(name)
    }

    /// Look at a leading name slot without consuming it.
    ///
    /// Only `0` and offsets present in the name table count as names.
    #[must_use]
    pub fn peek_name_ref(&self) -> Option<NameRef> {
        let pos = self.cursor.position() as usize;
        let bytes = self.cursor.get_ref().get(pos..pos + 4)?;
        let raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        match NameRef::from_raw(raw)? {
            NameRef::None => Some(NameRef::None),
            NameRef::Offset(offset) => self.names.get(offset).map(|_| NameRef::Offset(offset)),
        }
    }

    /// Read a `u32`-length-prefixed plain string.
    pub fn string_u32(&mut self, field: &'static str) -> Result<String> {
        let len = self.u32(field)? as usize;
        let raw = self.bytes(len, field)?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

/// Little-endian writer producing a single fragment payload.
pub struct FragmentWriter<'a> {
    buf: Vec<u8>,
    type_code: u32,
    format: WorldFormat,
    names: &'a NameRemap,
}

impl<'a> FragmentWriter<'a> {
    pub fn new(type_code: u32, ctx: &EncodeContext<'a>) -> Self {
        Self {
            buf: Vec::new(),
            type_code,
            format: ctx.format,
            names: ctx.names,
        }
    }

    #[must_use]
    pub fn format(&self) -> WorldFormat {
        self.format
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u8(&mut self, value: u8) -> Result<()> {
        self.buf.write_u8(value)?;
        Ok(())
    }

    pub fn i8(&mut self, value: i8) -> Result<()> {
        self.buf.write_i8(value)?;
        Ok(())
    }

    pub fn u16(&mut self, value: u16) -> Result<()> {
        self.buf.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn i16(&mut self, value: i16) -> Result<()> {
        self.buf.write_i16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn u32(&mut self, value: u32) -> Result<()> {
        self.buf.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn i32(&mut self, value: i32) -> Result<()> {
        self.buf.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn f32(&mut self, value: f32) -> Result<()> {
        self.buf.write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn vec2(&mut self, value: [f32; 2]) -> Result<()> {
        value.iter().try_for_each(|&v| self.f32(v))
    }

    pub fn vec3(&mut self, value: [f32; 3]) -> Result<()> {
        value.iter().try_for_each(|&v| self.f32(v))
    }

    pub fn vec4(&mut self, value: [f32; 4]) -> Result<()> {
        value.iter().try_for_each(|&v| self.f32(v))
    }

    pub fn bytes(&mut self, value: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(value);
        Ok(())
    }

    pub fn u32_array(&mut self, values: &[u32]) -> Result<()> {
        values.iter().try_for_each(|&v| self.u32(v))
    }

    pub fn vec3_array(&mut self, values: &[[f32; 3]]) -> Result<()> {
        values.iter().try_for_each(|&v| self.vec3(v))
    }

    /// Write a name slot, translated into the output name table.
    pub fn name_ref(&mut self, name: NameRef) -> Result<()> {
        let raw = self.names.raw(name)?;
        self.i32(raw)
    }

    /// Write a collection length as `u32`.
    pub fn count_u32(&mut self, len: usize, field: &'static str) -> Result<()> {
        let value = u32::try_from(len).map_err(|_| self.overflow(field, len))?;
        self.u32(value)
    }

    /// Write a collection length as `u16`.
    pub fn count_u16(&mut self, len: usize, field: &'static str) -> Result<()> {
        let value = u16::try_from(len).map_err(|_| self.overflow(field, len))?;
        self.u16(value)
    }

    /// Write a `u32`-length-prefixed plain string.
    pub fn string_u32(&mut self, value: &str, field: &'static str) -> Result<()> {
        self.count_u32(value.len(), field)?;
        self.bytes(value.as_bytes())
    }

    /// Zero-fill to a multiple of four bytes.
    pub fn pad_to_4(&mut self) -> Result<()> {
        let padding = (4 - self.buf.len() % 4) % 4;
        self.buf.resize(self.buf.len() + padding, 0);
        Ok(())
    }

    /// Fetch an optional section that the flags say must be present.
    pub fn section<'v, T>(&self, value: &'v Option<T>, field: &'static str) -> Result<&'v T> {
        value.as_ref().ok_or(Error::MissingSection {
            type_code: self.type_code,
            field,
        })
    }

    /// Fail unless `found` matches the count another field declares.
    pub fn expect_len(&self, found: usize, expected: usize, field: &'static str) -> Result<()> {
        if found == expected {
            Ok(())
        } else {
            Err(Error::CountMismatch {
                type_code: self.type_code,
                field,
                expected,
                found,
            })
        }
    }

    pub fn overflow(&self, field: &'static str, value: usize) -> Error {
        Error::FieldOverflow {
            type_code: self.type_code,
            field,
            value: value as i64,
        }
    }

    /// Error for a signed value that does not fit its field.
    pub fn out_of_range(&self, field: &'static str, value: i64) -> Error {
        Error::FieldOverflow {
            type_code: self.type_code,
            field,
            value,
        }
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reports_field_on_truncation() {
        let names = NameTable::default();
        let ctx = DecodeContext::new(WorldFormat::Old, &names).with_ordinal(7);
        let payload = [1u8, 0, 0];
        let mut reader = FragmentReader::new(&payload, 0x30, &ctx);
        let err = reader.u32("flags").unwrap_err();
        assert!(matches!(
            err,
            Error::FragmentTruncated { ordinal: 7, type_code: 0x30, field: "flags" }
        ));
    }

    #[test]
    fn test_count_rejects_oversized_arrays() {
        let names = NameTable::default();
        let ctx = DecodeContext::new(WorldFormat::Old, &names);
        let payload = [0u8; 8];
        let mut reader = FragmentReader::new(&payload, 0x31, &ctx);
        assert!(reader.u32_array(2, "material_refs").is_ok());

        let mut reader = FragmentReader::new(&payload, 0x31, &ctx);
        assert!(matches!(
            reader.u32_array(3, "material_refs"),
            Err(Error::FragmentTruncated { field: "material_refs", .. })
        ));
        assert!(matches!(
            reader.count(usize::MAX, 4, "material_refs"),
            Err(Error::FragmentTruncated { .. })
        ));
    }

    #[test]
    fn test_name_slot_validation() {
        let names = NameTable::encode(["ROCK_MDF"]);
        let ctx = DecodeContext::new(WorldFormat::Old, &names);

        let payload = (-1i32).to_le_bytes();
        let mut reader = FragmentReader::new(&payload, 0x30, &ctx);
        assert_eq!(reader.name_ref("name").unwrap(), NameRef::Offset(1));

        let payload = (-3i32).to_le_bytes();
        let mut reader = FragmentReader::new(&payload, 0x30, &ctx);
        assert!(matches!(
            reader.name_ref("name"),
            Err(Error::NameNotFound { offset: 3, .. })
        ));

        let payload = 5i32.to_le_bytes();
        let mut reader = FragmentReader::new(&payload, 0x30, &ctx);
        assert!(matches!(
            reader.name_ref("name"),
            Err(Error::InvalidNameRef { value: 5, .. })
        ));
    }

    #[test]
    fn test_writer_pads_to_four() {
        let remap = NameRemap::identity();
        let ctx = EncodeContext::new(WorldFormat::Old, &remap);
        let mut writer = FragmentWriter::new(0x05, &ctx);
        writer.i16(3).unwrap();
        writer.u8(1).unwrap();
        writer.pad_to_4().unwrap();
        assert_eq!(writer.finish(), vec![3, 0, 1, 0]);
    }
}
