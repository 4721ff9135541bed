//! Name table management for WLD files
//!
//! Every fragment shares one blob of NUL-terminated strings and addresses it
//! by byte offset. On disk a name slot stores `-offset` and `0` means "no
//! name"; in memory that convention is replaced by [`NameRef`].

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

/// A reference into the name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameRef {
    /// No name.
    #[default]
    None,
    /// Byte offset of the first character of the name.
    Offset(u32),
}

impl NameRef {
    /// Interpret a stored name slot. Positive values are not name references.
    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            r if r < 0 => Some(Self::Offset(r.unsigned_abs())),
            _ => None,
        }
    }

    /// The on-disk form of this reference.
    ///
    /// # Errors
    /// `NameOffsetOverflow` when the offset exceeds `i32::MAX`.
    pub fn to_raw(self) -> Result<i32> {
        match self {
            Self::None => Ok(0),
            Self::Offset(offset) => i32::try_from(offset)
                .map(i32::wrapping_neg)
                .map_err(|_| Error::NameOffsetOverflow { offset }),
        }
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        matches!(self, Self::None | Self::Offset(0))
    }
}

/// Decoded name table: the raw blob plus its offset index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    blob: Vec<u8>,
    entries: BTreeMap<u32, String>,
    indices: HashMap<String, u32>,
}

impl NameTable {
    /// Split `size` bytes of plain (already un-hashed) name data on NUL bytes.
    pub fn decode(bytes: &[u8], size: usize) -> Result<Self> {
        if bytes.len() < size {
            return Err(Error::TruncatedNameBlob {
                expected: size,
                available: bytes.len(),
            });
        }

        let blob = bytes[..size].to_vec();
        let mut table = Self {
            blob: Vec::new(),
            entries: BTreeMap::new(),
            indices: HashMap::new(),
        };

        let mut offset = 0usize;
        while offset < blob.len() {
            let end = blob[offset..]
                .iter()
                .position(|&b| b == 0)
                .map_or(blob.len(), |p| offset + p);
            let name = String::from_utf8_lossy(&blob[offset..end]).into_owned();
            table.indices.entry(name.clone()).or_insert(offset as u32);
            table.entries.insert(offset as u32, name);
            offset = end + 1;
        }

        table.blob = blob;
        Ok(table)
    }

    /// Build a table from strings, deduplicated in first-seen order.
    ///
    /// The empty string always occupies offset 0.
    pub fn encode<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = NameTableBuilder::new();
        for s in strings {
            builder.add(s.as_ref());
        }
        builder.finish()
    }

    /// Get the string starting at `offset`.
    #[must_use]
    pub fn get(&self, offset: u32) -> Option<&str> {
        self.entries.get(&offset).map(String::as_str)
    }

    /// Resolve a name reference. `NameRef::None` yields an empty string.
    #[must_use]
    pub fn resolve(&self, name: NameRef) -> Option<&str> {
        match name {
            NameRef::None => Some(""),
            NameRef::Offset(offset) => self.get(offset),
        }
    }

    /// Resolve a name reference held by fragment `ordinal`.
    pub fn lookup(&self, name: NameRef, ordinal: u32) -> Result<&str> {
        match name {
            NameRef::None => Ok(""),
            NameRef::Offset(offset) => self
                .get(offset)
                .ok_or(Error::NameNotFound { ordinal, offset }),
        }
    }

    /// Offset of a string, if present.
    #[must_use]
    pub fn offset_of(&self, name: &str) -> Option<u32> {
        self.indices.get(name).copied()
    }

    /// Reference to a string, if present.
    #[must_use]
    pub fn name_ref(&self, name: &str) -> Option<NameRef> {
        if name.is_empty() {
            return Some(NameRef::None);
        }
        self.offset_of(name).map(NameRef::Offset)
    }

    /// The plain blob (not hashed).
    #[must_use]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Entries in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries.iter().map(|(&k, v)| (k, v.as_str()))
    }

    /// Number of strings, including the leading empty string.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Incrementally builds a deduplicated name table.
#[derive(Debug, Clone)]
pub struct NameTableBuilder {
    table: NameTable,
}

impl NameTableBuilder {
    #[must_use]
    pub fn new() -> Self {
        let mut table = NameTable::default();
        table.blob.push(0);
        table.entries.insert(0, String::new());
        table.indices.insert(String::new(), 0);
        Self { table }
    }

    /// Add a string, returning the reference for it.
    pub fn add(&mut self, name: &str) -> NameRef {
        if name.is_empty() {
            return NameRef::None;
        }
        if let Some(&offset) = self.table.indices.get(name) {
            return NameRef::Offset(offset);
        }

        let offset = self.table.blob.len() as u32;
        self.table.blob.extend_from_slice(name.as_bytes());
        self.table.blob.push(0);
        self.table.entries.insert(offset, name.to_string());
        self.table.indices.insert(name.to_string(), offset);
        NameRef::Offset(offset)
    }

    #[must_use]
    pub fn finish(self) -> NameTable {
        self.table
    }
}

impl Default for NameTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Translation from the offsets of one name table to those of another.
///
/// Built by the writer while it collects names; fragments consult it for
/// every name slot they encode.
#[derive(Debug, Clone, Default)]
pub struct NameRemap {
    offsets: Option<HashMap<u32, u32>>,
}

impl NameRemap {
    /// A remap that leaves every offset unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self { offsets: None }
    }

    /// An empty remap to be filled with [`NameRemap::insert`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            offsets: Some(HashMap::new()),
        }
    }

    pub fn insert(&mut self, from: u32, to: u32) {
        if let Some(offsets) = &mut self.offsets {
            offsets.insert(from, to);
        }
    }

    /// On-disk value for a name slot.
    pub fn raw(&self, name: NameRef) -> Result<i32> {
        let NameRef::Offset(offset) = name else {
            return Ok(0);
        };
        match &self.offsets {
            None => name.to_raw(),
            Some(offsets) => offsets
                .get(&offset)
                .ok_or(Error::NameNotFound { ordinal: 0, offset })
                .and_then(|&to| NameRef::Offset(to).to_raw()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_records_offsets() {
        let blob = b"\0GRASS_MDF\0GRASS.BMP\0";
        let table = NameTable::decode(blob, blob.len()).unwrap();
        assert_eq!(table.get(0), Some(""));
        assert_eq!(table.get(1), Some("GRASS_MDF"));
        assert_eq!(table.get(11), Some("GRASS.BMP"));
        assert_eq!(table.get(5), None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_decode_truncated() {
        let blob = b"\0ABC\0";
        let err = NameTable::decode(blob, 16).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedNameBlob { expected: 16, available: 5 }
        ));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let names = ["MESH_DMSPRITEDEF", "ROCK_MDF", "ROCK.BMP"];
        let a = NameTable::encode(names);
        let b = NameTable::encode(names);
        assert_eq!(a.blob(), b.blob());
    }

    #[test]
    fn test_encode_deduplicates() {
        let mut builder = NameTableBuilder::new();
        let first = builder.add("WALL_MDF");
        let other = builder.add("FLOOR_MDF");
        let again = builder.add("WALL_MDF");
        assert_eq!(first, again);
        assert_ne!(first, other);

        let table = builder.finish();
        assert_eq!(table.blob(), b"\0WALL_MDF\0FLOOR_MDF\0");
        assert_eq!(table.resolve(first), Some("WALL_MDF"));
    }

    #[test]
    fn test_name_ref_sign_convention() {
        assert_eq!(NameRef::from_raw(0), Some(NameRef::None));
        assert_eq!(NameRef::from_raw(-12), Some(NameRef::Offset(12)));
        assert_eq!(NameRef::from_raw(7), None);
        assert_eq!(NameRef::Offset(12).to_raw().unwrap(), -12);
        assert_eq!(NameRef::None.to_raw().unwrap(), 0);
    }

    #[test]
    fn test_most_negative_slot_cannot_be_written_back() {
        let name = NameRef::from_raw(i32::MIN).unwrap();
        assert_eq!(name, NameRef::Offset(0x8000_0000));
        assert!(matches!(
            name.to_raw(),
            Err(Error::NameOffsetOverflow { offset: 0x8000_0000 })
        ));
        assert!(matches!(
            NameRemap::identity().raw(name),
            Err(Error::NameOffsetOverflow { .. })
        ));
        assert_eq!(NameRef::Offset(i32::MAX as u32).to_raw().unwrap(), -i32::MAX);
    }

    #[test]
    fn test_remap_translates_offsets() {
        let mut remap = NameRemap::new();
        remap.insert(40, 3);
        assert_eq!(remap.raw(NameRef::Offset(40)).unwrap(), -3);
        assert_eq!(remap.raw(NameRef::None).unwrap(), 0);
        assert!(remap.raw(NameRef::Offset(41)).is_err());
        assert_eq!(NameRemap::identity().raw(NameRef::Offset(41)).unwrap(), -41);
    }
}
