//! Error types for `WldCodec`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `WldCodec` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Container Errors ====================
    /// The file does not start with the WLD magic bytes.
    #[error("invalid WLD magic: expected [02, 3D, 50, 54], found {0:02X?}")]
    BadMagic([u8; 4]),

    /// The format-version word is neither the old nor the new world sentinel.
    #[error("unsupported WLD version: 0x{0:08X}")]
    UnsupportedVersion(u32),

    /// The header announces a name table larger than the remaining input.
    #[error("name table truncated: expected {expected} bytes, {available} available")]
    TruncatedNameBlob {
        /// Name table size from the header.
        expected: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// The number of decoded fragments does not match the header.
    #[error("fragment count mismatch: header says {expected}, found {found}")]
    FragmentCountMismatch {
        /// Fragment count from the header.
        expected: u32,
        /// Number of fragments present.
        found: u32,
    },

    /// The header region count does not match the number of region fragments.
    #[error("region count mismatch: header says {expected}, found {found} region fragments")]
    RegionCountMismatch {
        /// Region count from the header.
        expected: u32,
        /// Number of `Region` fragments decoded.
        found: u32,
    },

    // ==================== Fragment Errors ====================
    /// A record carries a type code outside the known fragment set.
    #[error("fragment {ordinal}: unknown fragment type 0x{code:02X}")]
    UnknownFragmentType {
        /// 1-based ordinal of the offending record.
        ordinal: u32,
        /// The raw type code.
        code: i32,
    },

    /// A field read ran past the end of the fragment payload.
    #[error("fragment {ordinal} (type 0x{type_code:02X}): truncated while reading {field}")]
    FragmentTruncated {
        /// 1-based ordinal of the fragment (0 when decoded outside a container).
        ordinal: u32,
        /// Type code of the fragment being decoded.
        type_code: u32,
        /// Name of the field that could not be read.
        field: &'static str,
    },

    /// A name slot holds a positive value, which is not a name reference.
    #[error("fragment {ordinal}: invalid name reference {value}")]
    InvalidNameRef {
        /// 1-based ordinal of the fragment.
        ordinal: u32,
        /// The raw stored value.
        value: i32,
    },

    /// A name offset referenced by a fragment has no entry in the name table.
    #[error("fragment {ordinal}: name offset {offset} not found in name table")]
    NameNotFound {
        /// 1-based ordinal of the fragment (0 when not tied to a fragment).
        ordinal: u32,
        /// The unresolved byte offset.
        offset: u32,
    },

    /// A name offset too large to store as a negative `i32` slot.
    #[error("name offset {offset} does not fit a name slot")]
    NameOffsetOverflow {
        /// The offset that was to be written.
        offset: u32,
    },

    /// A value does not fit the width of the field it is written to.
    #[error("fragment type 0x{type_code:02X}: value {value} does not fit field {field}")]
    FieldOverflow {
        /// Type code of the fragment being encoded.
        type_code: u32,
        /// Name of the field.
        field: &'static str,
        /// The value that did not fit.
        value: i64,
    },

    /// The flags announce an optional section whose value is absent.
    #[error("fragment type 0x{type_code:02X}: flags require section {field}, which is missing")]
    MissingSection {
        /// Type code of the fragment being encoded.
        type_code: u32,
        /// Name of the missing section.
        field: &'static str,
    },

    /// A collection's length disagrees with the count another field declares.
    #[error("fragment type 0x{type_code:02X}: {field} has {found} entries, expected {expected}")]
    CountMismatch {
        /// Type code of the fragment being encoded.
        type_code: u32,
        /// Name of the collection.
        field: &'static str,
        /// The declared count.
        expected: usize,
        /// The actual length.
        found: usize,
    },

    // ==================== Mesh Errors ====================
    /// A coordinate falls outside the representable fixed-point range.
    #[error("{attribute} value {value} out of range for scale exponent {scale_exponent}")]
    QuantizationOverflow {
        /// Which attribute was being quantized.
        attribute: &'static str,
        /// The offending float value (relative to the mesh center for positions).
        value: f32,
        /// The scale exponent in use.
        scale_exponent: u16,
    },

    // ==================== Resolver Errors ====================
    /// An ordinal reference points at a missing fragment or one of the wrong kind.
    #[error("fragment {from} references fragment {to}, expected {expected}")]
    DanglingReference {
        /// Ordinal of the referencing fragment.
        from: u32,
        /// The ordinal that failed to resolve.
        to: u32,
        /// Name of the variant expected at `to`.
        expected: &'static str,
    },

    /// A face material group names a material beyond the mesh's palette.
    #[error("mesh {mesh}: material group {group} uses material {material}, palette has {palette_len}")]
    InvalidMaterialGroup {
        /// Ordinal of the mesh fragment.
        mesh: u32,
        /// Index of the offending group.
        group: usize,
        /// Material index named by the group.
        material: u16,
        /// Number of materials in the palette.
        palette_len: usize,
    },

    /// The container holds no mesh fragment to resolve.
    #[error("container contains no mesh fragments")]
    NoMesh,

    // ==================== Archive Errors ====================
    /// The archive collaborator has no entry with the requested name.
    #[error("archive entry not found: {0}")]
    ArchiveEntryNotFound(String),

    /// An entry name that is not a plain file name (separators, `..`, roots).
    #[error("invalid archive entry name: {0}")]
    InvalidEntryName(String),

    /// The archive root directory does not exist.
    #[error("archive directory not found: {path}")]
    ArchiveDirectoryMissing {
        /// The expected directory.
        path: PathBuf,
    },
}

/// A specialized Result type for `WldCodec` operations.
pub type Result<T> = std::result::Result<T, Error>;
