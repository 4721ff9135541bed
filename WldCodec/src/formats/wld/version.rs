//! Old/new world format switch and the fields it affects

use crate::error::{Error, Result};

/// WLD magic bytes.
pub const WLD_MAGIC: [u8; 4] = [0x02, 0x3D, 0x50, 0x54];

/// Version word of the original (old world) layout.
pub const WLD_VERSION_OLD: u32 = 0x00015500;

/// Version word of the later (new world) layout.
pub const WLD_VERSION_NEW: u32 = 0x1000C800;

/// Which of the two known layouts a container uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorldFormat {
    /// Version `0x00015500`.
    #[default]
    Old,
    /// Version `0x1000C800`.
    New,
}

/// Storage width of mesh texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvWidth {
    /// Two `i16` per coordinate.
    I16,
    /// Two `i32` per coordinate.
    I32,
}

impl UvWidth {
    /// Bytes used by one UV pair.
    #[must_use]
    pub fn pair_size(self) -> usize {
        match self {
            Self::I16 => 4,
            Self::I32 => 8,
        }
    }
}

impl WorldFormat {
    pub fn from_version(version: u32) -> Result<Self> {
        match version {
            WLD_VERSION_OLD => Ok(Self::Old),
            WLD_VERSION_NEW => Ok(Self::New),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    #[must_use]
    pub fn version(self) -> u32 {
        match self {
            Self::Old => WLD_VERSION_OLD,
            Self::New => WLD_VERSION_NEW,
        }
    }

    #[must_use]
    pub fn is_old(self) -> bool {
        self == Self::Old
    }

    /// Width of `DmSpriteDef2` texture coordinates.
    #[must_use]
    pub fn mesh_uv_width(self) -> UvWidth {
        match self {
            Self::Old => UvWidth::I16,
            Self::New => UvWidth::I32,
        }
    }
}
