//! WLD world container
//!
//! A world file is a header, an obfuscated name table and a flat list of
//! typed fragments that point at each other by ordinal.

mod container;
pub mod fragment;
pub mod hash;
mod io;
mod name_table;
mod options;
pub mod quantize;
mod reader;
mod version;
mod writer;

// Public API
pub use container::Container;
pub use fragment::{Fragment, FragmentType};
pub use io::{DecodeContext, EncodeContext};
pub use name_table::{NameRef, NameRemap, NameTable, NameTableBuilder};
pub use options::ReadOptions;
pub use quantize::{MeshQuantizer, choose_scale_exponent};
pub use reader::{parse_wld_bytes, parse_wld_bytes_with_options, read_wld, read_wld_with_options};
pub use version::{UvWidth, WLD_MAGIC, WLD_VERSION_NEW, WLD_VERSION_OLD, WorldFormat};
pub use writer::{serialize_wld, write_wld};
