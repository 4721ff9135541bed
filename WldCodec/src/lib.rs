//! # WldCodec
//!
//! A pure-Rust codec for the legacy WLD world container.
//!
//! ## Supported Operations
//!
//! - **Containers** - Read and write `.wld` files, old and new world layouts
//! - **Fragments** - Typed layouts for all 56 fragment types, with flag-gated sections
//! - **Name table** - XOR-obfuscated, deduplicated string table
//! - **Meshes** - Fixed-point vertex quantization
//! - **Resolution** - Mesh → material → texture chains into a [`model::ResolvedModel`]
//!
//! ## Quick Start
//!
//! ### Reading a World File
//!
//! ```no_run
//! use wldcodec::formats::wld::read_wld;
//! use wldcodec::converter::resolve;
//!
//! let container = read_wld("gfay_obj.wld")?;
//! println!("Found {} fragments", container.fragment_count());
//!
//! let model = resolve(&container)?;
//! println!("{}: {} vertices", model.name, model.vertices.len());
//! # Ok::<(), wldcodec::Error>(())
//! ```
//!
//! ### Building a Container From a Model
//!
//! ```no_run
//! use wldcodec::converter::{BuildOptions, build_container};
//! use wldcodec::formats::wld::write_wld;
//! use wldcodec::model::ResolvedModel;
//!
//! let model: ResolvedModel = serde_json::from_str(&std::fs::read_to_string("crate.json")?)
//!     .map_err(std::io::Error::other)?;
//! let container = build_container(&model, &BuildOptions::new())?;
//! write_wld(&container, "crate.wld")?;
//! # Ok::<(), wldcodec::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use wldcodec::prelude::*;
//!
//! // Now you have access to:
//! // - Container, Fragment, FragmentType, NameRef, NameTable
//! // - parse_wld_bytes, serialize_wld, resolve, build_container
//! // - ArchiveSource, MemoryArchive, DirectoryArchive, load_world
//! // - Error, Result, and more
//! ```

pub mod archive;
pub mod converter;
pub mod error;
pub mod formats;
pub mod model;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::formats::wld::{
        Container, Fragment, FragmentType, NameRef, NameTable, ReadOptions, WorldFormat,
        parse_wld_bytes, parse_wld_bytes_with_options, read_wld, serialize_wld, write_wld,
    };
    pub use crate::formats::wld::quantize::MeshQuantizer;

    pub use crate::converter::{BuildOptions, build_container, resolve, resolve_all, resolve_mesh};
    pub use crate::model::{Material, MaterialProperty, ResolvedModel, Triangle, Vertex};

    // Archive seam
    pub use crate::archive::{ArchiveSource, DirectoryArchive, MemoryArchive, load_textures, load_world};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
