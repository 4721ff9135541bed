//! Conversion between containers and resolved models
//!
//! - Container → [`ResolvedModel`](crate::model::ResolvedModel): [`resolve`], [`resolve_all`], [`resolve_mesh`]
//! - [`ResolvedModel`](crate::model::ResolvedModel) → Container: [`build_container`]

mod build;
mod resolve;

pub use build::{BuildOptions, OBJECT_MESH_FLAGS, build_container};
pub use resolve::{resolve, resolve_all, resolve_mesh};
