//! File format handlers
//!
//! Only the WLD world container lives here. The outer archive is reached
//! through [`crate::archive`].

pub mod wld;

// Re-export main container types
pub use wld::{Container, Fragment, FragmentType, read_wld, write_wld};
