//! Small building blocks shared by the parser, masking engine and caches

pub mod content_hash;
pub mod glob;

pub use content_hash::ContentHash;
pub use glob::{Glob, GlobMap};
