//! Data model shared by the parser, masking engine and overlay applier

pub mod overlay;
pub mod variable;

pub use overlay::{render_overlays, ExtmarkSpec, LineMask};
pub use variable::{ParsedVariable, ParsedVariables, QuoteChar, ValueSegment, VariableId};

/// Identifier of an editor buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);
