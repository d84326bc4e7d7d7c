//! Masking policy, per-line mask distribution and overlay building

pub mod distribute;
pub mod extmarks;
pub mod policy;

pub use distribute::{compute_line_masks, fit_to_width};
pub use extmarks::build_extmarks;
pub use policy::{MaskEngine, MaskRequest};
