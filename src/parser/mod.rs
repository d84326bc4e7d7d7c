//! `.env` grammar: `KEY=VALUE` lines, `#` comments, single and double
//! quoting, quoted strings spanning lines, and backslash continuation.
//!
//! Parsing is lossless with respect to positions: every value records the
//! physical extent it occupies on each line so overlays can be placed
//! exactly over it. Nothing here ever fails; lines that are not assignments
//! are skipped.

pub mod assembler;
pub mod comment;
pub mod line;

pub use assembler::parse_buffer;
pub use comment::{parse_comment_line, parse_inline_comment};
pub use line::{parse_line, Assignment, Continuation, InlineComment, LineOutcome, MultiLineState};
