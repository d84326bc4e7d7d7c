//! Collaborators the shelter core depends on

pub mod env_files;
pub mod time_source;

pub use env_files::{matches_env_file_pattern, EnvFileMatcher};
pub use time_source::{RealTimeSource, SharedTimeSource, TestTimeSource, TimeSource};
