// Shelter library - masks secret values in env files for display

// Core modules at root level
pub mod config;
pub mod plugin_api;
pub mod state;

// Organized modules
pub mod app;
pub mod cache;
pub mod mask;
pub mod model;
pub mod parser;
pub mod primitives;
pub mod services;

pub use app::Shelter;
