//! Configuration management for gomockgen

pub mod merge;
mod settings;

// Re-export main types
pub use merge::ConfigMerger;
pub use settings::{CONFIG_FILE_NAME, Config};
