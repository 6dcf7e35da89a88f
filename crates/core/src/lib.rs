//! gomockgen - Mock generation for Go interfaces
//!
//! This crate provides functionality to:
//! - Load Go packages from source and resolve the method sets of their interfaces
//! - Qualify cross-package type references for the package the mocks live in
//! - Render mocks through a template and normalize the resulting imports
pub mod config;
pub mod error;
pub mod generator;
pub mod importer;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod qualifier;
pub mod template;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use model::*;

// Re-export main API components
pub use config::{Config, ConfigMerger};
pub use generator::{Generator, Normalizer, Options, Parser, Renderer};
pub use importer::Importer;
pub use loader::locate::GoEnv;
pub use loader::{DirectoryResolver, PackageLoader, SourceLoader};
pub use normalize::{Formatter, Unformatted};
pub use qualifier::Qualification;
pub use template::Template;
