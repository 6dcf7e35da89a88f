//! Template rendering with minijinja
//!
//! A template sees two values: `package`, the serialized [`Package`], and
//! `substitutions`, the user supplied key/value map.

use crate::error::Result;
use crate::generator::Renderer;
use crate::model::Package;
use minijinja::{Environment, UndefinedBehavior, context};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

const DEFAULT_NAME: &str = "mock.go.j2";
const DEFAULT_SOURCE: &str = include_str!("../templates/mock.go.j2");

/// A validated template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    source: String,
}

impl Template {
    /// The built-in testify mock template.
    pub fn default_template() -> Result<Self> {
        Self::from_source(DEFAULT_NAME, DEFAULT_SOURCE)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());
        debug!("Loaded template {}", path.display());
        Self::from_source(name, source)
    }

    /// Compile `source` once so syntax errors surface here, not at render.
    pub fn from_source(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let template = Self {
            name: name.into(),
            source: source.into(),
        };
        template.environment()?;
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn environment(&self) -> Result<Environment<'_>> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_template(&self.name, &self.source)?;
        Ok(env)
    }
}

impl Renderer for Template {
    fn render(
        &self,
        out: &mut dyn Write,
        pkg: &Package,
        substitutions: &BTreeMap<String, String>,
    ) -> Result<()> {
        let env = self.environment()?;
        let template = env.get_template(&self.name)?;
        template.render_captured_to(
            context! {
                package => pkg,
                substitutions => substitutions,
            },
            out,
        )?;
        Ok(())
    }
}
