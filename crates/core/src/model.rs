//! Template-facing signature model
//!
//! Everything here is plain data: the importer builds it, the generator
//! reshapes it, and the template reads it through serde.

use serde::Serialize;

/// An imported Go package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Import {
    pub name: String,
    /// Set only when another import already uses `name`.
    pub alias: String,
    pub path: String,
}

impl Import {
    /// Identifier the generated code uses to refer to this import.
    pub fn qualifier(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }
}

/// A method parameter or result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A Go interface method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub results: Vec<Parameter>,
    pub variadic: bool,
}

/// A Go interface with its flattened method set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub name: String,
    pub methods: Vec<Method>,
}

/// A Go package reduced to the interfaces selected for mocking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    /// Import path the package was loaded from, empty when unknown.
    pub path: String,
    pub imports: Vec<Import>,
    pub interfaces: Vec<Interface>,
}

impl Package {
    pub fn import_for_path(&self, path: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.path == path)
    }
}
