//! Package qualification for generated code
//!
//! Decides whether a package referenced by a signature is the package the
//! mocks are generated into (printed unqualified) or a foreign one (printed
//! through an import, aliased when its name is already taken).

use crate::error::{Error, Result};
use crate::loader::DirectoryResolver;
use crate::loader::types::PackageRef;
use crate::model::Import;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How to decide that a package is the output package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualification {
    /// Local when the import path matches.
    ByPath(String),
    /// Local when the declared package name matches.
    ByName(String),
    /// Local when the package's sources live in this directory.
    ByDirectory(PathBuf),
}

impl Qualification {
    /// Anchor a directory policy on an absolute, canonical path.
    pub fn by_directory(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Qualification::ByDirectory(absolute(dir.as_ref())?))
    }
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };
    Ok(dir.canonicalize().unwrap_or(dir))
}

/// Imports handed out so far, in first-use order.
#[derive(Debug, Default)]
pub struct ImportTable {
    name_count: HashMap<String, usize>,
    by_path: HashMap<String, usize>,
    imports: Vec<Import>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to print in front of names from `pkg`.
    pub fn qualify(&mut self, pkg: &PackageRef) -> String {
        if let Some(&i) = self.by_path.get(&pkg.path) {
            return self.imports[i].qualifier().to_string();
        }

        let import = Import {
            name: pkg.name.clone(),
            alias: self.alias(&pkg.name),
            path: pkg.path.clone(),
        };
        let token = import.qualifier().to_string();
        self.by_path.insert(pkg.path.clone(), self.imports.len());
        self.imports.push(import);
        token
    }

    fn alias(&mut self, name: &str) -> String {
        let count = self.name_count.entry(name.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            String::new()
        } else {
            format!("{name}{count}")
        }
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn into_imports(self) -> Vec<Import> {
        self.imports
    }
}

/// Qualifies packages for one generation run.
pub struct Qualifier<'r> {
    policy: Qualification,
    table: ImportTable,
    dirs: HashMap<String, PathBuf>,
    resolver: &'r dyn DirectoryResolver,
}

impl<'r> Qualifier<'r> {
    pub fn new(policy: Qualification, resolver: &'r dyn DirectoryResolver) -> Self {
        Self {
            policy,
            table: ImportTable::new(),
            dirs: HashMap::new(),
            resolver,
        }
    }

    /// `""` for the output package, otherwise the import's name or alias.
    pub fn qualify(&mut self, pkg: &PackageRef) -> Result<String> {
        if self.is_local(pkg)? {
            return Ok(String::new());
        }
        Ok(self.table.qualify(pkg))
    }

    fn is_local(&mut self, pkg: &PackageRef) -> Result<bool> {
        match &self.policy {
            Qualification::ByPath(path) => Ok(pkg.path == *path),
            Qualification::ByName(name) => Ok(pkg.name == *name),
            Qualification::ByDirectory(dir) => {
                let dir = dir.clone();
                Ok(self.package_dir(&pkg.path)? == dir)
            }
        }
    }

    fn package_dir(&mut self, path: &str) -> Result<PathBuf> {
        if let Some(dir) = self.dirs.get(path) {
            return Ok(dir.clone());
        }
        let dir = self
            .resolver
            .package_dir(path)
            .map_err(|e| Error::Qualification {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        let dir = absolute(&dir)?;
        debug!("Package {} resolves to {}", path, dir.display());
        self.dirs.insert(path.to_string(), dir.clone());
        Ok(dir)
    }

    pub fn imports(&self) -> &[Import] {
        self.table.imports()
    }

    pub fn into_imports(self) -> Vec<Import> {
        self.table.into_imports()
    }
}
