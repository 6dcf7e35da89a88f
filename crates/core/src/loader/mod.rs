//! Go package loading from source
//!
//! [`SourceLoader`] finds a package directory the way the go command does,
//! parses every file that belongs to the current build with tree-sitter, and
//! keeps the result per import path for the rest of the run.

pub mod checker;
pub mod constraint;
pub mod locate;
pub mod syntax;
pub mod types;

use crate::error::{Error, Result};
use locate::{GoEnv, Locator};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use syntax::{Decl, GoParser, SourceFile};
use tracing::{debug, info};
use types::PackageRef;

/// Loads Go packages by pattern or import path.
pub trait PackageLoader {
    /// Load the single package matching `pattern` (an import path, a relative
    /// directory, or a `...` wildcard).
    fn load(&self, pattern: &str) -> Result<Rc<Package>>;

    /// Load a package by import path.
    fn import(&self, path: &str) -> Result<Rc<Package>>;

    /// Declared name of a package, without loading all of it if possible.
    fn package_name(&self, path: &str) -> Result<String> {
        Ok(self.import(path)?.name.clone())
    }
}

/// Maps an import path to the directory holding its sources.
pub trait DirectoryResolver {
    fn package_dir(&self, path: &str) -> Result<PathBuf>;
}

/// A parsed Go package.
#[derive(Debug)]
pub struct Package {
    pub name: String,
    pub path: String,
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
    /// Top-level name -> (file index, decl index).
    scope: BTreeMap<String, (usize, usize)>,
}

impl Package {
    pub fn new(name: String, path: String, dir: PathBuf, files: Vec<SourceFile>) -> Result<Self> {
        let mut scope = BTreeMap::new();
        for (f, file) in files.iter().enumerate() {
            for (d, decl) in file.decls.iter().enumerate() {
                if scope.insert(decl.name.clone(), (f, d)).is_some() {
                    return Err(Error::InvalidType {
                        package: path,
                        name: decl.name.clone(),
                        reason: "redeclared in this block".to_string(),
                    });
                }
            }
        }
        Ok(Self {
            name,
            path,
            dir,
            files,
            scope,
        })
    }

    pub fn reference(&self) -> PackageRef {
        PackageRef::new(self.path.clone(), self.name.clone())
    }

    /// Top-level names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scope.keys().map(String::as_str)
    }

    pub fn lookup(&self, name: &str) -> Option<(&SourceFile, &Decl)> {
        let &(f, d) = self.scope.get(name)?;
        let file = self.files.get(f)?;
        Some((file, file.decls.get(d)?))
    }
}

pub struct SourceLoader {
    locator: Locator,
    parser: RefCell<GoParser>,
    packages: RefCell<HashMap<String, Rc<Package>>>,
    names: RefCell<HashMap<String, String>>,
}

impl SourceLoader {
    pub fn new(env: GoEnv) -> Result<Self> {
        Ok(Self {
            locator: Locator::new(env)?,
            parser: RefCell::new(GoParser::new()?),
            packages: RefCell::new(HashMap::new()),
            names: RefCell::new(HashMap::new()),
        })
    }

    fn cached(&self, path: &str) -> Option<Rc<Package>> {
        self.packages.borrow().get(path).cloned()
    }

    fn find_dir(&self, path: &str) -> Result<PathBuf> {
        self.locator.find(path).ok_or_else(|| {
            Error::not_found(
                path,
                "cannot find package in the main module, module cache, GOROOT or GOPATH",
            )
        })
    }

    /// Go files of `dir` that belong to the current build, sorted by name.
    fn go_files(&self, path: &str, dir: &Path) -> Result<Vec<(PathBuf, String)>> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        entries.sort();

        let build = &self.locator.env().build;
        let mut files = Vec::new();
        for file in entries {
            let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if !name.ends_with(".go") {
                continue;
            }
            let source = fs::read_to_string(&file)?;
            if build.includes(&name, &source) {
                files.push((file, source));
            } else {
                debug!("Excluding {} from build", file.display());
            }
        }

        if files.is_empty() {
            return Err(Error::not_found(
                path,
                format!("no buildable Go source files in {}", dir.display()),
            ));
        }
        Ok(files)
    }

    fn load_dir(&self, path: &str, dir: &Path) -> Result<Rc<Package>> {
        info!("Loading package {} from {}", path, dir.display());
        let mut parsed = Vec::new();
        {
            let mut parser = self.parser.borrow_mut();
            for (file, source) in self.go_files(path, dir)? {
                parsed.push(parser.parse_file(&file, &source)?);
            }
        }

        let name = parsed
            .first()
            .map(|f| f.package.clone())
            .unwrap_or_default();
        if let Some(other) = parsed.iter().find(|f| f.package != name) {
            return Err(Error::Syntax {
                file: other.path.clone(),
                line: 1,
                column: 1,
                message: format!("found packages {} and {} in {}", name, other.package, dir.display()),
            });
        }

        let package = Rc::new(Package::new(name, path.to_string(), dir.to_path_buf(), parsed)?);
        debug!(
            "Package {} ({}) declares {} names",
            package.path,
            package.name,
            package.scope.len()
        );
        self.packages
            .borrow_mut()
            .insert(path.to_string(), Rc::clone(&package));
        Ok(package)
    }
}

impl PackageLoader for SourceLoader {
    fn load(&self, pattern: &str) -> Result<Rc<Package>> {
        if pattern.contains("...") {
            let matches = self.locator.expand(pattern);
            return match matches.as_slice() {
                [single] => self.import(single),
                [] => Err(Error::not_found(pattern, "matched no packages")),
                many => Err(Error::not_found(
                    pattern,
                    format!("matched {} packages, expected exactly one", many.len()),
                )),
            };
        }

        if locate::is_relative(pattern) {
            let dir = self.locator.resolve_dir(pattern);
            let path = self
                .locator
                .import_path_of(&dir)
                .unwrap_or_else(|| dir.display().to_string());
            if let Some(package) = self.cached(&path) {
                return Ok(package);
            }
            if !dir.is_dir() {
                return Err(Error::not_found(pattern, "directory does not exist"));
            }
            return self.load_dir(&path, &dir);
        }

        self.import(pattern)
    }

    fn import(&self, path: &str) -> Result<Rc<Package>> {
        if let Some(package) = self.cached(path) {
            return Ok(package);
        }
        let dir = self.find_dir(path)?;
        self.load_dir(path, &dir)
    }

    fn package_name(&self, path: &str) -> Result<String> {
        if let Some(package) = self.cached(path) {
            return Ok(package.name.clone());
        }
        if let Some(name) = self.names.borrow().get(path) {
            return Ok(name.clone());
        }

        let dir = self.find_dir(path)?;
        let files = self.go_files(path, &dir)?;
        let (file, source) = &files[0];
        let name = self.parser.borrow_mut().package_name(file, source)?;
        self.names
            .borrow_mut()
            .insert(path.to_string(), name.clone());
        Ok(name)
    }
}

impl DirectoryResolver for SourceLoader {
    fn package_dir(&self, path: &str) -> Result<PathBuf> {
        match self.cached(path) {
            Some(package) => Ok(package.dir.clone()),
            None => self.find_dir(path),
        }
    }
}
