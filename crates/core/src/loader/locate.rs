//! Import path to directory resolution
//!
//! Mirrors the lookup order of the go command in module mode: main module,
//! its vendor directory, replace directives, required modules in the module
//! cache, the standard library, and finally legacy GOPATH.

use super::constraint::BuildContext;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;
use walkdir::WalkDir;

/// Go toolchain environment the loader works in.
#[derive(Debug, Clone)]
pub struct GoEnv {
    /// Directory relative patterns and `go.mod` discovery start from.
    pub dir: PathBuf,
    pub goroot: Option<PathBuf>,
    pub gopath: Vec<PathBuf>,
    pub gomodcache: Option<PathBuf>,
    pub build: BuildContext,
}

impl GoEnv {
    /// An environment without any toolchain directories.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            goroot: None,
            gopath: Vec::new(),
            gomodcache: None,
            build: BuildContext::host(),
        }
    }

    /// Read `GOROOT`, `GOPATH` and `GOMODCACHE` from the environment, asking
    /// `go env` for whatever is unset.
    pub fn from_env(dir: impl Into<PathBuf>) -> Self {
        let mut env = Self::new(dir);
        env.goroot = std::env::var_os("GOROOT").map(PathBuf::from);
        env.gopath = std::env::var_os("GOPATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        env.gomodcache = std::env::var_os("GOMODCACHE").map(PathBuf::from);

        if env.goroot.is_none() || env.gopath.is_empty() || env.gomodcache.is_none() {
            if let Some([goroot, gopath, gomodcache]) = go_env(&env.dir) {
                env.goroot = env.goroot.or(goroot.map(PathBuf::from));
                if env.gopath.is_empty() {
                    if let Some(gopath) = gopath {
                        env.gopath = std::env::split_paths(&gopath).collect();
                    }
                }
                env.gomodcache = env.gomodcache.or(gomodcache.map(PathBuf::from));
            }
        }

        if env.gomodcache.is_none() {
            env.gomodcache = env.gopath.first().map(|p| p.join("pkg").join("mod"));
        }
        debug!(
            "Go environment: GOROOT={:?} GOPATH={:?} GOMODCACHE={:?}",
            env.goroot, env.gopath, env.gomodcache
        );
        env
    }

    pub fn with_goroot(mut self, goroot: impl Into<PathBuf>) -> Self {
        self.goroot = Some(goroot.into());
        self
    }

    pub fn with_gomodcache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gomodcache = Some(dir.into());
        self
    }
}

fn go_env(dir: &Path) -> Option<[Option<String>; 3]> {
    let output = Command::new("go")
        .args(["env", "GOROOT", "GOPATH", "GOMODCACHE"])
        .current_dir(dir)
        .output()
        .ok()?;
    if !output.status.success() {
        debug!("go env failed: {}", String::from_utf8_lossy(&output.stderr));
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout
        .lines()
        .map(|l| Some(l.trim().to_string()).filter(|l| !l.is_empty()));
    Some([
        lines.next().flatten(),
        lines.next().flatten(),
        lines.next().flatten(),
    ])
}

/// A `replace` directive from go.mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old: String,
    pub new: String,
    pub version: Option<String>,
}

/// The main module, as described by its go.mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub path: String,
    pub root: PathBuf,
    pub requires: Vec<(String, String)>,
    pub replaces: Vec<Replace>,
}

impl Module {
    /// Walk up from `dir` to the closest go.mod.
    pub fn find(dir: &Path) -> Result<Option<Module>> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let go_mod = dir.join("go.mod");
            if go_mod.is_file() {
                let content = fs::read_to_string(&go_mod)?;
                return Module::parse(dir, &content).map(Some);
            }
            current = dir.parent();
        }
        Ok(None)
    }

    pub fn parse(root: &Path, content: &str) -> Result<Module> {
        let mut module = Module {
            path: String::new(),
            root: root.to_path_buf(),
            requires: Vec::new(),
            replaces: Vec::new(),
        };
        let mut block: Option<String> = None;

        for line in content.lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line == ")" {
                block = None;
                continue;
            }
            let (verb, rest) = match &block {
                Some(verb) => (verb.clone(), line),
                None => {
                    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
                    let rest = rest.trim();
                    if rest == "(" {
                        block = Some(verb.to_string());
                        continue;
                    }
                    (verb.to_string(), rest)
                }
            };

            let fields: Vec<String> = rest
                .split_whitespace()
                .map(|f| f.trim_matches('"').to_string())
                .collect();
            match (verb.as_str(), fields.as_slice()) {
                ("module", [path, ..]) => module.path = path.clone(),
                ("require", [path, version, ..]) => {
                    module.requires.push((path.clone(), version.clone()))
                }
                ("replace", fields) => {
                    if let Some(arrow) = fields.iter().position(|f| f == "=>") {
                        if let (Some(old), Some(new)) = (fields.first(), fields.get(arrow + 1)) {
                            module.replaces.push(Replace {
                                old: old.clone(),
                                new: new.clone(),
                                version: fields.get(arrow + 2).cloned(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        if module.path.is_empty() {
            return Err(Error::ConfigError(format!(
                "{}: no module directive in go.mod",
                root.display()
            )));
        }
        Ok(module)
    }
}

/// Suffix of `path` below `prefix` ("" when equal), if `path` is inside it.
fn strip_path_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if path == prefix {
        return Some("");
    }
    path.strip_prefix(prefix)?.strip_prefix('/')
}

/// Module cache directories escape upper case letters as `!` + lower case.
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

pub struct Locator {
    env: GoEnv,
    module: Option<Module>,
}

impl Locator {
    pub fn new(mut env: GoEnv) -> Result<Self> {
        if let Ok(dir) = fs::canonicalize(&env.dir) {
            env.dir = dir;
        }
        let module = Module::find(&env.dir)?;
        match &module {
            Some(m) => debug!("Main module {} at {}", m.path, m.root.display()),
            None => debug!("No go.mod above {}", env.dir.display()),
        }
        Ok(Self { env, module })
    }

    pub fn env(&self) -> &GoEnv {
        &self.env
    }

    /// Directory holding the package with the given import path.
    pub fn find(&self, path: &str) -> Option<PathBuf> {
        let found = self.find_module_package(path).or_else(|| {
            let std_dir = self
                .env
                .goroot
                .as_ref()
                .map(|root| root.join("src").join(path))
                .filter(|dir| is_std_path(path) && dir.is_dir());
            std_dir.or_else(|| {
                self.env
                    .gopath
                    .iter()
                    .map(|p| p.join("src").join(path))
                    .find(|dir| dir.is_dir())
            })
        });
        debug!("Located {} at {:?}", path, found);
        found
    }

    fn find_module_package(&self, path: &str) -> Option<PathBuf> {
        let module = self.module.as_ref()?;

        if let Some(rest) = strip_path_prefix(path, &module.path) {
            let dir = module.root.join(rest);
            if dir.is_dir() {
                return Some(dir);
            }
        }

        let vendored = module.root.join("vendor").join(path);
        if vendored.is_dir() {
            return Some(vendored);
        }

        let replace = module
            .replaces
            .iter()
            .filter_map(|r| strip_path_prefix(path, &r.old).map(|rest| (r, rest)))
            .max_by_key(|(r, _)| r.old.len());
        if let Some((replace, rest)) = replace {
            let local = replace.new.starts_with("./")
                || replace.new.starts_with("../")
                || Path::new(&replace.new).is_absolute();
            if local {
                let dir = module.root.join(&replace.new).join(rest);
                return dir.is_dir().then_some(dir);
            }
            if let Some(version) = &replace.version {
                return self.find_in_module_cache(&replace.new, version, rest);
            }
        }

        let (required, version) = module
            .requires
            .iter()
            .filter(|(m, _)| strip_path_prefix(path, m).is_some())
            .max_by_key(|(m, _)| m.len())?;
        let rest = strip_path_prefix(path, required)?;
        self.find_in_module_cache(required, version, rest)
    }

    fn find_in_module_cache(&self, module: &str, version: &str, rest: &str) -> Option<PathBuf> {
        let cache = self.env.gomodcache.as_ref()?;
        let dir = cache
            .join(format!("{}@{}", escape_module_path(module), version))
            .join(rest);
        dir.is_dir().then_some(dir)
    }

    /// Import path of a directory inside the main module.
    pub fn import_path_of(&self, dir: &Path) -> Option<String> {
        let module = self.module.as_ref()?;
        let rel = dir.strip_prefix(&module.root).ok()?;
        let mut path = module.path.clone();
        for component in rel.components() {
            path.push('/');
            path.push_str(&component.as_os_str().to_string_lossy());
        }
        Some(path)
    }

    /// Resolve a relative (`./x`, `../y`) or absolute directory argument.
    pub fn resolve_dir(&self, pattern: &str) -> PathBuf {
        let dir = self.env.dir.join(pattern);
        fs::canonicalize(&dir).unwrap_or(dir)
    }

    /// Import paths of main-module packages matching a `...` pattern.
    pub fn expand(&self, pattern: &str) -> Vec<String> {
        let Some(module) = self.module.as_ref() else {
            return Vec::new();
        };

        let pattern = if is_relative(pattern) {
            let (dir, tail) = pattern.split_once("...").unwrap_or((pattern, ""));
            let dir = dir.trim_end_matches('/');
            match self.import_path_of(&self.resolve_dir(if dir.is_empty() { "." } else { dir })) {
                Some(base) if pattern.contains("/...") || dir.is_empty() => {
                    format!("{base}/...{tail}")
                }
                Some(base) => format!("{base}...{tail}"),
                None => return Vec::new(),
            }
        } else {
            pattern.to_string()
        };

        let mut matches = Vec::new();
        let walker = WalkDir::new(&module.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                e.depth() == 0
                    || !(name.starts_with('.')
                        || name.starts_with('_')
                        || name == "testdata"
                        || name == "vendor"
                        || e.path().join("go.mod").is_file())
            });
        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_dir() || !self.has_go_files(entry.path()) {
                continue;
            }
            if let Some(path) = self.import_path_of(entry.path()) {
                if match_pattern(&pattern, &path) {
                    matches.push(path);
                }
            }
        }
        debug!("Pattern {} matched {:?}", pattern, matches);
        matches
    }

    fn has_go_files(&self, dir: &Path) -> bool {
        let Ok(entries) = fs::read_dir(dir) else {
            return false;
        };
        entries.filter_map(|e| e.ok()).any(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            e.path().is_file()
                && name.ends_with(".go")
                && !name.ends_with("_test.go")
                && self.env.build.matches_file_name(&name)
        })
    }
}

pub fn is_relative(pattern: &str) -> bool {
    pattern == "."
        || pattern == ".."
        || pattern.starts_with("./")
        || pattern.starts_with("../")
        || Path::new(pattern).is_absolute()
}

/// Standard library import paths have no dot in their first element.
fn is_std_path(path: &str) -> bool {
    !path.split('/').next().unwrap_or("").contains('.')
}

/// Go's package pattern matching: `...` matches any string, and a trailing
/// `/...` also matches the bare prefix.
pub fn match_pattern(pattern: &str, path: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("/...") {
        if path == prefix {
            return true;
        }
    }
    let parts: Vec<&str> = pattern.split("...").collect();
    if parts.len() == 1 {
        return pattern == path;
    }

    let mut rest = path;
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}
