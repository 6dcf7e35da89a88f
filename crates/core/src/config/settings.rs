use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".gomockgen.json";

/// Settings from a `.gomockgen.json` file. Everything is optional; unset
/// fields fall back to farther config files, then to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Config {
    /// Package name of the generated file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Interface name -> mock type name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub names: BTreeMap<String, String>,

    /// Values handed to the template.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub substitutions: BTreeMap<String, String>,

    /// Template file used instead of the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    /// Output file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,

    /// Formatter command line; an empty list disables formatting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<Vec<String>>,
}

impl Config {
    /// Load a config file. Relative `template` and `out` paths are taken
    /// relative to the directory holding the file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&contents).map_err(|e| {
            Error::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })?;

        if let Some(base) = path.parent() {
            for file in [&mut config.template, &mut config.out].into_iter().flatten() {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
        Ok(config)
    }

    /// Apply `closer` on top of `self`: scalars are replaced, maps are merged
    /// key by key.
    pub fn merge(&mut self, closer: Config) {
        if closer.package.is_some() {
            self.package = closer.package;
        }
        self.names.extend(closer.names);
        self.substitutions.extend(closer.substitutions);
        if closer.template.is_some() {
            self.template = closer.template;
        }
        if closer.out.is_some() {
            self.out = closer.out;
        }
        if closer.formatter.is_some() {
            self.formatter = closer.formatter;
        }
    }
}
