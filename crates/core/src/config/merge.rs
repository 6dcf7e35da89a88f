//! Layered configuration discovery
//!
//! Config files are collected walking up from the working directory, stopping
//! at the Go module root (the directory holding `go.mod`) or at `$HOME`.
//! Closer files override farther ones.

use super::settings::{CONFIG_FILE_NAME, Config};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default)]
pub struct ConfigMerger {
    /// Loaded files, closest first.
    configs: Vec<(PathBuf, Config)>,
}

impl ConfigMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every config file that applies to `dir`.
    pub fn load_configs_for_path(&mut self, dir: &Path) -> Result<()> {
        debug!("Loading configs for path: {:?}", dir);
        let home = std::env::var_os("HOME").map(PathBuf::from);

        for config_path in Self::find_config_files(dir, home.as_deref()) {
            debug!("Found config at: {:?}", config_path);
            let config = Config::load_from_file(&config_path)?;
            self.configs.push((config_path, config));
        }
        Ok(())
    }

    /// Candidate files from `dir` up to the module root or `home`.
    pub fn find_config_files(dir: &Path, home: Option<&Path>) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut current = Some(dir);
        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                found.push(config_path);
            }
            if dir.join("go.mod").is_file() || Some(dir) == home {
                break;
            }
            current = dir.parent();
        }
        found
    }

    pub fn get_merged_config(&self) -> Config {
        let mut config = Config::default();
        for (_, layer) in self.configs.iter().rev() {
            config.merge(layer.clone());
        }
        config
    }

    /// Paths of the loaded files, closest first.
    pub fn config_paths(&self) -> impl Iterator<Item = &Path> {
        self.configs.iter().map(|(path, _)| path.as_path())
    }
}
