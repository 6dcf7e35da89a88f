use anyhow::{Context, Result};
use gomockgen_core::generator::{Generator, Normalizer, Options};
use gomockgen_core::{
    Config, ConfigMerger, Formatter, GoEnv, Importer, Qualification, SourceLoader, Template,
    Unformatted,
};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::utils::{split_command_line, write_output};

/// Options after layering the command line over config files.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub mock_package: Option<String>,
    pub names: HashMap<String, String>,
    pub substitutions: BTreeMap<String, String>,
    pub template: Option<PathBuf>,
    pub out: Option<PathBuf>,
    /// `Some(vec![])` disables formatting.
    pub formatter: Option<Vec<String>>,
}

impl Settings {
    /// Command line flags win over config values; maps are merged.
    /// Relative command line paths are taken relative to `dir`.
    pub fn resolve(cli: &Cli, dir: &Path, config: Config) -> Self {
        let relative_to_dir = |p: &PathBuf| dir.join(p);

        let mut names: HashMap<String, String> = config.names.into_iter().collect();
        names.extend(cli.names.iter().cloned());
        let mut substitutions = config.substitutions;
        substitutions.extend(cli.substitutions.iter().cloned());

        Self {
            mock_package: cli.mock_package.clone().or(config.package),
            names,
            substitutions,
            template: cli.template.as_ref().map(relative_to_dir).or(config.template),
            out: cli.out.as_ref().map(relative_to_dir).or(config.out),
            formatter: cli
                .formatter
                .as_deref()
                .map(|f| split_command_line(f).unwrap_or_default())
                .or(config.formatter),
        }
    }

    /// Output file beats output package name; otherwise the package's own
    /// import path decides.
    pub fn qualification(&self) -> Result<Option<Qualification>> {
        if let Some(out) = &self.out {
            let dir = out.parent().unwrap_or_else(|| Path::new("."));
            let qualification = Qualification::by_directory(dir)
                .with_context(|| format!("Invalid output directory {}", dir.display()))?;
            return Ok(Some(qualification));
        }
        Ok(self.mock_package.clone().map(Qualification::ByName))
    }

    pub fn normalizer(&self, dir: &Path) -> Result<Box<dyn Normalizer>> {
        Ok(match &self.formatter {
            None => Box::new(Formatter::goimports().with_working_dir(dir)),
            Some(command) if command.is_empty() => Box::new(Unformatted),
            Some(command) => {
                let formatter = Formatter::from_command_line(command)?;
                debug!("Formatting with {}", formatter.program());
                Box::new(formatter.with_working_dir(dir))
            }
        })
    }

    pub fn template(&self) -> Result<Template> {
        let template = match &self.template {
            Some(path) => Template::from_file(path)
                .with_context(|| format!("Failed to load template {}", path.display()))?,
            None => Template::default_template()?,
        };
        debug!("Using template {}", template.name());
        Ok(template)
    }

    pub fn options(&self) -> Options {
        Options {
            mock_package: self.mock_package.clone(),
            mock_names: self.names.clone(),
            file_name: self.out.clone(),
            substitutions: self.substitutions.clone(),
        }
    }
}

pub fn generate_command(cli: &Cli) -> Result<()> {
    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let dir = dir
        .canonicalize()
        .with_context(|| format!("Invalid working directory {}", dir.display()))?;
    debug!("Working directory: {}", dir.display());

    let mut merger = ConfigMerger::new();
    merger.load_configs_for_path(&dir)?;
    for path in merger.config_paths() {
        info!("Using config {}", path.display());
    }
    let settings = Settings::resolve(cli, &dir, merger.get_merged_config());
    debug!("Settings: {:?}", settings);

    let loader = SourceLoader::new(GoEnv::from_env(&dir))?;
    let mut importer = Importer::new(loader);
    if let Some(qualification) = settings.qualification()? {
        importer = importer.with_qualification(qualification);
    }

    let generator = Generator::new(importer, settings.template()?, settings.normalizer(&dir)?);
    let source = generator
        .generate(&cli.package, &settings.options(), &cli.interfaces)
        .with_context(|| format!("Failed to generate mocks for {}", cli.package))?;

    write_output(settings.out.as_deref(), &source)?;
    if let Some(out) = &settings.out {
        info!("Wrote {}", out.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> Cli {
        Cli {
            package: "./a".to_string(),
            ..Cli::default()
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            package: Some("fromconfig".to_string()),
            names: BTreeMap::from([("A".to_string(), "MockA".to_string())]),
            substitutions: BTreeMap::from([
                ("x".to_string(), "config".to_string()),
                ("y".to_string(), "config".to_string()),
            ]),
            formatter: Some(vec!["goimports".to_string()]),
            ..Config::default()
        };
        let cli = Cli {
            mock_package: Some("mocks".to_string()),
            substitutions: vec![("y".to_string(), "flag".to_string())],
            out: Some(PathBuf::from("mocks/mock_a.go")),
            formatter: Some("none".to_string()),
            ..cli()
        };

        let settings = Settings::resolve(&cli, Path::new("/work"), config);

        assert_eq!(settings.mock_package.as_deref(), Some("mocks"));
        assert_eq!(settings.names["A"], "MockA");
        assert_eq!(settings.substitutions["x"], "config");
        assert_eq!(settings.substitutions["y"], "flag");
        assert_eq!(settings.out, Some(PathBuf::from("/work/mocks/mock_a.go")));
        assert_eq!(settings.formatter, Some(Vec::new()));
    }

    #[test]
    fn test_qualification_precedence() {
        let by_name = Settings {
            mock_package: Some("mocks".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            by_name.qualification().unwrap(),
            Some(Qualification::ByName("mocks".to_string()))
        );

        let temp = tempfile::TempDir::new().unwrap();
        let out_dir = temp.path().canonicalize().unwrap();
        let by_dir = Settings {
            mock_package: Some("mocks".to_string()),
            out: Some(out_dir.join("mock.go")),
            ..Settings::default()
        };
        assert_eq!(
            by_dir.qualification().unwrap(),
            Some(Qualification::ByDirectory(out_dir))
        );

        assert_eq!(Settings::default().qualification().unwrap(), None);
    }
}
