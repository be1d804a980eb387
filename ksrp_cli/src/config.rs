//! Configuration for the ksrp CLI
//!
//! Settings come from three layers: command line flags, an optional
//! `ksrp.yaml` file, and built-in defaults, in that order of precedence.

use anyhow::{bail, Context, Result};
use ksrp_gen::codegen::DEFAULT_INCLUDE_ROOT;
use ksrp_gen::{CompilerOptions, EmitterKind, NamingScheme};
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "ksrp.yaml";

/// Library skeleton copied into the output root by default
pub const DEFAULT_LIBRARY_DIR: &str = "library_source";

/// Contents of a `ksrp.yaml` file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub library_dir: Option<PathBuf>,
    pub include_root: Option<String>,
    pub prefix: Option<String>,
    pub emitter: Option<EmitterKind>,
}

impl FileConfig {
    /// Load a config file. Relative paths inside it are taken relative to
    /// the file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: FileConfig = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for dir in [
            &mut config.source_dir,
            &mut config.output_dir,
            &mut config.templates_dir,
            &mut config.library_dir,
        ]
        .into_iter()
        .flatten()
        {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }

        Ok(config)
    }
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub library_dir: Option<PathBuf>,
    pub no_library: bool,
    pub emitter: Option<EmitterKind>,
}

/// Where the library skeleton comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// Named explicitly; a missing directory is an error
    Explicit(PathBuf),
    /// The default location; skipped with a warning when absent
    Default(PathBuf),
    Disabled,
}

/// Fully resolved settings of one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_file: Option<PathBuf>,
    pub source_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub library: LibrarySource,
    pub options: CompilerOptions,
}

impl Settings {
    pub fn resolve(config: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let (config_file, file) = match config {
            Some(path) => (Some(path.to_path_buf()), FileConfig::load(path)?),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    (Some(path.to_path_buf()), FileConfig::load(path)?)
                } else {
                    (None, FileConfig::default())
                }
            }
        };
        if let Some(path) = &config_file {
            tracing::debug!(path = %path.display(), "loaded configuration file");
        }

        Self::merge(config_file, file, overrides)
    }

    fn merge(config_file: Option<PathBuf>, file: FileConfig, overrides: Overrides) -> Result<Self> {
        let Some(source_dir) = overrides.source_dir.or(file.source_dir) else {
            bail!("No source directory given; pass --source or set `source_dir` in {}", DEFAULT_CONFIG_FILE);
        };

        let library = if overrides.no_library {
            LibrarySource::Disabled
        } else {
            match overrides.library_dir.or(file.library_dir) {
                Some(dir) => LibrarySource::Explicit(dir),
                None => LibrarySource::Default(PathBuf::from(DEFAULT_LIBRARY_DIR)),
            }
        };

        let options = CompilerOptions {
            prefix: file.prefix.unwrap_or_else(|| NamingScheme::default().prefix),
            include_root: file.include_root.unwrap_or_else(|| DEFAULT_INCLUDE_ROOT.to_string()),
            emitter: overrides.emitter.or(file.emitter).unwrap_or_default(),
            templates_dir: overrides.templates_dir.or(file.templates_dir),
        };

        Ok(Self {
            config_file,
            source_dir,
            output_dir: overrides.output_dir.or(file.output_dir),
            library,
            options,
        })
    }

    pub fn require_output_dir(&self) -> Result<&Path> {
        match &self.output_dir {
            Some(dir) => Ok(dir),
            None => bail!("No output directory given; pass --output or set `output_dir` in {}", DEFAULT_CONFIG_FILE),
        }
    }
}
