//! Run configuration.
//!
//! Everything the driver would otherwise take from the ambient process
//! (working directory, tool names, database and style names) lives here.
//! A config can be loaded from a TOML file; missing keys fall back to the
//! defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory the tools run in; relative paths below resolve against it.
    pub workdir: PathBuf,
    /// Bibliography database name, without the `.bib` extension.
    pub database: String,
    /// BibTeX style name, without the `.bst` extension.
    pub style: String,
    /// LaTeX job name; the intermediate file is `<jobname>.bbl`.
    pub jobname: String,
    pub output: PathBuf,
    pub latex: String,
    pub latex_args: Vec<String>,
    pub bibtex: String,
    /// Replaces the built-in page header when set.
    pub header_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            database: "ice_bib".to_string(),
            style: "doxybib".to_string(),
            jobname: "texput".to_string(),
            output: PathBuf::from("references.md"),
            latex: "latex".to_string(),
            latex_args: Vec::new(),
            bibtex: "bibtex".to_string(),
            header_file: None,
        }
    }
}

impl Config {
    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// contains unknown keys.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Path of the intermediate citation list produced by BibTeX.
    pub fn bbl_path(&self) -> PathBuf {
        self.workdir.join(format!("{}.bbl", self.jobname))
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output)
    }

    pub fn header_path(&self) -> Option<PathBuf> {
        self.header_file.as_deref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }
}
