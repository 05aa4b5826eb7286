//! The conversion pipeline: prepare, typeset, load, transform, emit.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::output::{render_document, write_document, DEFAULT_HEADER};
use crate::rules::{RuleError, SubstitutionTable};
use crate::toolchain::{synthesize_document, Toolchain, ToolchainError};

/// Errors that can occur during a driver run.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("failed to read header '{}': {source}", path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub output: PathBuf,
    pub intermediate: PathBuf,
    /// Number of `\bibitem`s in the intermediate file.
    pub entries: usize,
    /// Size of the converted body in bytes, header excluded.
    pub body_len: usize,
}

/// Counts `\bibitem` entries in a `.bbl` body.
pub fn count_entries(bbl: &str) -> usize {
    const BIBITEM: &str = r"\bibitem";
    bbl.match_indices(BIBITEM)
        .filter(|(start, _)| {
            !bbl[start + BIBITEM.len()..]
                .chars()
                .next()
                .is_some_and(char::is_alphabetic)
        })
        .count()
}

/// Converts a `.bbl` body into a complete reference page.
pub fn convert(table: &SubstitutionTable, header: &str, bbl: &[u8]) -> Vec<u8> {
    render_document(header, &table.apply_bytes(bbl))
}

/// Runs the whole pipeline for one config.
pub struct Driver {
    config: Config,
    table: SubstitutionTable,
}

impl Driver {
    /// Creates a driver with the built-in substitution table.
    ///
    /// # Errors
    ///
    /// Fails if the table does not compile, before any file is touched.
    pub fn new(config: Config) -> Result<Self, DriverError> {
        Ok(Self::with_table(config, SubstitutionTable::bbl_to_markdown()?))
    }

    pub fn with_table(config: Config, table: SubstitutionTable) -> Self {
        Self { config, table }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the pipeline.
    ///
    /// The output file is only opened once the intermediate file has been
    /// read and converted, so a failing run leaves it untouched.
    pub fn run(&self, toolchain: &dyn Toolchain) -> Result<Summary, DriverError> {
        let bbl_path = self.config.bbl_path();
        let output_path = self.config.output_path();

        // Custom header is read before the tools run.
        let header = self.header()?;

        remove_stale(&bbl_path);

        let document = synthesize_document(&self.config.database, &self.config.style);
        debug!(document = %document, "synthetic document");
        toolchain.produce(&document, &self.config)?;

        let bbl = read(&bbl_path)?;
        let text = String::from_utf8_lossy(&bbl);
        if let Cow::Owned(_) = text {
            warn!(path = %bbl_path.display(), "intermediate citation list is not UTF-8; bytes are copied through as is");
        }
        let entries = count_entries(&text);
        info!(path = %bbl_path.display(), entries, "loaded intermediate citation list");

        let body = self.table.apply_bytes(&bbl);
        let page = render_document(&header, &body);

        write_document(&output_path, &page).map_err(|source| DriverError::Write {
            path: output_path.clone(),
            source,
        })?;
        info!(path = %output_path.display(), "wrote reference page");

        Ok(Summary {
            output: output_path,
            intermediate: bbl_path,
            entries,
            body_len: body.len(),
        })
    }

    fn header(&self) -> Result<String, DriverError> {
        match self.config.header_path() {
            Some(path) => {
                fs::read_to_string(&path).map_err(|source| DriverError::Header { path, source })
            }
            None => Ok(DEFAULT_HEADER.to_string()),
        }
    }
}

/// Best-effort removal of a `.bbl` left over from an earlier run.
fn remove_stale(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale intermediate file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove stale intermediate file"),
    }
}

fn read(path: &Path) -> Result<Vec<u8>, DriverError> {
    fs::read(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })
}
