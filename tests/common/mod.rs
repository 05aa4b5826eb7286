//! Shared test constants and helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;

use doxybib::{Config, Toolchain, ToolchainError};

/// A small `.bbl` as BibTeX would leave it, with a wrapped line and a link.
pub const SAMPLE_BBL: &str = "\\begin{thebibliography}{2}

\\bibitem{Aschwanden}
A.~Aschwanden and E.~Bueler. An enthalpy formulation, 2012. 441--457.
\\href{http://dx.doi.org/10.3189/2012JoG11J088}{doi:10.3189/2012JoG11J088}

\\bibitem{Bueler}
E.~Bueler. Notes at \\url{http://www.dms.uaf.edu/$\\sim$bueler/Notes%
.pdf}.

\\end{thebibliography}
";

/// Stands in for LaTeX + BibTeX: writes a fixed `.bbl`, or nothing.
pub struct StubToolchain {
    bbl: Option<Vec<u8>>,
    pub documents: RefCell<Vec<String>>,
}

impl StubToolchain {
    pub fn writing(bbl: &str) -> Self {
        Self::writing_bytes(bbl.as_bytes())
    }

    /// Writes the `.bbl` byte for byte, for encodings other than UTF-8.
    pub fn writing_bytes(bbl: &[u8]) -> Self {
        Self {
            bbl: Some(bbl.to_vec()),
            documents: RefCell::new(Vec::new()),
        }
    }

    /// Simulates tools that ran but produced no citation list.
    pub fn silent() -> Self {
        Self {
            bbl: None,
            documents: RefCell::new(Vec::new()),
        }
    }
}

impl Toolchain for StubToolchain {
    fn produce(&self, document: &str, config: &Config) -> Result<(), ToolchainError> {
        self.documents.borrow_mut().push(document.to_string());
        if let Some(bbl) = &self.bbl {
            fs::write(config.bbl_path(), bbl).unwrap();
        }
        Ok(())
    }
}
