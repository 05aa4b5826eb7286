//! doxybib: turn a BibTeX database into a Doxygen-ready reference page.
//!
//! This library provides functionality to:
//! - Run LaTeX and BibTeX over a synthetic document citing every entry
//! - Rewrite the resulting `.bbl` into Markdown with HTML entities
//! - Write the reference page behind a fixed header

pub mod config;
pub mod driver;
pub mod output;
pub mod rules;
pub mod toolchain;

pub use config::{Config, ConfigError};
pub use driver::{convert, count_entries, Driver, DriverError, Summary};
pub use output::{render_document, DEFAULT_HEADER};
pub use rules::{Rule, RuleError, SubstitutionTable, BBL_TO_MARKDOWN};
pub use toolchain::{synthesize_document, LatexBibtex, Toolchain, ToolchainError};
