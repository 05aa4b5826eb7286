//! The `.bbl` to Markdown substitution table.
//!
//! BibTeX emits a small, predictable subset of LaTeX. Rather than parsing it,
//! the body is rewritten by an ordered list of regex rules, each applied
//! globally over the whole text before the next one runs.
//!
//! Order matters: the `\href`/`\url` rules have to see their braces before
//! the generic command stripper removes them, the em-dash rule has to run
//! before the en-dash rule, and `$\sim$` must become `~` before ties are
//! turned into `&nbsp;`.
//!
//! Rules match bytes rather than `str`: BibTeX copies the `.bib` bytes
//! through unchanged, so a Latin-1 database gives a `.bbl` that is not
//! UTF-8, and those bytes must survive the conversion untouched.

use regex::bytes::Regex;
use thiserror::Error;

/// Errors that can occur when building a substitution table.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid pattern for rule '{description}': {source}")]
    InvalidPattern {
        description: String,
        #[source]
        source: regex::Error,
    },
}

/// Declarative form of a rule: (pattern, replacement, description).
///
/// Replacements use the `regex` crate syntax, so capture groups are written
/// `$1` or `${1}` when followed by a word character.
pub type RuleSpec = (&'static str, &'static str, &'static str);

/// Single source of truth for the default conversion, in application order.
pub const BBL_TO_MARKDOWN: &[RuleSpec] = &[
    (r"%\r?\n", "", "lines wrapped by BibTeX"),
    (r"\\href\{((?-u:[^}])*)\}\{((?-u:[^}])*)\}", "[$2]($1)", "hyperref \\href command"),
    (r"\\url\{((?-u:[^}])*)\}", "[$1]($1)", "hyperref \\url command"),
    (r"\\\w*\{((?-u:[^}])*)\}", " $1 ", "other LaTeX commands"),
    (r"[}{]", "", "curly braces"),
    (r"\$\\sim\$", "~", "$\\sim$ used to represent ~"),
    (r"---", "&mdash;", "em-dash"),
    (r"--", "&ndash;", "en-dash"),
    (r"((?-u:[^/]))~", "$1&nbsp;", "ties that are not in URLs"),
    (r#"\\"([a-zA-Z])"#, "&${1}uml;", "umlaut"),
    (r"\\`([a-zA-Z])", "&${1}grave;", "grave accent"),
    (r"\\'([a-zA-Z])", "&${1}acute;", "acute accent"),
    (r"\\\^([a-zA-Z])", "&${1}circ;", "circumflex"),
    (r"``", "\"", "opening quotes"),
    (r"''", "\"", "closing quotes"),
    (r"\\,", "", "thin space"),
    (r"\\ae", "&aelig;", "ae ligature"),
    (r"\\tt", r"\c", "typewriter font"),
];

/// A compiled rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: String,
    description: String,
}

impl Rule {
    /// Compiles a single rule.
    pub fn new(pattern: &str, replacement: &str, description: &str) -> Result<Self, RuleError> {
        let pattern = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            description: description.to_string(),
            source,
        })?;
        Ok(Self {
            pattern,
            replacement: replacement.to_string(),
            description: description.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replaces every non-overlapping match in `bytes`.
    pub fn apply_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        self.pattern
            .replace_all(bytes, self.replacement.as_bytes())
            .into_owned()
    }

    pub fn apply(&self, text: &str) -> String {
        String::from_utf8_lossy(&self.apply_bytes(text.as_bytes())).into_owned()
    }
}

/// An ordered sequence of rules.
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    rules: Vec<Rule>,
}

impl SubstitutionTable {
    /// Compiles every spec up front, so a bad pattern fails before any
    /// text is touched.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, RuleError> {
        let rules = specs
            .iter()
            .map(|(pattern, replacement, description)| Rule::new(pattern, replacement, description))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The built-in `.bbl` to Markdown table.
    pub fn bbl_to_markdown() -> Result<Self, RuleError> {
        Self::compile(BBL_TO_MARKDOWN)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs each rule over the whole input, in table order.
    pub fn apply_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        self.rules
            .iter()
            .fold(bytes.to_vec(), |body, rule| rule.apply_bytes(&body))
    }

    /// UTF-8 convenience over [`apply_bytes`](Self::apply_bytes); valid
    /// input stays valid since every replacement is UTF-8.
    pub fn apply(&self, text: &str) -> String {
        String::from_utf8_lossy(&self.apply_bytes(text.as_bytes())).into_owned()
    }
}
