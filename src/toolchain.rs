//! The external LaTeX/BibTeX step.
//!
//! From the driver's point of view this is one opaque operation: given the
//! synthetic document, leave `<jobname>.bbl` in the working directory. Exit
//! codes are logged but never fatal, since the first LaTeX pass always warns
//! about undefined citations. Whether the step worked is decided by the
//! driver when it reads the `.bbl` file.

use std::io::Write;
use std::process::{Command, ExitStatus, Output, Stdio};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Number of trailing output lines kept in debug logs.
const LOG_TAIL_LINES: usize = 20;

/// Errors that can occur when running the external tools.
#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("failed to start '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for '{tool}': {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Produces the intermediate citation list for a synthetic document.
pub trait Toolchain {
    /// Runs the tools in `config.workdir`.
    ///
    /// Implementations must not treat a tool's non-zero exit as an error.
    fn produce(&self, document: &str, config: &Config) -> Result<(), ToolchainError>;
}

/// Builds the LaTeX document that `\cite{*}`s every database entry.
pub fn synthesize_document(database: &str, style: &str) -> String {
    format!(
        "\\documentclass{{article}}\n\
         \\begin{{document}}\n\
         \\cite{{*}}\\bibliography{{{database}}}\\bibliographystyle{{{style}}}\n\
         \\end{{document}}\n"
    )
}

/// `latex` fed through a pipe, then `bibtex <jobname>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexBibtex;

impl Toolchain for LatexBibtex {
    fn produce(&self, document: &str, config: &Config) -> Result<(), ToolchainError> {
        let mut latex = Command::new(&config.latex);
        latex.args(&config.latex_args).current_dir(&config.workdir);
        run_with_stdin(&config.latex, latex, document)?;

        let mut bibtex = Command::new(&config.bibtex);
        bibtex.arg(&config.jobname).current_dir(&config.workdir);
        run(&config.bibtex, bibtex)?;

        Ok(())
    }
}

fn run_with_stdin(tool: &str, mut cmd: Command, input: &str) -> Result<(), ToolchainError> {
    info!(tool, "running");
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolchainError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    // A tool that exits before reading everything closes the pipe early;
    // its exit status and the .bbl file tell the rest of the story.
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(input.as_bytes()) {
            warn!(tool, error = %e, "could not write the whole document to stdin");
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|source| ToolchainError::Wait {
            tool: tool.to_string(),
            source,
        })?;
    report(tool, &output);
    Ok(())
}

fn run(tool: &str, mut cmd: Command) -> Result<(), ToolchainError> {
    info!(tool, "running");
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ToolchainError::Spawn {
            tool: tool.to_string(),
            source,
        })?;
    report(tool, &output);
    Ok(())
}

fn report(tool: &str, output: &Output) {
    if !output.status.success() {
        warn!(tool, status = %describe(output.status), "tool exited unsuccessfully");
    }
    for (stream, bytes) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
        let text = String::from_utf8_lossy(bytes);
        let tail = tail_lines(&text, LOG_TAIL_LINES);
        if !tail.is_empty() {
            debug!(tool, stream, "{}", tail);
        }
    }
}

fn describe(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Last `n` lines of `text`, joined by newlines.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_synthesize_document() {
        // Given: the default database and style names
        // When: we build the synthetic document
        let document = synthesize_document("ice_bib", "doxybib");

        // Then: it cites everything against that database and style
        assert_eq!(
            document,
            "\\documentclass{article}\n\
             \\begin{document}\n\
             \\cite{*}\\bibliography{ice_bib}\\bibliographystyle{doxybib}\n\
             \\end{document}\n"
        );
    }

    #[test]
    fn test_synthesize_document_custom_names() {
        let document = synthesize_document("refs", "plain");
        assert!(document.contains(r"\bibliography{refs}"));
        assert!(document.contains(r"\bibliographystyle{plain}"));
    }

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail_lines("a\nb", 5), "a\nb");
        assert_eq!(tail_lines("", 3), "");
    }

    #[test]
    fn test_missing_tool_is_a_spawn_error() {
        // Given: a config naming a tool that is not on PATH
        let config = Config {
            latex: "doxybib-no-such-latex".to_string(),
            ..Config::default()
        };

        // When: we run the toolchain
        let result = LatexBibtex.produce("", &config);

        // Then: the process layer error surfaces, naming the tool
        match result {
            Err(ToolchainError::Spawn { tool, .. }) => assert_eq!(tool, "doxybib-no-such-latex"),
            other => panic!("expected Spawn error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_not_fatal() {
        // Given: tools that always fail
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            workdir: dir.path().to_path_buf(),
            latex: "false".to_string(),
            bibtex: "false".to_string(),
            ..Config::default()
        };

        // When: we run the toolchain
        let result = LatexBibtex.produce(&synthesize_document("a", "b"), &config);

        // Then: the step still completes
        assert!(result.is_ok(), "got: {:?}", result);
    }
}
