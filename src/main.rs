//! CLI for doxybib - Build a Doxygen reference page from a BibTeX database.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use doxybib::output::write_document;
use doxybib::{
    convert, count_entries, Config, Driver, DriverError, LatexBibtex,
    SubstitutionTable, DEFAULT_HEADER,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Build a Doxygen reference page from a BibTeX database
#[derive(Parser)]
#[command(name = "doxybib")]
#[command(version)]
#[command(after_help = "\
Examples:
  doxybib
  doxybib build
  doxybib build --workdir doc/browser --bib ice_bib --style doxybib
  doxybib convert texput.bbl -o references.md
  doxybib rules")]
struct Cli {
    /// TOML config file; command-line flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    // No subcommand runs `build` with the config file's values.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run LaTeX and BibTeX, then convert the .bbl into the reference page
    Build {
        /// Directory the tools run in (default: current directory)
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Bibliography database name, without .bib
        #[arg(long)]
        bib: Option<String>,

        /// BibTeX style name, without .bst
        #[arg(long)]
        style: Option<String>,

        /// LaTeX job name; BibTeX writes <jobname>.bbl
        #[arg(long)]
        jobname: Option<String>,

        /// Output file, relative to the working directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// LaTeX executable
        #[arg(long)]
        latex: Option<String>,

        /// BibTeX executable
        #[arg(long)]
        bibtex: Option<String>,
    },

    /// Convert an existing .bbl file without running any external tool
    Convert {
        /// Input .bbl file (use '-' for stdin)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the substitution rules in application order
    Rules,
}

// ---------------------------------------------------------------------------
// AppError — semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10 — config file unreadable or invalid
    Config(String),
    /// Exit 11 — substitution rule does not compile
    Rule(String),
    /// Exit 12 — external tool could not be started
    Tool(String),
    /// Exit 13 — intermediate citation list missing or unreadable
    Intermediate(String),
    /// Exit 14 — cannot write output file
    OutputFile(String),
    /// Exit 15 — input .bbl file unreadable
    InputFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 10,
            AppError::Rule(_) => 11,
            AppError::Tool(_) => 12,
            AppError::Intermediate(_) => 13,
            AppError::OutputFile(_) => 14,
            AppError::InputFile(_) => 15,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => {
                write!(
                    f,
                    "{}\n  hint: see 'doxybib build --help' for the accepted keys",
                    msg
                )
            }
            AppError::Rule(msg) => write!(f, "{}", msg),
            AppError::Tool(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that LaTeX and BibTeX are installed and on PATH",
                    msg
                )
            }
            AppError::Intermediate(msg) => {
                write!(
                    f,
                    "{}\n  hint: LaTeX or BibTeX did not produce a citation list; rerun with -vv to see their output",
                    msg
                )
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
            AppError::InputFile(msg) => {
                write!(f, "{}\n  hint: verify the file path is correct", msg)
            }
        }
    }
}

impl From<DriverError> for AppError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::Rules(_) => AppError::Rule(e.to_string()),
            DriverError::Header { .. } => AppError::Config(e.to_string()),
            DriverError::Toolchain(_) => AppError::Tool(e.to_string()),
            DriverError::Read { .. } => AppError::Intermediate(e.to_string()),
            DriverError::Write { .. } => AppError::OutputFile(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        None => build_command(config)?,
        Some(Commands::Build {
            workdir,
            bib,
            style,
            jobname,
            output,
            latex,
            bibtex,
        }) => {
            let config = Config {
                workdir: workdir.unwrap_or(config.workdir),
                database: bib.unwrap_or(config.database),
                style: style.unwrap_or(config.style),
                jobname: jobname.unwrap_or(config.jobname),
                output: output.unwrap_or(config.output),
                latex: latex.unwrap_or(config.latex),
                bibtex: bibtex.unwrap_or(config.bibtex),
                ..config
            };
            build_command(config)?;
        }
        Some(Commands::Convert { input, output }) => {
            convert_command(&config, &input, output.as_deref())?;
        }
        Some(Commands::Rules) => {
            rules_command()?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config, AppError> {
    match path {
        Some(path) => Config::load(path)
            .map_err(|e| AppError::Config(format!("'{}': {}", path.display(), e))),
        None => Ok(Config::default()),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Run the full pipeline.
fn build_command(config: Config) -> Result<(), AppError> {
    let driver = Driver::new(config)?;
    info!(workdir = %driver.config().workdir.display(), "building reference page");
    let summary = driver.run(&LatexBibtex)?;

    info!(?summary, "build finished");
    eprintln!(
        "converted {} entries, wrote {}",
        summary.entries,
        summary.output.display()
    );
    Ok(())
}

/// Convert a .bbl file that is already on disk.
fn convert_command(config: &Config, input: &Path, output: Option<&Path>) -> Result<(), AppError> {
    // 1. Read the .bbl as bytes (support '-' for stdin)
    let bbl = if input == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| AppError::InputFile(format!("failed to read from stdin: {}", e)))?;
        buf
    } else {
        fs::read(input).map_err(|e| AppError::InputFile(format!("'{}': {}", input.display(), e)))?
    };

    // 2. Pick the header; a bad header_file is a config problem, as in `build`
    let header = match config.header_path() {
        Some(path) => fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("failed to read header '{}': {}", path.display(), e))
        })?,
        None => DEFAULT_HEADER.to_string(),
    };

    // 3. Convert
    let table = SubstitutionTable::bbl_to_markdown().map_err(|e| AppError::Rule(e.to_string()))?;
    let page = convert(&table, &header, &bbl);

    // 4. Write to file or stdout
    if let Some(output_path) = output {
        write_document(output_path, &page)
            .map_err(|e| AppError::OutputFile(format!("'{}': {}", output_path.display(), e)))?;
        eprintln!(
            "converted {} entries, wrote {}",
            count_entries(&String::from_utf8_lossy(&bbl)),
            output_path.display()
        );
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(&page)
            .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;
    }

    Ok(())
}

/// Print the substitution table in application order.
fn rules_command() -> Result<(), AppError> {
    let table = SubstitutionTable::bbl_to_markdown().map_err(|e| AppError::Rule(e.to_string()))?;
    for rule in table.rules() {
        println!(
            "{}\t{}\t{}",
            rule.pattern(),
            rule.replacement(),
            rule.description()
        );
    }
    Ok(())
}
