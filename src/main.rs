//! @ai:module:intent CLI entry point for the rstdoc docstring checker
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on checker, config, output

use clap::{ArgAction, Parser, ValueEnum};
use rstdoc::{checker, output, Category, CheckConfig, OutputFormat};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rstdoc")]
#[command(
    author,
    version,
    about = "Check that reST docstrings agree with Python function signatures"
)]
struct Cli {
    /// Files or directories to check
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Configuration file (defaults to rstdoc.toml or [tool.rstdoc] in pyproject.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Diagnostic category to ignore (repeatable)
    #[arg(long, value_name = "CATEGORY")]
    ignore: Vec<Category>,

    /// Require :rtype: on functions annotated `-> None`
    #[arg(long)]
    require_rtype_for_none: bool,

    /// Check methods inside class bodies
    #[arg(long, overrides_with = "no_methods")]
    methods: bool,

    /// Only check module-level functions
    #[arg(long, overrides_with = "methods")]
    no_methods: bool,

    /// Number of worker threads
    #[arg(long, short)]
    jobs: Option<usize>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: Format,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    match checker::check_paths(&cli.paths, &config) {
        Ok(result) => {
            let format = OutputFormat::from(cli.format);
            let rendered = output::format_check_result(&result, format);
            if !rendered.is_empty() {
                println!("{}", rendered);
            }
            if format == OutputFormat::Text {
                eprint!("{}", output::format_summary(&result));
            }

            if result.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rstdoc={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Configuration file first, then command-line overrides.
fn resolve_config(cli: &Cli) -> rstdoc::Result<CheckConfig> {
    let mut config = match &cli.config {
        Some(path) => CheckConfig::load(path)?,
        None => CheckConfig::discover(Path::new("."))?,
    };

    config.ignore_categories.extend(cli.ignore.iter().copied());
    if cli.require_rtype_for_none {
        config.require_rtype_for_none = true;
    }
    if cli.methods {
        config.include_methods = true;
    }
    if cli.no_methods {
        config.include_methods = false;
    }
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }

    Ok(config)
}
