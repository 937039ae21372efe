//! biblio-bibtex binary
//!
//! Reads a BibTeX file and writes it back normalized, sorted, with
//! crossrefs resolved, or as JSON.

use std::io::Write;
use std::path::{Path, PathBuf};

use biblio_bibtex::{
    load, move_crossrefed_to_end, resolve_all, save, sort_by_identifier, BibTeXParseResult, Config,
};
use biblio_domain::{validate_entry, BibTeXStyle, File, ValidationSeverity};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "biblio-bibtex", about = "Read, check and rewrite BibTeX files", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: <config dir>/biblio/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the file back in normalized form.
    Format {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output encoding, e.g. UTF-8, ISO-8859-1 or LaTeX
        #[arg(long)]
        encoding: Option<String>,
    },

    /// Report syntax warnings, duplicate keys and missing required fields.
    Check { input: PathBuf },

    /// Sort entries by identifier.
    Sort {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep the order, only move crossref'ed entries to the end
        #[arg(long)]
        crossrefed_to_end: bool,
    },

    /// Copy inherited fields into every entry with a crossref.
    Resolve {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump the parsed model as JSON.
    Json { input: PathBuf },
}

fn read(path: &Path, style: &BibTeXStyle) -> Result<BibTeXParseResult, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let result = load(&bytes, style);
    info!(
        path = %path.display(),
        elements = result.file.len(),
        warnings = result.warnings.len(),
        "parsed"
    );
    Ok(result)
}

fn write(
    file: &File,
    config: &Config,
    style: &BibTeXStyle,
    encoding: Option<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = config.options_for(file);
    if let Some(encoding) = encoding {
        options.encoding = encoding;
    }
    let bytes = save(file, &options, style)?;

    match output {
        Some(path) => std::fs::write(path, bytes)?,
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

/// Print every problem found; returns how many were errors
fn check(result: &BibTeXParseResult, style: &BibTeXStyle) -> usize {
    let mut errors = 0;

    for warning in &result.warnings {
        println!("warning: {}", warning);
    }
    for key in result.file.duplicate_keys() {
        println!("error: duplicate key {}", key);
        errors += 1;
    }
    for entry in result.file.entries() {
        for problem in validate_entry(entry, style) {
            let label = match problem.severity {
                ValidationSeverity::Error => {
                    errors += 1;
                    "error"
                }
                ValidationSeverity::Warning => "warning",
            };
            println!(
                "{}: {} ({}): {}",
                label,
                entry.id,
                style.entry_label(entry),
                problem.message
            );
        }
    }

    errors
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let style = config.style()?;

    match cli.command {
        Commands::Format {
            input,
            output,
            encoding,
        } => {
            let result = read(&input, &style)?;
            write(&result.file, &config, &style, encoding, output.as_deref())?;
        }
        Commands::Check { input } => {
            let result = read(&input, &style)?;
            let errors = check(&result, &style);
            if errors > 0 {
                std::process::exit(1);
            }
        }
        Commands::Sort {
            input,
            output,
            crossrefed_to_end,
        } => {
            let result = read(&input, &style)?;
            let sorted = if crossrefed_to_end {
                move_crossrefed_to_end(&result.file)
            } else {
                sort_by_identifier(&result.file)
            };
            write(&sorted, &config, &style, None, output.as_deref())?;
        }
        Commands::Resolve { input, output } => {
            let result = read(&input, &style)?;
            write(&resolve_all(&result.file), &config, &style, None, output.as_deref())?;
        }
        Commands::Json { input } => {
            let result = read(&input, &style)?;
            println!("{}", serde_json::to_string_pretty(&result.file)?);
        }
    }

    Ok(())
}
