//! EEQL CLI - check and compile event queries, or serve the language server
//!
//! Usage:
//!   eeql check <file.eeql> [--catalog <catalog.toml>] [--format text|json]
//!   eeql compile <file.eeql> [--catalog <catalog.toml>] [--compact] [--emit sql|dataset]
//!   eeql events [--catalog <catalog.toml>]
//!   eeql lsp [--catalog <catalog.toml>]
//!
//! Without `--catalog`, the `[catalog] path` from `eeql.toml` is used, and
//! failing that the built-in demo catalog.

use clap::{Parser, Subcommand, ValueEnum};
use eeql::catalog::{self, Catalog, InMemoryCatalog};
use eeql::compile::{compile, CompileError, CompileOptions};
use eeql::config::Settings;
use eeql::dsl::{LineIndex, Span};
use eeql::lsp::{self, Diagnostic, DiagnosticSource, Severity};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eeql")]
#[command(about = "EEQL - an event query language that compiles to SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report syntax and validation errors in a query file
    Check {
        /// Path to the .eeql file
        file: PathBuf,

        /// Catalog file (.toml or .json)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Compile a query file to SQL
    Compile {
        /// Path to the .eeql file
        file: PathBuf,

        /// Catalog file (.toml or .json)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Emit the SQL on a single line
        #[arg(long)]
        compact: bool,

        /// What to print
        #[arg(short, long, default_value = "sql")]
        emit: Emit,
    },

    /// List the events in the catalog
    Events {
        /// Catalog file (.toml or .json)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Run the language server on stdio
    Lsp {
        /// Catalog file (.toml or .json)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Emit {
    Sql,
    Dataset,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings);

    match cli.command {
        Commands::Check {
            file,
            catalog,
            format,
        } => cmd_check(&settings, file, catalog, format),
        Commands::Compile {
            file,
            catalog,
            compact,
            emit,
        } => cmd_compile(&settings, file, catalog, compact, emit),
        Commands::Events { catalog } => cmd_events(&settings, catalog),
        Commands::Lsp { catalog } => cmd_lsp(&settings, catalog),
    }
}

/// Logs go to stderr; stdout carries query output or LSP traffic.
fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_env("EEQL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `--catalog`, then the configured path, then the demo catalog.
fn resolve_catalog(
    settings: &Settings,
    flag: Option<PathBuf>,
) -> Result<InMemoryCatalog, String> {
    let path = match flag {
        Some(p) => Some(p),
        None => settings.catalog.resolved_path().map_err(|e| e.to_string())?,
    };

    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading catalog");
            catalog::load_catalog(&p)
                .map_err(|e| format!("Error loading catalog '{}': {}", p.display(), e))
        }
        None => {
            tracing::info!("no catalog configured, using demo catalog");
            Ok(catalog::demo::build())
        }
    }
}

fn read_source(file: &Path) -> Result<String, String> {
    fs::read_to_string(file).map_err(|e| format!("Error reading file '{}': {}", file.display(), e))
}

fn cmd_check(
    settings: &Settings,
    file: PathBuf,
    catalog: Option<PathBuf>,
    format: OutputFormat,
) -> ExitCode {
    let catalog = match resolve_catalog(settings, catalog) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let source = match read_source(&file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let diagnostics = lsp::diagnostics(&source, &catalog);

    match format {
        OutputFormat::Text => {
            let name = file.display().to_string();
            for diag in &diagnostics {
                if let Err(e) = print_report(&name, &source, diag) {
                    eprintln!("Error writing report: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            if diagnostics.is_empty() {
                println!("OK: {} is valid", name);
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    if diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_compile(
    settings: &Settings,
    file: PathBuf,
    catalog: Option<PathBuf>,
    compact: bool,
    emit: Emit,
) -> ExitCode {
    let catalog = match resolve_catalog(settings, catalog) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let source = match read_source(&file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = CompileOptions::default().with_pretty(settings.compile.pretty && !compact);

    match compile(&source, &catalog, options) {
        Ok(output) => {
            match emit {
                Emit::Sql => println!("{}", output.sql),
                Emit::Dataset => match serde_json::to_string_pretty(&output.dataset) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing dataset: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.span() {
                Some(span) => {
                    let source_kind = match e {
                        CompileError::Syntax(_) => DiagnosticSource::Syntax,
                        _ => DiagnosticSource::Validation,
                    };
                    let diag = Diagnostic {
                        message: e.to_string(),
                        span,
                        severity: Severity::Error,
                        source: source_kind,
                    };
                    if let Err(io) = print_report(&file.display().to_string(), &source, &diag) {
                        eprintln!("Error writing report: {}", io);
                    }
                }
                None => eprintln!("Compilation error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_events(settings: &Settings, catalog: Option<PathBuf>) -> ExitCode {
    let catalog = match resolve_catalog(settings, catalog) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if catalog.is_empty() {
        println!("No events defined.");
        return ExitCode::SUCCESS;
    }

    println!("Events:");
    for name in catalog.list_event_names() {
        if let Some(event) = catalog.get_event(&name) {
            println!("  - {}", event.summary());
            println!("      table: {}", event.source_table);
        }
    }

    ExitCode::SUCCESS
}

fn cmd_lsp(settings: &Settings, catalog: Option<PathBuf>) -> ExitCode {
    let catalog: Arc<dyn Catalog> = match resolve_catalog(settings, catalog) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(lsp::run_stdio(catalog));
    ExitCode::SUCCESS
}

fn byte_range(index: &LineIndex<'_>, span: Span) -> Range<usize> {
    let start = index.offset(span.start());
    let end = index.offset(span.end()).max(start);
    start..end
}

fn print_report(name: &str, source: &str, diag: &Diagnostic) -> std::io::Result<()> {
    use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

    let index = LineIndex::new(source);
    let range = byte_range(&index, diag.span);
    let (kind, color) = match diag.severity {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
    };

    Report::build(kind, (name, range.clone()))
        .with_config(Config::default().with_index_type(IndexType::Byte))
        .with_code(diag.source.as_str())
        .with_message(&diag.message)
        .with_label(
            Label::new((name, range))
                .with_message(&diag.message)
                .with_color(color),
        )
        .finish()
        .eprint((name, Source::from(source)))
}
