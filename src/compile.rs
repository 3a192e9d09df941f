//! End-to-end compilation from EEQL text to SQL.
//!
//! ```text
//! Source → Parse → AST → Validate (Catalog) → Lower (Catalog) → Dataset → SQL
//! ```
//!
//! # Example
//!
//! ```
//! use eeql::catalog::demo;
//! use eeql::compile::{compile, CompileOptions};
//!
//! let catalog = demo::build();
//! let output = compile(
//!     "select first user_signed_up ( plan as plan ) \
//!      join after user_logged_in ( count(event_id) as logins )",
//!     &catalog,
//!     CompileOptions::default(),
//! )?;
//! assert!(output.sql.contains("user_logged_in"));
//! # Ok::<(), eeql::compile::CompileError>(())
//! ```

use tracing::debug;

use crate::catalog::Catalog;
use crate::compiler::{compile_to_dataset, Dataset, LoweringError};
use crate::dsl::{self, Span, SyntaxError};
use crate::validation::{validate_query, ValidationError};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Lowering error: {0}")]
    Lowering(#[from] LoweringError),
}

impl CompileError {
    /// Source location of the error, when there is one.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Syntax(e) => Some(e.span),
            CompileError::Validation(e) => Some(e.span),
            CompileError::Lowering(_) => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// One clause per line (`true`) or a single line.
    pub pretty: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl CompileOptions {
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling a query to SQL.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated SQL string.
    pub sql: String,

    /// The resolved dataset the SQL was rendered from.
    pub dataset: Dataset,
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Parse, validate and lower `source`, then render SQL.
pub fn compile<C: Catalog + ?Sized>(
    source: &str,
    catalog: &C,
    options: CompileOptions,
) -> CompileResult<CompileOutput> {
    let dataset = compile_dataset(source, catalog)?;
    let sql = if options.pretty {
        dataset.to_sql()
    } else {
        dataset.to_sql_compact()
    };
    debug!(bytes = sql.len(), "rendered sql");
    Ok(CompileOutput { sql, dataset })
}

/// Parse, validate and lower `source` without rendering.
pub fn compile_dataset<C: Catalog + ?Sized>(source: &str, catalog: &C) -> CompileResult<Dataset> {
    let query = dsl::parse_with_spans(source)?;
    validate_query(&query, catalog)?;
    Ok(compile_to_dataset(&query, catalog)?)
}
