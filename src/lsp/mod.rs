//! Language server for EEQL.
//!
//! The core is three pure functions over the document text and a catalog:
//! [`diagnostics`], [`completions`] and [`hover`]. [`backend::Backend`]
//! adapts them to the Language Server Protocol and
//! [`transport::run_stdio`] serves it.

pub mod analysis;
pub mod backend;
pub mod capabilities;
pub mod transport;
pub mod types;

// Re-export main entry points
pub use backend::Backend;
pub use capabilities::completions::completions;
pub use capabilities::diagnostics::diagnostics;
pub use capabilities::hover::hover;
pub use transport::run_stdio;
pub use types::{CompletionItem, CompletionKind, Diagnostic, DiagnosticSource, Hover, Severity};
