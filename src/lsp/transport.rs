//! Transport layer - stdio
//!
//! Framing is handled by tower-lsp; logging must go to stderr so it never
//! mixes with protocol messages on stdout.

use std::sync::Arc;

use tower_lsp::{LspService, Server};
use tracing::info;

use super::backend::Backend;
use crate::catalog::Catalog;

/// Run the LSP server over stdio until the client disconnects.
pub async fn run_stdio(catalog: Arc<dyn Catalog>) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(move |client| Backend::new(client, catalog));

    info!("serving language server on stdio");
    Server::new(stdin, stdout, socket).serve(service).await;
}
