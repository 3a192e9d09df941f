//! LSP Backend - implements tower_lsp::LanguageServer
//!
//! Thin protocol adapter over the core functions in
//! [`capabilities`](super::capabilities): documents are stored in full,
//! and every request re-runs the core against the stored text.

use std::sync::Arc;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info};

use super::analysis::document::DocumentStore;
use super::capabilities::{completions, diagnostics, hover};
use super::types::{self, CompletionKind, Severity};
use crate::catalog::Catalog;
use crate::dsl;

/// The LSP backend state.
pub struct Backend {
    /// The LSP client for sending notifications back to the editor.
    client: Client,
    /// Shared, read-only catalog.
    catalog: Arc<dyn Catalog>,
    documents: DocumentStore,
}

impl Backend {
    pub fn new(client: Client, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            client,
            catalog,
            documents: DocumentStore::new(),
        }
    }

    /// Store `text` and publish diagnostics if the content changed.
    async fn refresh(&self, uri: Url, version: i32, text: String) {
        if !self.documents.update(uri.clone(), version, text.clone()) {
            debug!(%uri, version, "content unchanged, skipping diagnostics");
            return;
        }
        let diags = diagnostics::diagnostics(&text, self.catalog.as_ref())
            .into_iter()
            .map(to_lsp_diagnostic)
            .collect();
        self.client
            .publish_diagnostics(uri, diags, Some(version))
            .await;
    }
}

fn to_position(position: dsl::Position) -> Position {
    Position::new(position.line, position.character)
}

fn from_position(position: Position) -> dsl::Position {
    dsl::Position::new(position.line, position.character)
}

fn to_range(span: dsl::Span) -> Range {
    Range::new(to_position(span.start()), to_position(span.end()))
}

fn to_lsp_diagnostic(diag: types::Diagnostic) -> Diagnostic {
    Diagnostic {
        range: to_range(diag.span),
        severity: Some(match diag.severity {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
        }),
        code: Some(NumberOrString::String(diag.source.as_str().to_string())),
        source: Some("eeql".to_string()),
        message: diag.message,
        ..Default::default()
    }
}

fn to_lsp_completion(item: types::CompletionItem) -> CompletionItem {
    let kind = match item.kind {
        CompletionKind::Event => CompletionItemKind::CLASS,
        CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        CompletionKind::Function => CompletionItemKind::FUNCTION,
        CompletionKind::Column => CompletionItemKind::FIELD,
        CompletionKind::Entity => CompletionItemKind::REFERENCE,
    };
    CompletionItem {
        label: item.label,
        kind: Some(kind),
        detail: item.detail,
        ..Default::default()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                // Full document sync - we get the entire document on each change
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![" ".to_string(), "(".to_string()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "eeql-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!(
            events = self.catalog.list_event_names().len(),
            "language server initialized"
        );
        self.client
            .log_message(MessageType::INFO, "EEQL language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("language server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        debug!(uri = %doc.uri, "opened");
        self.refresh(doc.uri, doc.version, doc.text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // With FULL sync the last change holds the entire document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.refresh(uri, version, change.text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.remove(&uri);
        debug!(%uri, "closed");

        // Clear diagnostics for closed document
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = from_position(params.text_document_position.position);

        let Some(text) = self.documents.text(uri) else {
            return Ok(None);
        };

        let items: Vec<_> = completions::completions(&text, position, self.catalog.as_ref())
            .into_iter()
            .map(to_lsp_completion)
            .collect();

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = from_position(params.text_document_position_params.position);

        let Some(text) = self.documents.text(uri) else {
            return Ok(None);
        };

        Ok(
            hover::hover(&text, position, self.catalog.as_ref()).map(|h| Hover {
                contents: HoverContents::Markup(MarkupContent {
                    kind: MarkupKind::PlainText,
                    value: h.contents,
                }),
                range: Some(to_range(h.span)),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::types::DiagnosticSource;

    #[test]
    fn test_diagnostic_conversion() {
        let diag = types::Diagnostic {
            message: "Unknown event `x`".into(),
            span: dsl::Span::new(dsl::Position::new(0, 13), dsl::Position::new(0, 14)),
            severity: Severity::Error,
            source: DiagnosticSource::Validation,
        };
        let lsp = to_lsp_diagnostic(diag);
        assert_eq!(lsp.range, Range::new(Position::new(0, 13), Position::new(0, 14)));
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(lsp.code, Some(NumberOrString::String("validation".into())));
        assert_eq!(lsp.message, "Unknown event `x`");
    }

    #[test]
    fn test_completion_conversion() {
        let item = types::CompletionItem::new("count", CompletionKind::Function).with_detail("rows");
        let lsp = to_lsp_completion(item);
        assert_eq!(lsp.label, "count");
        assert_eq!(lsp.kind, Some(CompletionItemKind::FUNCTION));
        assert_eq!(lsp.detail.as_deref(), Some("rows"));
    }
}
