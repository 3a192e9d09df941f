//! Open-document store.
//!
//! Documents are kept as full text (the server uses full sync) together with
//! a SHA-256 hash of that text, so unchanged content is not re-analysed.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tower_lsp::lsp_types::Url;

/// Hex SHA-256 of a document's text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// State of a single open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    pub version: i32,
    pub source: String,
    pub hash: String,
}

impl DocumentState {
    pub fn new(version: i32, source: String) -> Self {
        let hash = content_hash(&source);
        Self {
            version,
            source,
            hash,
        }
    }
}

/// Open documents keyed by URI. Safe to share between request handlers.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, DocumentState>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest text of a document.
    ///
    /// Returns `true` when the content differs from what was stored before
    /// (always for a document not yet in the store).
    pub fn update(&self, uri: Url, version: i32, source: String) -> bool {
        let doc = DocumentState::new(version, source);
        let changed = self
            .documents
            .get(&uri)
            .map_or(true, |old| old.hash != doc.hash);
        self.documents.insert(uri, doc);
        changed
    }

    pub fn remove(&self, uri: &Url) -> Option<DocumentState> {
        self.documents.remove(uri).map(|(_, doc)| doc)
    }

    /// Copy of a document's current text.
    pub fn text(&self, uri: &Url) -> Option<String> {
        self.documents.get(uri).map(|doc| doc.source.clone())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///work/{name}")).unwrap()
    }

    #[test]
    fn test_content_hash() {
        let hash = content_hash("select first a ( b as b )");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, content_hash("select first a ( b as b )"));
        assert_ne!(hash, content_hash("select last a ( b as b )"));
    }

    #[test]
    fn test_update_reports_content_changes() {
        let store = DocumentStore::new();
        let a = uri("a.eeql");

        assert!(store.update(a.clone(), 1, "select".into()));
        // Same text, new version.
        assert!(!store.update(a.clone(), 2, "select".into()));
        assert!(store.update(a.clone(), 3, "select first".into()));
        assert_eq!(store.text(&a).as_deref(), Some("select first"));
    }

    #[test]
    fn test_remove() {
        let store = DocumentStore::new();
        let a = uri("a.eeql");
        store.update(a.clone(), 1, "x".into());
        store.update(uri("b.eeql"), 1, "y".into());

        assert_eq!(store.remove(&a).map(|d| d.version), Some(1));
        assert_eq!(store.len(), 1);
        assert!(store.text(&a).is_none());
        // Re-opening counts as a change.
        assert!(store.update(a, 1, "x".into()));
    }
}
