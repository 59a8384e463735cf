//! File-backed evidence store with a linear cosine scan.
//!
//! Documents live in memory behind a `RwLock`: searches share the read lock,
//! adds take the write lock and rewrite the whole corpus file before
//! releasing it. The lock is never held across an `.await`.

use super::EvidenceStore;
use crate::embedding::{Embedder, cosine_similarity};
use crate::models::{EvidenceDocument, EvidenceHit, NewDocument};
use crate::{Error, Result};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Local evidence store persisted as a JSON array.
pub struct LocalEvidenceStore {
    path: Option<PathBuf>,
    embedder: Arc<dyn Embedder>,
    documents: RwLock<Vec<EvidenceDocument>>,
}

impl std::fmt::Debug for LocalEvidenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEvidenceStore")
            .field("path", &self.path)
            .field("dimensions", &self.embedder.dimensions())
            .field("documents", &self.len())
            .finish()
    }
}

impl LocalEvidenceStore {
    /// Opens the store at `path`, loading any existing corpus.
    ///
    /// A missing file yields an empty store. An unreadable or malformed file,
    /// or one whose embeddings do not match the embedder, is logged and also
    /// yields an empty store.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        let path = path.into();
        let documents = match load_corpus(&path, embedder.dimensions()) {
            Ok(documents) => {
                tracing::info!(path = %path.display(), count = documents.len(), "Loaded evidence corpus");
                documents
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load evidence corpus, starting empty");
                Vec::new()
            },
        };
        Self {
            path: Some(path),
            embedder,
            documents: RwLock::new(documents),
        }
    }

    /// Creates a store that never touches disk.
    #[must_use]
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            path: None,
            embedder,
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embeds and appends documents, persisting the corpus afterwards.
    ///
    /// A failed write is logged; the documents stay available in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails.
    pub fn add(&self, docs: Vec<NewDocument>) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = docs.iter().map(|doc| doc.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        let prepared: Vec<EvidenceDocument> = docs
            .into_iter()
            .zip(embeddings)
            .map(|(doc, embedding)| EvidenceDocument {
                id: format!("doc-{}", uuid::Uuid::now_v7()),
                content: doc.content,
                embedding,
                metadata: doc.metadata,
            })
            .collect();
        let added = prepared.len();

        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        documents.extend(prepared);

        if let Some(path) = self.path.as_deref() {
            if let Err(e) = save_corpus(path, &documents) {
                tracing::error!(path = %path.display(), error = %e, "Failed to persist evidence corpus");
            }
        }
        drop(documents);

        metrics::counter!("evidence_documents_added_total", "backend" => "local")
            .increment(added as u64);
        Ok(added)
    }

    /// Ranks all documents against `query` and returns the top `k`.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query fails.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<EvidenceHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed(query)?;

        let documents = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut scored: Vec<(f32, &EvidenceDocument)> = documents
            .iter()
            .map(|doc| (cosine_similarity(&query_embedding, &doc.embedding), doc))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, doc)| EvidenceHit::new(doc.source(), doc.content.clone(), score))
            .collect())
    }
}

#[async_trait]
impl EvidenceStore for LocalEvidenceStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn add_documents(&self, docs: Vec<NewDocument>) -> Result<usize> {
        self.add(docs)
    }

    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<EvidenceHit>> {
        self.search(query, k)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.len())
    }
}

fn load_corpus(path: &Path, dimensions: usize) -> Result<Vec<EvidenceDocument>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).map_err(|e| Error::failed("corpus_read", e))?;
    let documents: Vec<EvidenceDocument> =
        serde_json::from_str(&contents).map_err(|e| Error::failed("corpus_parse", e))?;

    if let Some(doc) = documents.iter().find(|d| d.embedding.len() != dimensions) {
        return Err(Error::failed(
            "corpus_parse",
            format!(
                "document {} has {} dimensions, expected {dimensions}",
                doc.id,
                doc.embedding.len()
            ),
        ));
    }
    Ok(documents)
}

/// Writes the corpus to a sibling temp file and renames it into place.
fn save_corpus(path: &Path, documents: &[EvidenceDocument]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::failed("corpus_create_dir", e))?;
    }
    let json =
        serde_json::to_vec_pretty(documents).map_err(|e| Error::failed("corpus_encode", e))?;

    let tmp = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp).map_err(|e| Error::failed("corpus_write", e))?;
    file.write_all(&json)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::failed("corpus_write", e))?;
    fs::rename(&tmp, path).map_err(|e| Error::failed("corpus_rename", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::CharCodeEmbedder;
    use crate::models::{SOURCE_KEY, UNKNOWN_SOURCE};

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(CharCodeEmbedder::new())
    }

    fn doc(content: &str, source: &str) -> NewDocument {
        NewDocument::new(content).with_metadata(SOURCE_KEY, source)
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty() {
        let store = LocalEvidenceStore::in_memory(embedder());
        let hits = store.similarity_search("heat", 3).await.expect("search");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_k_zero_returns_empty() {
        let store = LocalEvidenceStore::in_memory(embedder());
        store.add(vec![doc("heat", "WHO")]).expect("add");
        assert!(store.search("heat", 0).expect("search").is_empty());
    }

    #[tokio::test]
    async fn test_exact_match_ranks_first() {
        let store = LocalEvidenceStore::in_memory(embedder());
        store
            .add(vec![
                doc("UV index above 8 is very high", "Skin Cancer Foundation"),
                doc("Air quality index above 150 is unhealthy", "EPA"),
                doc("Extreme heat exposure increases risk", "WHO"),
            ])
            .expect("add");

        let hits = store
            .search("Air quality index above 150 is unhealthy", 2)
            .expect("search");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "EPA");
        assert!((hits[0].relevance_score - 1.0).abs() < 1e-5);
        assert!(hits[0].relevance_score >= hits[1].relevance_score);
    }

    #[test]
    fn test_missing_source_is_unknown() {
        let store = LocalEvidenceStore::in_memory(embedder());
        store.add(vec![NewDocument::new("no source here")]).expect("add");
        let hits = store.search("no source", 1).expect("search");
        assert_eq!(hits[0].source, UNKNOWN_SOURCE);
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("vectors.json");

        let store = LocalEvidenceStore::open(&path, embedder());
        assert_eq!(store.add(vec![doc("a", "A"), doc("b", "B")]).expect("add"), 2);
        assert!(path.exists());

        let reopened = LocalEvidenceStore::open(&path, embedder());
        assert_eq!(reopened.len(), 2);

        let raw = fs::read_to_string(&path).expect("read");
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("json");
        let first = &parsed[0];
        assert!(first["id"].as_str().is_some_and(|id| id.starts_with("doc-")));
        assert_eq!(first["embedding"].as_array().map(Vec::len), Some(384));
        assert_eq!(first["metadata"]["source"], "A");
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vectors.json");
        fs::write(&path, "{not json").expect("write");

        let store = LocalEvidenceStore::open(&path, embedder());
        assert!(store.is_empty());
    }

    #[test]
    fn test_dimension_mismatch_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vectors.json");
        let small = LocalEvidenceStore::open(&path, Arc::new(CharCodeEmbedder::with_dimensions(8)));
        small.add(vec![doc("a", "A")]).expect("add");

        let store = LocalEvidenceStore::open(&path, embedder());
        assert!(store.is_empty());
    }

    #[test]
    fn test_unwritable_path_keeps_documents_in_memory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").expect("write");

        // Parent is a regular file, so the directory cannot be created.
        let store = LocalEvidenceStore::open(blocker.join("vectors.json"), embedder());
        assert_eq!(store.add(vec![doc("a", "A")]).expect("add"), 1);
        assert_eq!(store.len(), 1);
    }
}
