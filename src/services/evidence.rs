//! Evidence retrieval and ingestion.

use crate::config::{DEFAULT_EVIDENCE_K, OperationTimeoutConfig, OperationType};
use crate::evidence::{EvidenceStore, seed_corpus};
use crate::models::{EvidenceHit, NewDocument, SOURCE_KEY};
use crate::{Error, Result, with_timeout};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

/// Metadata key holding the ingestion timestamp.
pub const ADDED_AT_KEY: &str = "addedAt";

/// Service for searching and growing the evidence corpus.
#[derive(Clone)]
pub struct EvidenceService {
    store: Arc<dyn EvidenceStore>,
    timeouts: OperationTimeoutConfig,
    default_k: usize,
}

impl EvidenceService {
    /// Creates a new evidence service.
    #[must_use]
    pub fn new(store: Arc<dyn EvidenceStore>) -> Self {
        Self {
            store,
            timeouts: OperationTimeoutConfig::default(),
            default_k: DEFAULT_EVIDENCE_K,
        }
    }

    /// Sets operation timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: OperationTimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the number of hits returned when callers do not ask for one.
    #[must_use]
    pub const fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Returns the default number of hits.
    #[must_use]
    pub const fn default_k(&self) -> usize {
        self.default_k
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EvidenceStore> {
        &self.store
    }

    /// Runs a similarity search against the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the search exceeds its deadline.
    #[tracing::instrument(skip(self, query), fields(backend = self.store.name(), hits = tracing::field::Empty))]
    pub async fn chat_evidence(&self, query: &str, k: usize) -> Result<Vec<EvidenceHit>> {
        let hits = with_timeout(
            "evidence_search",
            self.timeouts.get(OperationType::Evidence),
            self.store.similarity_search(query, k),
        )
        .await?;
        tracing::Span::current().record("hits", hits.len());
        Ok(hits)
    }

    /// Adds documents under a single source label.
    ///
    /// Each document's metadata gains `source` and an RFC 3339 `addedAt`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank source label or any blank
    /// document, and propagates store failures.
    #[tracing::instrument(skip(self, docs), fields(count = docs.len()))]
    pub async fn ingest_documents(&self, docs: Vec<NewDocument>, source: &str) -> Result<usize> {
        let source = source.trim();
        if source.is_empty() {
            return Err(Error::InvalidInput(
                "Source label cannot be empty".to_string(),
            ));
        }
        if let Some(index) = docs.iter().position(|doc| doc.content.trim().is_empty()) {
            return Err(Error::InvalidInput(format!(
                "Document {index} has empty content"
            )));
        }

        let stamped = docs
            .into_iter()
            .map(|doc| stamp(doc, Some(source)))
            .collect();
        let added = self.add(stamped).await?;
        tracing::info!(added, source, "Ingested evidence documents");
        Ok(added)
    }

    /// Ingests the built-in corpus, keeping each document's own source.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn seed(&self) -> Result<usize> {
        let docs = seed_corpus()
            .into_iter()
            .map(|doc| stamp(doc, None))
            .collect();
        let added = self.add(docs).await?;
        tracing::info!(added, backend = self.store.name(), "Seeded evidence corpus");
        Ok(added)
    }

    /// Seeds the corpus only when the store is empty. Returns the number added.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn seed_if_empty(&self) -> Result<usize> {
        if self.count().await? > 0 {
            return Ok(0);
        }
        self.seed().await
    }

    /// Returns the number of stored documents.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn count(&self) -> Result<usize> {
        with_timeout(
            "evidence_count",
            self.timeouts.get(OperationType::Evidence),
            self.store.count(),
        )
        .await
    }

    async fn add(&self, docs: Vec<NewDocument>) -> Result<usize> {
        with_timeout(
            "evidence_ingest",
            self.timeouts.get(OperationType::Evidence),
            self.store.add_documents(docs),
        )
        .await
    }
}

fn stamp(mut doc: NewDocument, source: Option<&str>) -> NewDocument {
    if let Some(source) = source {
        doc.metadata.insert(SOURCE_KEY.to_string(), source.into());
    }
    doc.metadata.insert(
        ADDED_AT_KEY.to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true).into(),
    );
    doc
}
