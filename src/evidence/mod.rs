//! Evidence document stores.
//!
//! Both backends expose the same two-operation contract: append documents
//! and rank them by similarity to a query. The embedding strategy lives
//! behind [`crate::Embedder`], so either side can change without touching
//! callers.

mod corpus;
mod local;
mod pinecone;

pub use corpus::seed_corpus;
pub use local::LocalEvidenceStore;
pub use pinecone::PineconeEvidenceStore;

use crate::Result;
use crate::models::{EvidenceHit, NewDocument};
use async_trait::async_trait;

/// An append-only, similarity-searchable document store.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Embeds and stores documents, returning how many were added.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or a remote index rejects the batch.
    async fn add_documents(&self, docs: Vec<NewDocument>) -> Result<usize>;

    /// Returns at most `k` hits, ordered by descending relevance.
    ///
    /// An empty store or `k == 0` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<EvidenceHit>>;

    /// Returns the number of stored documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    async fn count(&self) -> Result<usize>;
}
