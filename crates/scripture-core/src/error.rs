//! Hard failures that cross the retrieval boundary.
//!
//! Only outages of the index or the embedding model are errors. No match,
//! an unresolvable citation, or a failed overlay fetch are all modeled as
//! empty results and never appear here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The verse index could not be queried.
    #[error("verse index unavailable: {0:#}")]
    IndexUnavailable(anyhow::Error),

    /// The embedding model could not embed the query.
    #[error("embedding provider unavailable: {0:#}")]
    EmbeddingUnavailable(anyhow::Error),
}

impl RetrievalError {
    pub fn index(err: anyhow::Error) -> Self {
        RetrievalError::IndexUnavailable(err)
    }

    pub fn embedding(err: anyhow::Error) -> Self {
        RetrievalError::EmbeddingUnavailable(err)
    }
}
