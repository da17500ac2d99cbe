use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A stored passage returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    /// Similarity reported by the store, when it reports one.
    pub score: Option<f32>,
    /// Zero-based position in the store's ranking.
    pub rank: usize,
}

/// Parameters of one similarity query.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalQuery<'a> {
    pub vector: &'a [f32],
    pub top_k: usize,
    /// Logical partition to search. `None` searches the whole collection.
    pub namespace: Option<&'a str>,
}

/// A vector store that returns the passages most similar to a query vector.
///
/// Results are ordered by descending similarity. An empty result is not an
/// error.
pub trait Retriever: Send + Sync {
    fn retrieve(&self, query: &RetrievalQuery<'_>) -> Result<Vec<Passage>>;
}

/// Number passages in the order the store returned them.
pub(crate) fn ranked(texts: impl IntoIterator<Item = (String, Option<f32>)>) -> Vec<Passage> {
    texts
        .into_iter()
        .enumerate()
        .map(|(rank, (text, score))| Passage { text, score, rank })
        .collect()
}
