use async_trait::async_trait;
use delegor_core::DelegorResult;
use serde::{Deserialize, Serialize};

/// A keyword query against a context source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextQuery {
    /// Keywords extracted from the request.
    pub keywords: Vec<String>,
    /// Upper bound on returned snippets.
    pub max_results: usize,
}

/// One ranked snippet returned by a context source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnippet {
    /// Where the snippet came from.
    pub source: String,
    /// The snippet text.
    pub content: String,
}

/// Advisory enrichment of the decomposition prompt. Purely optional:
/// absence (or failure) changes nothing structurally.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Returns ranked snippets for the query.
    async fn query(&self, query: ContextQuery) -> DelegorResult<Vec<ContextSnippet>>;
}

/// The null context provider; the default when none is configured.
pub struct NoContext;

#[async_trait]
impl ContextProvider for NoContext {
    async fn query(&self, _query: ContextQuery) -> DelegorResult<Vec<ContextSnippet>> {
        Ok(Vec::new())
    }
}
