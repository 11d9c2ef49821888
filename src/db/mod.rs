mod repository;
mod schema;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ArticleKey, NewArticle, Source};

pub use repository::Repository;

/// Candidate sets for the article existence check. A stored article matches
/// when its source, canonical path and title each appear in the respective
/// set, so results can be a superset of the exact keys asked for.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    pub sources: Vec<String>,
    pub paths: Vec<String>,
    pub titles: Vec<String>,
}

impl KeyFilter {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() || self.paths.is_empty() || self.titles.is_empty()
    }
}

/// Storage used by ingestion. Every method is one round trip; the bulk
/// inserts are all-or-nothing.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn sources_by_domain(&self, domains: Vec<String>) -> Result<Vec<Source>>;

    async fn insert_sources(&self, sources: Vec<Source>) -> Result<usize>;

    async fn existing_article_keys(&self, filter: KeyFilter) -> Result<Vec<ArticleKey>>;

    async fn insert_articles(&self, articles: Vec<NewArticle>) -> Result<usize>;
}
