use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scraper::normalize::canonical_path;

/// Identity of an article: the same path can be reused by one outlet for
/// unrelated stories, so the title is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleKey {
    pub source: String,
    pub canonical_path: String,
    pub title: String,
}

/// Stored article as served by the read API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source: String,
    pub url: String,
    pub canonical_path: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub content: Option<String>,
}

/// Validated article waiting to be stored. `source` holds the canonical
/// domain of the owning [`Source`](super::Source).
///
/// The canonical path is always derived from `url`; there is no way to set it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub source: String,
    pub url: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub content: Option<String>,
}

impl NewArticle {
    pub fn canonical_path(&self) -> String {
        canonical_path(&self.url)
    }

    pub fn key(&self) -> ArticleKey {
        ArticleKey {
            source: self.source.clone(),
            canonical_path: self.canonical_path(),
            title: self.title.clone(),
        }
    }
}
