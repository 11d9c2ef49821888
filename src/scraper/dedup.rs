//! Set-based deduplication of one upstream page against storage.
//!
//! A batch costs at most two reads and two bulk writes, whatever its size.
//! Callers must not run two batches against the same store concurrently:
//! the existence checks and inserts are not atomic as a pair.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::Provider;
use crate::db::{ArticleStore, KeyFilter};
use crate::error::Result;
use crate::models::{ArticleKey, NewArticle, Source};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub received: usize,
    pub rejected: usize,
    pub sources_created: usize,
    pub articles_created: usize,
}

/// Validate `records`, then persist the sources and articles not yet stored.
pub async fn save_batch<P, S>(provider: &P, store: &S, records: &[Value]) -> Result<BatchStats>
where
    P: Provider + ?Sized,
    S: ArticleStore + ?Sized,
{
    let mut stats = BatchStats {
        received: records.len(),
        ..BatchStats::default()
    };

    let mut candidate_sources: Candidates<String, Source> = Candidates::default();
    let mut candidate_articles = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match provider.candidate(record) {
            Ok(candidate) => {
                candidate_sources.insert(candidate.source.domain.clone(), candidate.source);
                candidate_articles.push(candidate.article);
            }
            Err(errors) => {
                stats.rejected += 1;
                warn!(
                    provider = provider.name(),
                    index,
                    errors = %errors,
                    "Skipping invalid record"
                );
            }
        }
    }

    let sources = resolve_sources(store, candidate_sources, &mut stats).await?;

    let mut candidates: Candidates<ArticleKey, NewArticle> = Candidates::default();
    for article in candidate_articles {
        if !sources.contains_key(&article.source) {
            warn!(domain = %article.source, url = %article.url, "No source for article, skipping");
            continue;
        }
        candidates.insert(article.key(), article);
    }

    let to_create = new_articles(store, candidates).await?;
    if !to_create.is_empty() {
        stats.articles_created = store.insert_articles(to_create).await?;
    }

    info!(
        provider = provider.name(),
        received = stats.received,
        rejected = stats.rejected,
        sources_created = stats.sources_created,
        articles_created = stats.articles_created,
        "Saved batch"
    );

    Ok(stats)
}

/// Create the sources that are not stored yet and return every source of the
/// batch keyed by domain. Stored sources take precedence over candidates.
async fn resolve_sources<S>(
    store: &S,
    candidates: Candidates<String, Source>,
    stats: &mut BatchStats,
) -> Result<HashMap<String, Source>>
where
    S: ArticleStore + ?Sized,
{
    if candidates.is_empty() {
        return Ok(HashMap::new());
    }

    let existing = store.sources_by_domain(candidates.keys()).await?;
    let mut sources: HashMap<String, Source> = existing
        .into_iter()
        .map(|source| (source.domain.clone(), source))
        .collect();
    debug!(existing = sources.len(), candidates = candidates.len(), "Looked up sources");

    let to_create: Vec<Source> = candidates
        .into_values()
        .filter(|source| !sources.contains_key(&source.domain))
        .collect();

    if !to_create.is_empty() {
        stats.sources_created = store.insert_sources(to_create.clone()).await?;
    }
    sources.extend(to_create.into_iter().map(|s| (s.domain.clone(), s)));

    Ok(sources)
}

/// Drop every candidate whose exact key is already stored.
async fn new_articles<S>(
    store: &S,
    candidates: Candidates<ArticleKey, NewArticle>,
) -> Result<Vec<NewArticle>>
where
    S: ArticleStore + ?Sized,
{
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let mut sources = BTreeSet::new();
    let mut paths = BTreeSet::new();
    let mut titles = BTreeSet::new();
    for key in candidates.iter_keys() {
        sources.insert(key.source.clone());
        paths.insert(key.canonical_path.clone());
        titles.insert(key.title.clone());
    }

    // The filter can return keys that are not in the batch; comparing
    // whole keys below keeps the result exact.
    let existing: HashSet<ArticleKey> = store
        .existing_article_keys(KeyFilter {
            sources: sources.into_iter().collect(),
            paths: paths.into_iter().collect(),
            titles: titles.into_iter().collect(),
        })
        .await?
        .into_iter()
        .collect();
    debug!(existing = existing.len(), candidates = candidates.len(), "Looked up articles");

    Ok(candidates
        .into_entries()
        .filter(|(key, _)| !existing.contains(key))
        .map(|(_, article)| article)
        .collect())
}

/// Insertion-ordered map where a repeated key replaces the earlier value in
/// place (last one wins, first position kept).
struct Candidates<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> Default for Candidates<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: std::hash::Hash + Eq + Clone, V> Candidates<K, V> {
    fn insert(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    fn iter_keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    fn into_values(self) -> impl Iterator<Item = V> {
        self.entries.into_iter().map(|(_, v)| v)
    }

    fn into_entries(self) -> impl Iterator<Item = (K, V)> {
        self.entries.into_iter()
    }
}
