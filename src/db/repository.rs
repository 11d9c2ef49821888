use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Article, ArticleKey, NewArticle, Source};

use super::schema::SCHEMA;
use super::{ArticleStore, KeyFilter};

const ARTICLE_COLUMNS: &str = "id, source, url, canonical_path, title, published_at, author, description, image_url, content";

#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Read API

    pub async fn count_articles(&self) -> Result<u64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn count_sources(&self) -> Result<u64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM sources", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Newest first; ties on `published_at` fall back to insertion order,
    /// newest first as well.
    pub async fn articles_page(&self, offset: u64, limit: u64) -> Result<Vec<Article>> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM articles ORDER BY published_at DESC, id DESC LIMIT ?1 OFFSET ?2",
                    ARTICLE_COLUMNS
                ))?;
                let articles = stmt
                    .query_map(params![limit, offset], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }
}

#[async_trait]
impl ArticleStore for Repository {
    async fn sources_by_domain(&self, domains: Vec<String>) -> Result<Vec<Source>> {
        if domains.is_empty() {
            return Ok(Vec::new());
        }

        let sources = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT domain, name FROM sources WHERE domain IN ({})",
                    placeholders(domains.len())
                ))?;
                let sources = stmt
                    .query_map(params_from_iter(domains.iter()), |row| {
                        Ok(Source {
                            domain: row.get(0)?,
                            name: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sources)
            })
            .await?;
        Ok(sources)
    }

    async fn insert_sources(&self, sources: Vec<Source>) -> Result<usize> {
        if sources.is_empty() {
            return Ok(0);
        }

        let inserted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                {
                    let mut stmt =
                        tx.prepare("INSERT INTO sources (domain, name) VALUES (?1, ?2)")?;
                    for source in &sources {
                        inserted += stmt.execute(params![source.domain, source.name])?;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await?;
        Ok(inserted)
    }

    async fn existing_article_keys(&self, filter: KeyFilter) -> Result<Vec<ArticleKey>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let keys = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT source, canonical_path, title FROM articles \
                     WHERE source IN ({}) AND canonical_path IN ({}) AND title IN ({})",
                    placeholders(filter.sources.len()),
                    placeholders(filter.paths.len()),
                    placeholders(filter.titles.len()),
                );
                let values = filter
                    .sources
                    .iter()
                    .chain(filter.paths.iter())
                    .chain(filter.titles.iter());

                let mut stmt = conn.prepare(&sql)?;
                let keys = stmt
                    .query_map(params_from_iter(values), |row| {
                        Ok(ArticleKey {
                            source: row.get(0)?,
                            canonical_path: row.get(1)?,
                            title: row.get(2)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await?;
        Ok(keys)
    }

    async fn insert_articles(&self, articles: Vec<NewArticle>) -> Result<usize> {
        if articles.is_empty() {
            return Ok(0);
        }

        let inserted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                {
                    let mut stmt = tx.prepare(
                        r#"INSERT INTO articles (source, url, canonical_path, title, published_at,
                                                 author, description, image_url, content)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                    )?;
                    for article in &articles {
                        inserted += stmt.execute(params![
                            article.source,
                            article.url,
                            article.canonical_path(),
                            article.title,
                            format_timestamp(&article.published_at),
                            article.author,
                            article.description,
                            article.image_url,
                            article.content,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await?;
        Ok(inserted)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Fixed-width RFC 3339 so that text order in SQLite equals time order.
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    let published_at: String = row.get(5)?;
    let published_at = DateTime::parse_from_rfc3339(&published_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Article {
        id: row.get(0)?,
        source: row.get(1)?,
        url: row.get(2)?,
        canonical_path: row.get(3)?,
        title: row.get(4)?,
        published_at,
        author: row.get(6)?,
        description: row.get(7)?,
        image_url: row.get(8)?,
        content: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;
    use tokio_test::{assert_err, assert_ok};

    fn source(domain: &str) -> Source {
        Source {
            domain: domain.to_string(),
            name: domain.to_uppercase(),
        }
    }

    fn article(source: &str, url: &str, title: &str, minute: i64) -> NewArticle {
        NewArticle {
            source: source.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            published_at: Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minute),
            author: None,
            description: Some("desc".to_string()),
            image_url: None,
            content: None,
        }
    }

    #[tokio::test]
    async fn sources_round_trip_by_domain() {
        let repo = Repository::in_memory().await.unwrap();
        assert_eq!(
            repo.insert_sources(vec![source("a.com"), source("b.com")]).await.unwrap(),
            2
        );

        let mut found = repo
            .sources_by_domain(vec!["a.com".into(), "c.com".into(), "b.com".into()])
            .await
            .unwrap();
        found.sort_by(|x, y| x.domain.cmp(&y.domain));

        assert_eq!(found, vec![source("a.com"), source("b.com")]);
        assert!(repo.sources_by_domain(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn canonical_path_is_derived_on_insert() {
        let repo = Repository::in_memory().await.unwrap();
        repo.insert_sources(vec![source("a.com")]).await.unwrap();
        repo.insert_articles(vec![article("a.com", "https://a.com/x/y?page=2#c", "T", 0)])
            .await
            .unwrap();

        let stored = repo.articles_page(0, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].canonical_path, "/x/y");
        assert_eq!(stored[0].url, "https://a.com/x/y?page=2#c");
        assert_eq!(stored[0].description.as_deref(), Some("desc"));
        assert_eq!(stored[0].published_at, Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn duplicate_key_fails_the_whole_bulk_insert() {
        let repo = Repository::in_memory().await.unwrap();
        repo.insert_sources(vec![source("a.com")]).await.unwrap();
        assert_ok!(
            repo.insert_articles(vec![article("a.com", "https://a.com/x", "T", 0)])
                .await
        );

        // Same path and title under a different query string is the same article.
        assert_err!(
            repo.insert_articles(vec![
                article("a.com", "https://a.com/other", "Other", 1),
                article("a.com", "https://a.com/x?ref=1", "T", 2),
            ])
            .await
        );
        assert_eq!(repo.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn article_requires_existing_source() {
        let repo = Repository::in_memory().await.unwrap();
        assert_err!(
            repo.insert_articles(vec![article("missing.com", "https://missing.com/x", "T", 0)])
                .await
        );
    }

    #[tokio::test]
    async fn key_filter_over_collects_and_never_misses() {
        let repo = Repository::in_memory().await.unwrap();
        repo.insert_sources(vec![source("a.com")]).await.unwrap();
        repo.insert_articles(vec![
            article("a.com", "https://a.com/1", "one", 0),
            article("a.com", "https://a.com/2", "two", 1),
        ])
        .await
        .unwrap();

        // (a.com, /1, two) is not stored, but the conjunction of independent sets
        // still matches both rows.
        let keys = repo
            .existing_article_keys(KeyFilter {
                sources: vec!["a.com".into()],
                paths: vec!["/1".into(), "/2".into()],
                titles: vec!["two".into(), "one".into()],
            })
            .await
            .unwrap();
        assert_eq!(keys.len(), 2);

        let keys = repo
            .existing_article_keys(KeyFilter {
                sources: vec!["a.com".into()],
                paths: vec!["/1".into()],
                titles: Vec::new(),
            })
            .await
            .unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn page_is_newest_first() {
        let repo = Repository::in_memory().await.unwrap();
        repo.insert_sources(vec![source("a.com")]).await.unwrap();
        let articles = (0..5)
            .map(|i| article("a.com", &format!("https://a.com/{i}"), &format!("t{i}"), i))
            .collect();
        repo.insert_articles(articles).await.unwrap();

        let page = repo.articles_page(1, 2).await.unwrap();
        let titles: Vec<_> = page.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["t3", "t2"]);
        assert_eq!(repo.count_articles().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn persists_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("news.db");
        let path = path.to_string_lossy().to_string();

        {
            let repo = Repository::new(&path).await.unwrap();
            repo.insert_sources(vec![source("a.com")]).await.unwrap();
        }

        let repo = Repository::new(&path).await.unwrap();
        assert_eq!(repo.count_sources().await.unwrap(), 1);
    }
}
