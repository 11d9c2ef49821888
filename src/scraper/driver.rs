use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use super::{save_batch, Provider};
use crate::db::ArticleStore;
use crate::error::{AppError, Result};

/// Walks a provider's paginated endpoint and stores what it finds.
///
/// Pages are fetched strictly one after another: the stop condition depends
/// on the previous response, and the deduplication of a page must finish
/// before the next one is written.
pub struct Scraper<P, S> {
    client: Client,
    provider: P,
    store: S,
}

impl<P, S> Scraper<P, S>
where
    P: Provider,
    S: ArticleStore,
{
    pub fn new(provider: P, store: S, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("newsfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            provider,
            store,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Download from `path` until `count` new articles are stored or the
    /// upstream runs out. Returns the number of new articles.
    ///
    /// Any non-success response aborts the run; nothing is retried.
    pub async fn start(&self, count: usize, params: &[(String, String)], path: &str) -> Result<usize> {
        let url = self.provider.endpoint(path);

        let mut downloaded: usize = 0;
        // Real value arrives with the first response.
        let mut total_available: u64 = 1;
        let mut page: u32 = 1;

        while downloaded < count && (downloaded as u64) < total_available {
            info!(page, "Fetching page {}", page);
            let body = self.fetch_page(&url, page, params).await?;

            let (total, created, received) = self.save_page(body).await?;
            total_available = total;
            downloaded += created;

            if received == 0 {
                info!(page, downloaded, total_available, "Upstream returned an empty page, stopping");
                break;
            }
            page += 1;
        }

        Ok(downloaded)
    }

    /// Store one response body. Returns the upstream total, the number of new
    /// articles and the number of records the page carried.
    pub async fn save_page(&self, body: Value) -> Result<(u64, usize, usize)> {
        let page = self.provider.parse_page(body)?;
        let stats = save_batch(&self.provider, &self.store, &page.records).await?;
        Ok((page.total_results, stats.articles_created, stats.received))
    }

    async fn fetch_page(&self, url: &str, page: u32, params: &[(String, String)]) -> Result<Value> {
        let query = build_query(self.provider.auth_params(), page, params);
        let response = self.client.get(url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default();

            return Err(AppError::Upstream {
                url: url.to_string(),
                page,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                message,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Auth parameters first, then the page number, then caller parameters,
/// which replace earlier ones with the same name. `page` belongs to the
/// driver and cannot be replaced.
fn build_query(
    auth: Vec<(String, String)>,
    page: u32,
    params: &[(String, String)],
) -> Vec<(String, String)> {
    let mut query = auth;
    query.push(("page".to_string(), page.to_string()));

    for (name, value) in params {
        if name == "page" {
            warn!("Ignoring caller supplied page parameter");
            continue;
        }
        query.retain(|(existing, _)| existing != name);
        query.push((name.clone(), value.clone()));
    }

    query
}
