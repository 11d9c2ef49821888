use serde::Deserialize;
use serde_json::Value;

use super::validate::{validate, Candidate, RawRecord, ValidationErrors};
use super::{Page, Provider};
use crate::error::{AppError, Result};

const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2/";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(rename = "totalResults")]
    total_results: Option<u64>,
    articles: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    source: Option<ArticleSource>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

impl From<NewsApiArticle> for RawRecord {
    fn from(article: NewsApiArticle) -> Self {
        RawRecord {
            source_name: article.source.and_then(|s| s.name),
            title: article.title,
            url: article.url,
            published_at: article.published_at,
            author: article.author,
            description: article.description,
            image_url: article.url_to_image,
            content: article.content,
        }
    }
}

/// newsapi.org v2 (`everything`, `top-headlines`).
pub struct NewsApiOrg {
    api_key: String,
    base_url: String,
}

impl NewsApiOrg {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: NEWSAPI_BASE_URL.to_string(),
        }
    }

    /// Point at another host serving the same API. The URL must end with `/`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Provider for NewsApiOrg {
    fn name(&self) -> &str {
        "newsapi.org"
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_params(&self) -> Vec<(String, String)> {
        vec![("apiKey".to_string(), self.api_key.clone())]
    }

    fn parse_page(&self, body: Value) -> Result<Page> {
        let response: NewsApiResponse = serde_json::from_value(body)
            .map_err(|e| AppError::MalformedResponse(e.to_string()))?;

        let total_results = response
            .total_results
            .ok_or_else(|| AppError::MalformedResponse("missing totalResults".to_string()))?;
        let records = response
            .articles
            .ok_or_else(|| AppError::MalformedResponse("missing articles".to_string()))?;

        Ok(Page {
            total_results,
            records,
        })
    }

    fn candidate(&self, record: &Value) -> std::result::Result<Candidate, ValidationErrors> {
        let article: NewsApiArticle = serde_json::from_value(record.clone())
            .map_err(|e| ValidationErrors::single("record", e.to_string()))?;
        validate(article.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_envelope() {
        let page = NewsApiOrg::new("key")
            .parse_page(json!({
                "status": "ok",
                "totalResults": 9121,
                "articles": [{"title": "a"}, {"title": "b"}]
            }))
            .unwrap();

        assert_eq!(page.total_results, 9121);
        assert_eq!(page.records.len(), 2);
    }

    #[test]
    fn envelope_without_total_is_malformed() {
        let err = NewsApiOrg::new("key")
            .parse_page(json!({"status": "ok", "articles": []}))
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));

        let err = NewsApiOrg::new("key")
            .parse_page(json!({"status": "ok", "totalResults": "many", "articles": []}))
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn maps_newsapi_field_names() {
        let candidate = NewsApiOrg::new("key")
            .candidate(&json!({
                "source": {"id": null, "name": "Makeuseof.com"},
                "author": null,
                "title": "Title",
                "description": null,
                "url": "https://www.makeuseof.com/tag/a/",
                "urlToImage": "https://static.makeuseof.com/a.jpg",
                "publishedAt": "2018-10-04T09:00:00Z",
                "content": null
            }))
            .unwrap();

        assert_eq!(candidate.source.name, "Makeuseof.com");
        assert_eq!(candidate.source.domain, "makeuseof.com");
        assert_eq!(
            candidate.article.image_url.as_deref(),
            Some("https://static.makeuseof.com/a.jpg")
        );
    }

    #[test]
    fn wrongly_typed_record_is_rejected_not_fatal() {
        let errors = NewsApiOrg::new("key")
            .candidate(&json!({"title": 42, "url": "https://a.com/x"}))
            .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["record"]);
    }

    #[test]
    fn missing_source_name_is_rejected() {
        let errors = NewsApiOrg::new("key")
            .candidate(&json!({
                "title": "Title",
                "url": "https://a.com/x",
                "publishedAt": "2018-10-04T09:00:00Z"
            }))
            .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["source_name"]);
    }

    #[test]
    fn endpoint_and_auth() {
        let provider = NewsApiOrg::new("secret").with_base_url("http://127.0.0.1:9/v2/");
        assert_eq!(provider.endpoint("everything"), "http://127.0.0.1:9/v2/everything");
        assert_eq!(
            provider.auth_params(),
            vec![("apiKey".to_string(), "secret".to_string())]
        );
    }
}
