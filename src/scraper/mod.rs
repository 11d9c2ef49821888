mod dedup;
mod driver;
mod newsapi;
pub mod normalize;
pub mod validate;

use serde_json::Value;

use crate::error::Result;

pub use dedup::save_batch;
pub use driver::Scraper;
pub use newsapi::NewsApiOrg;
pub use validate::{Candidate, ValidationErrors};

/// One upstream response: how many results the upstream claims to have in
/// total, and the raw records of this page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub total_results: u64,
    pub records: Vec<Value>,
}

/// An upstream news API. Implement this once per provider to plug it into
/// [`Scraper`] and [`save_batch`].
pub trait Provider: Send + Sync {
    /// Human readable name used in notices and logs.
    fn name(&self) -> &str;

    /// Full URL for an endpoint path such as `everything`.
    fn endpoint(&self, path: &str) -> String;

    /// Query parameters that authenticate every request.
    fn auth_params(&self) -> Vec<(String, String)>;

    /// Split a successful response body into the page envelope and its records.
    fn parse_page(&self, body: Value) -> Result<Page>;

    /// Validate a single record. Errors here drop the record, not the batch.
    fn candidate(&self, record: &Value) -> std::result::Result<Candidate, ValidationErrors>;
}
