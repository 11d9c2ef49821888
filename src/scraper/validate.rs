//! Field-level validation of one upstream record.
//!
//! Providers map their wire format into a [`RawRecord`]; [`validate`] turns it
//! into a source/article pair or reports every field that failed. A rejection
//! only ever affects the record at hand.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use url::{Host, Url};

use super::normalize::canonical_domain;
use crate::models::{NewArticle, Source};

pub const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub const MAX_DOMAIN_LEN: usize = 253;
pub const MAX_SOURCE_NAME_LEN: usize = 128;
pub const MAX_TITLE_LEN: usize = 512;
pub const MAX_DESCRIPTION_LEN: usize = 512;
pub const MAX_AUTHOR_LEN: usize = 128;
pub const MAX_URL_LEN: usize = 1024;

const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

/// Upstream record with provider quirks already removed. Every field may be
/// missing; `validate` decides what is required.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub source_name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub content: Option<String>,
}

/// A validated record: the source it belongs to and the article itself.
/// `article.source` equals `source.domain`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub source: Source,
    pub article: NewArticle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid record: {}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validate(raw: RawRecord) -> Result<Candidate, ValidationErrors> {
    let mut errors = Vec::new();

    let title = required(&mut errors, "title", raw.title, MAX_TITLE_LEN);
    let name = required(&mut errors, "source_name", raw.source_name, MAX_SOURCE_NAME_LEN);
    let url = required(&mut errors, "url", raw.url, MAX_URL_LEN)
        .filter(|url| check_url(&mut errors, "url", url));

    let domain = url.as_deref().map(canonical_domain);
    if let Some(domain) = &domain {
        if domain.is_empty() {
            errors.push(FieldError::new("domain", "This field is required."));
        } else if domain.chars().count() > MAX_DOMAIN_LEN {
            errors.push(too_long("domain", MAX_DOMAIN_LEN));
        }
    }

    let published_at = required(&mut errors, "published_at", raw.published_at, usize::MAX)
        .and_then(|value| match parse_published_at(&value) {
            Some(dt) => Some(dt),
            None => {
                errors.push(FieldError::new(
                    "published_at",
                    format!("Enter a valid date/time in the form {}.", PUBLISHED_AT_FORMAT),
                ));
                None
            }
        });

    let author = optional(&mut errors, "author", raw.author, MAX_AUTHOR_LEN);
    let description = optional(&mut errors, "description", raw.description, MAX_DESCRIPTION_LEN);
    let image_url = optional(&mut errors, "image_url", raw.image_url, MAX_URL_LEN)
        .filter(|url| check_url(&mut errors, "image_url", url));
    let content = optional(&mut errors, "content", raw.content, usize::MAX);

    match (title, name, url, domain, published_at) {
        (Some(title), Some(name), Some(url), Some(domain), Some(published_at))
            if errors.is_empty() =>
        {
            Ok(Candidate {
                source: Source {
                    domain: domain.clone(),
                    name,
                },
                article: NewArticle {
                    source: domain,
                    url,
                    title,
                    published_at,
                    author,
                    description,
                    image_url,
                    content,
                },
            })
        }
        _ => Err(ValidationErrors(errors)),
    }
}

pub fn parse_published_at(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, PUBLISHED_AT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn required(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    match clean(value) {
        None => {
            errors.push(FieldError::new(field, "This field is required."));
            None
        }
        Some(value) => within_limit(errors, field, value, max_len),
    }
}

fn optional(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    clean(value).and_then(|value| within_limit(errors, field, value, max_len))
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn within_limit(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: String,
    max_len: usize,
) -> Option<String> {
    if value.chars().count() > max_len {
        errors.push(too_long(field, max_len));
        None
    } else {
        Some(value)
    }
}

fn too_long(field: &'static str, max_len: usize) -> FieldError {
    FieldError::new(
        field,
        format!("Ensure this value has at most {} characters.", max_len),
    )
}

fn check_url(errors: &mut Vec<FieldError>, field: &'static str, value: &str) -> bool {
    if is_valid_url(value) {
        true
    } else {
        errors.push(FieldError::new(field, "Enter a valid URL."));
        false
    }
}

fn is_valid_url(value: &str) -> bool {
    let Ok(parsed) = Url::parse(value) else {
        return false;
    };

    if !URL_SCHEMES.contains(&parsed.scheme()) {
        return false;
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => domain == "localhost" || domain.contains('.'),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    }
}
