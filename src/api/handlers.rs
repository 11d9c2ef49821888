use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::AppError;
use crate::models::Article;

#[derive(Debug, Serialize, Deserialize)]
pub struct NewsPage {
    pub count: u64,
    pub objects: Vec<Article>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub enum ApiError {
    BadRequest(String),
    Internal(AppError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidPage(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Failed to serve news page");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// `GET /api/news/?page=N`, newest articles first.
pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<NewsPage>, ApiError> {
    let count = state.repository.count_articles().await?;
    let page = resolve_page(params.get("page").map(String::as_str), count, state.page_size)?;

    let offset = (page - 1) * state.page_size;
    let objects = state
        .repository
        .articles_page(offset, state.page_size)
        .await?;

    Ok(Json(NewsPage { count, objects }))
}

/// 1-based page number for `raw`. The first page always exists, even when
/// there is nothing to show.
fn resolve_page(raw: Option<&str>, count: u64, page_size: u64) -> Result<u64, AppError> {
    let num_pages = count.div_ceil(page_size).max(1);

    let page = match raw.map(str::trim) {
        None => return Ok(1),
        Some("last") => return Ok(num_pages),
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            AppError::InvalidPage(
                "Invalid page: page is not 'last', nor can it be converted to an int.".to_string(),
            )
        })?,
    };

    if page < 1 {
        return Err(AppError::InvalidPage(format!(
            "Invalid page ({}): That page number is less than 1",
            page
        )));
    }

    let page = page as u64;
    if page > num_pages {
        return Err(AppError::InvalidPage(format!(
            "Invalid page ({}): That page contains no results",
            page
        )));
    }

    Ok(page)
}
