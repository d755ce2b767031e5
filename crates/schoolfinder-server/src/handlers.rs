use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, warn};

use schoolfinder_core::{Page, PageRequest, PageToken, School, SchoolId, SourceError};
use schoolfinder_store::StoreError;

use crate::server::AppState;

/// Error body: `{"error": message, "kind": classification}`.
#[derive(Debug)]
pub enum ApiError {
    Source(SourceError),
    NotFound(String),
    NoCatalog,
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Source(SourceError::InvalidToken(_)) => StatusCode::BAD_REQUEST,
            Self::Source(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NoCatalog => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Source(e) => e.error_kind(),
            Self::NotFound(_) => "not_found",
            Self::NoCatalog => "no_catalog",
            Self::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Source(e) => e.to_string(),
            Self::NotFound(what) => format!("not found: {what}"),
            Self::NoCatalog => "this server has no local catalog".into(),
            Self::Internal(detail) => detail.clone(),
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "source": state.source.name(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PlacesParams {
    pub pagetoken: Option<String>,
    pub query: Option<String>,
}

impl PlacesParams {
    fn into_request(self) -> PageRequest {
        PageRequest {
            token: self
                .pagetoken
                .filter(|t| !t.is_empty())
                .map(PageToken::from_raw),
            query: None,
        }
        .with_query(self.query)
    }
}

/// `GET /api/places?pagetoken=&query=`
pub async fn places(
    State(state): State<AppState>,
    Query(params): Query<PlacesParams>,
) -> Result<Json<Page>, ApiError> {
    if state.simulated_latency > Duration::ZERO {
        tokio::time::sleep(state.simulated_latency).await;
    }

    let request = params.into_request();
    match state.source.fetch_page(&request).await {
        Ok(page) => {
            debug!(returned = page.results.len(), has_more = page.has_more(), "served places page");
            Ok(Json(page))
        }
        Err(e) => {
            warn!(error = %e, kind = e.error_kind(), source = state.source.name(), "places request failed");
            Err(e.into())
        }
    }
}

/// `GET /api/schools/{id}`
pub async fn school_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<School>, ApiError> {
    let repo = state.catalog.as_ref().ok_or(ApiError::NoCatalog)?;
    let school = repo.get(&SchoolId::from_raw(id))?;
    Ok(Json(school))
}
