//! Request handlers

use crate::api::AppState;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use feedline_core::FeedError;
use feedline_log::Cursor;
use http::{header, StatusCode};
use serde::Deserialize;

/// Content type of feed responses
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";

/// Query string of a feed request
///
/// Values stay raw text so a malformed integer reports which field was bad.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Page start
    pub position: Option<String>,
    /// Entries per page
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
    /// Stop boundary, `-1` for none
    #[serde(rename = "stopAt")]
    pub stop_at: Option<String>,
    /// Ask for the indented form
    pub pretty: Option<String>,
}

impl FeedQuery {
    /// Whether the client asked for the indented form
    ///
    /// A bare `?pretty` counts as yes.
    #[must_use]
    pub fn wants_pretty(&self) -> bool {
        self.pretty.as_deref().is_some_and(|value| {
            let value = value.trim();
            value.is_empty() || value == "1" || value.eq_ignore_ascii_case("true")
        })
    }
}

/// `GET {prefix}/feed`
pub async fn feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let cursor = Cursor::from_query(
        query.position.as_deref(),
        query.page_size.as_deref(),
        query.stop_at.as_deref(),
        &state.limits,
    )?;

    let page = state.service.page(cursor).await?;
    let body = if query.wants_pretty() {
        page.pretty(state.service.canonicalizer())?
    } else {
        page.into_xml()
    };

    Ok(([(header::CONTENT_TYPE, ATOM_CONTENT_TYPE)], body).into_response())
}

/// Feed errors mapped onto HTTP statuses
#[derive(Debug)]
pub struct ApiError(pub FeedError);

impl ApiError {
    /// Status code for the wrapped error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            FeedError::InvalidCursor { .. } => StatusCode::BAD_REQUEST,
            FeedError::Source { .. } => StatusCode::SERVICE_UNAVAILABLE,
            FeedError::InvariantViolation { .. }
            | FeedError::MalformedDocument { .. }
            | FeedError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::debug!(error = %self.0, "rejected feed request");
        } else {
            tracing::warn!(error = %self.0, status = status.as_u16(), "feed request failed");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.0.to_string(),
        )
            .into_response()
    }
}
