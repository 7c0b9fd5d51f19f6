//! Pixel endpoint: records an open, always serves the same image.

use axum::extract::{Query, State};
use axum::extract::rejection::QueryRejection;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use beacon_core::EventType;

use crate::context;
use crate::pipeline;
use crate::state::AppState;

/// Fixed 1x1 transparent GIF served on every pixel request.
pub const TRANSPARENT_PIXEL: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x01, 0x44, 0x00, 0x3b,
];

/// Query parameters for the pixel endpoint.
#[derive(Debug, Deserialize)]
pub struct PixelParams {
    /// Opaque tracking token.
    pub tid: Option<String>,
}

/// Handle `GET /pixel?tid=<token>`.
///
/// The handler is infallible: whatever happens inside the pipeline
/// (missing token, unresolvable token, datastore failure or timeout,
/// even an unparseable query string), the response is the fixed
/// transparent image with cache-disabling headers.
pub async fn pixel_handler(
    State(state): State<AppState>,
    params: Result<Query<PixelParams>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let tid = match params {
        Ok(Query(params)) => params.tid,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unparseable pixel query string");
            None
        }
    };

    let outcome = pipeline::record_engagement(
        state.store.as_ref(),
        state.config.store_timeout,
        tid.as_deref(),
        EventType::Open,
        context::extract(&headers),
        None,
    )
    .await;
    tracing::debug!(outcome = ?outcome, "pixel request served");

    pixel_response()
}

/// The one and only pixel response.
fn pixel_response() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/gif"));
    super::insert_no_cache_headers(&mut headers);

    (StatusCode::OK, headers, TRANSPARENT_PIXEL).into_response()
}
