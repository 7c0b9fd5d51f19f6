//! Route definitions for the tracking service.
//!
//! ## Routes
//!
//! - `GET /pixel?tid=<token>` - 1x1 transparent GIF, records an open
//! - `GET /click?tid=<token>&url=<destination>` - 302 redirect, records a click
//! - `GET /health` - Health check (JSON)

mod click;
mod health;
mod pixel;

use axum::Router;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::routing::get;

use crate::state::AppState;

pub use pixel::TRANSPARENT_PIXEL;

/// Build the complete tracking service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/pixel", get(pixel::pixel_handler))
        .route("/click", get(click::click_handler))
        .route("/health", get(health::health_check))
        .with_state(state)
}

/// Cache-disabling headers for tracking responses.
///
/// Mail clients and intermediaries must re-fetch the pixel/redirect on
/// every render, or repeat engagement is never observed.
pub(crate) fn insert_no_cache_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
}
