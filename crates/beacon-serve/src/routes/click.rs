//! Link endpoint: records a click, always redirects.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use beacon_core::EventType;

use crate::config::DEFAULT_FALLBACK_URL;
use crate::context;
use crate::pipeline::{self, TrackOutcome};
use crate::state::AppState;

/// Query parameters for the link endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ClickParams {
    /// Opaque tracking token.
    pub tid: Option<String>,
    /// Destination to redirect to.
    pub url: Option<String>,
}

/// Handle `GET /click?tid=<token>&url=<destination>`.
///
/// Loss of tracking must never block the user's navigation: once the
/// destination is known, every internal outcome still redirects there.
/// Missing parameters redirect to the configured fallback landing page.
/// Cache-disabling headers are attached only when the entity resolved.
pub async fn click_handler(
    State(state): State<AppState>,
    params: Result<Query<ClickParams>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unparseable click query string");
            ClickParams::default()
        }
    };

    let token = params.tid.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let destination = params.url.as_deref().map(str::trim).filter(|u| !u.is_empty());

    let (Some(token), Some(destination)) = (token, destination) else {
        return redirect(&state.config.fallback_url, &state.config.fallback_url, false);
    };

    let outcome = pipeline::record_engagement(
        state.store.as_ref(),
        state.config.store_timeout,
        Some(token),
        EventType::Click,
        context::extract(&headers),
        Some(destination),
    )
    .await;
    tracing::debug!(outcome = ?outcome, "click request served");

    redirect(
        destination,
        &state.config.fallback_url,
        outcome == TrackOutcome::Recorded,
    )
}

/// Build a 302 to `location`, falling back if it cannot form a header.
///
/// axum's `Redirect` helpers emit 303/307/308; tracked links in the
/// wild expect a plain 302, so the response is built directly.
fn redirect(location: &str, fallback: &str, tracked: bool) -> Response {
    let mut headers = HeaderMap::new();

    let location_value = HeaderValue::from_str(location)
        .or_else(|_| HeaderValue::from_str(fallback))
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_FALLBACK_URL));
    headers.insert(header::LOCATION, location_value);

    if tracked {
        super::insert_no_cache_headers(&mut headers);
    }

    (StatusCode::FOUND, headers).into_response()
}
