//! Request context extraction from inbound headers.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, header};

use beacon_core::RequestContext;

/// Extract the tracking context from an inbound request's headers.
///
/// Client IP precedence: first `x-forwarded-for` entry, then the
/// platform edge header `cf-connecting-ip`, else empty. User-agent and
/// referrer default to empty strings. The full header set is captured
/// verbatim into the event metadata.
pub fn extract(headers: &HeaderMap) -> RequestContext {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let client_ip = forwarded_for
        .or_else(|| headers.get("cf-connecting-ip").and_then(|v| v.to_str().ok()))
        .unwrap_or("")
        .to_string();

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let captured: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    RequestContext {
        client_ip,
        user_agent,
        referrer,
        headers: captured,
    }
}
