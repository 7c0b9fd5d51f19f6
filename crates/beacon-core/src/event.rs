//! Engagement events and the request context captured with them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::status::EngagementStatus;

/// Kind of engagement signal observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// Tracking pixel fetched.
    Open,
    /// Tracked link followed.
    Click,
}

impl EventType {
    /// Wire value stored in the events table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Click => "click",
        }
    }

    /// Status this event advances the entity to.
    pub fn status(self) -> EngagementStatus {
        match self {
            Self::Open => EngagementStatus::Opened,
            Self::Click => EngagementStatus::Clicked,
        }
    }
}

/// Request context extracted from an inbound tracking request.
///
/// Absent values are empty strings, never omitted fields, so the stored
/// metadata has a stable shape.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Client IP: first `x-forwarded-for` entry, else the platform edge
    /// IP header, else empty.
    pub client_ip: String,
    /// `User-Agent` header, or empty.
    pub user_agent: String,
    /// `Referer` header, or empty.
    pub referrer: String,
    /// Full inbound header set, captured verbatim.
    pub headers: BTreeMap<String, String>,
}

impl RequestContext {
    /// Metadata blob persisted alongside the event.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "headers": self.headers,
            "referrer": self.referrer,
        })
    }
}

/// A tracked entity resolved from an opaque tracking token.
///
/// Only the internal identity and campaign reference are needed
/// downstream of resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Internal entity id.
    pub id: Uuid,
    /// Owning campaign, when the row carries one.
    pub campaign_id: Option<Uuid>,
}

/// One immutable engagement record, appended per resolved request.
///
/// Events are never mutated or deleted after insertion; the entity's
/// status and timestamps are a lossy projection of this history.
#[derive(Debug, Clone)]
pub struct EngagementEvent {
    /// Entity the event belongs to.
    pub entity_id: Uuid,
    /// Open or click.
    pub event_type: EventType,
    /// When the request was observed.
    pub observed_at: DateTime<Utc>,
    /// Captured request context.
    pub context: RequestContext,
    /// Destination URL, for click events only.
    pub link_clicked: Option<String>,
}
