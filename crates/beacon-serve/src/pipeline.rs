//! The tracking pipeline: resolve, append, reconcile.
//!
//! Every stage after input validation is best-effort. Stage results are
//! aggregated and logged here, never propagated: the handlers build
//! their response (pixel or redirect) unconditionally from the returned
//! [`TrackOutcome`], so no internal failure can surface to the mail
//! client.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;

use beacon_core::{EngagementEvent, EventType, RequestContext};

use crate::store::{StoreError, StoreResult, TrackingStore};

/// How far the pipeline got. Only affects logging and, on the link
/// endpoint, whether cache-disabling headers are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// No tracking token on the request; nothing was attempted.
    Skipped,
    /// Token present but no entity resolved (miss, error, or timeout).
    Unresolved,
    /// Entity resolved; event append and status advance were attempted
    /// (each individually best-effort).
    Recorded,
}

/// Run the pipeline for one inbound tracking request.
///
/// `link` carries the click destination and is stored on the event; it
/// is `None` for opens. Returns without error in all cases.
pub async fn record_engagement(
    store: &dyn TrackingStore,
    call_timeout: Duration,
    token: Option<&str>,
    event_type: EventType,
    context: RequestContext,
    link: Option<&str>,
) -> TrackOutcome {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return TrackOutcome::Skipped;
    };

    let entity = match bounded(call_timeout, store.find_entity_by_token(token)).await {
        Ok(Some(entity)) => entity,
        Ok(None) => {
            // Not an error per se: a stale or foreign token.
            tracing::debug!(token = %token, "tracking token did not resolve to an entity");
            return TrackOutcome::Unresolved;
        }
        Err(err) => {
            tracing::warn!(op = "find_entity_by_token", token = %token, error = %err, "entity lookup failed");
            return TrackOutcome::Unresolved;
        }
    };

    let observed_at = Utc::now();
    let status = event_type.status();
    let event = EngagementEvent {
        entity_id: entity.id,
        event_type,
        observed_at,
        context,
        link_clicked: link.map(str::to_owned),
    };

    // Both writes derive only from the resolved entity and the event
    // type, so they run concurrently; each is bounded on its own.
    let (appended, advanced) = tokio::join!(
        bounded(call_timeout, store.insert_event(&event)),
        bounded(call_timeout, store.advance_status(entity.id, status, observed_at)),
    );

    if let Err(err) = appended {
        tracing::warn!(
            op = "insert_event",
            entity_id = %entity.id,
            event_type = event_type.as_str(),
            error = %err,
            "event append failed"
        );
    }
    if let Err(err) = advanced {
        tracing::warn!(
            op = "advance_status",
            entity_id = %entity.id,
            status = ?status,
            error = %err,
            "status update failed"
        );
    }

    tracing::debug!(
        entity_id = %entity.id,
        campaign_id = ?entity.campaign_id,
        event_type = event_type.as_str(),
        "engagement recorded"
    );

    TrackOutcome::Recorded
}

/// Bound a datastore call so response emission never waits on a stuck
/// round-trip.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use uuid::Uuid;

    use beacon_core::{EngagementStatus, ResolvedEntity};

    use crate::store::testing::MockStore;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn entity() -> ResolvedEntity {
        ResolvedEntity {
            id: Uuid::new_v4(),
            campaign_id: Some(Uuid::new_v4()),
        }
    }

    #[tokio::test]
    async fn missing_token_skips_all_store_calls() {
        let store = MockStore::resolving(entity());
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            None,
            EventType::Open,
            RequestContext::default(),
            None,
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Skipped);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
        assert!(store.events.lock().unwrap().is_empty());
        assert!(store.status_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_token_is_treated_as_missing() {
        let store = MockStore::resolving(entity());
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            Some("   "),
            EventType::Open,
            RequestContext::default(),
            None,
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Skipped);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn open_records_one_event_and_advances_status() {
        let ent = entity();
        let store = MockStore::resolving(ent);
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            Some("tok-1"),
            EventType::Open,
            RequestContext::default(),
            None,
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Recorded);

        let events = store.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_id, ent.id);
        assert_eq!(events[0].event_type, EventType::Open);
        assert_eq!(events[0].link_clicked, None);

        let writes = store.status_writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, ent.id);
        assert_eq!(writes[0].1, EngagementStatus::Opened);
        assert_eq!(writes[0].2, events[0].observed_at);
    }

    #[tokio::test]
    async fn click_stores_destination_and_sets_clicked() {
        let ent = entity();
        let store = MockStore::resolving(ent);
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            Some("tok-2"),
            EventType::Click,
            RequestContext::default(),
            Some("https://example.com/page"),
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Recorded);

        let events = store.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Click);
        assert_eq!(
            events[0].link_clicked.as_deref(),
            Some("https://example.com/page")
        );

        let writes = store.status_writes.lock().unwrap();
        assert_eq!(writes[0].1, EngagementStatus::Clicked);
    }

    #[tokio::test]
    async fn unresolvable_token_records_nothing() {
        let store = MockStore::default();
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            Some("stale"),
            EventType::Click,
            RequestContext::default(),
            Some("https://dest.example"),
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Unresolved);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
        assert!(store.events.lock().unwrap().is_empty());
        assert!(store.status_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_is_fail_open() {
        let store = MockStore {
            fail_lookup: true,
            ..MockStore::resolving(entity())
        };
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            Some("tok-3"),
            EventType::Open,
            RequestContext::default(),
            None,
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Unresolved);
        assert!(store.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_failure_does_not_block_status_update() {
        let ent = entity();
        let store = MockStore {
            fail_insert: true,
            ..MockStore::resolving(ent)
        };
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            Some("tok-4"),
            EventType::Open,
            RequestContext::default(),
            None,
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Recorded);
        assert!(store.events.lock().unwrap().is_empty());
        assert_eq!(store.status_writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_failure_does_not_block_event_append() {
        let store = MockStore {
            fail_update: true,
            ..MockStore::resolving(entity())
        };
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            Some("tok-5"),
            EventType::Click,
            RequestContext::default(),
            Some("https://example.com"),
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Recorded);
        assert_eq!(store.events.lock().unwrap().len(), 1);
        assert!(store.status_writes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_times_out_and_falls_through() {
        let store = MockStore {
            lookup_delay: Some(Duration::from_secs(60)),
            ..MockStore::resolving(entity())
        };
        let outcome = record_engagement(
            &store,
            TIMEOUT,
            Some("tok-slow"),
            EventType::Open,
            RequestContext::default(),
            None,
        )
        .await;

        assert_eq!(outcome, TrackOutcome::Unresolved);
        assert!(store.events.lock().unwrap().is_empty());
        assert!(store.status_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn context_is_carried_onto_the_event() {
        let store = MockStore::resolving(entity());
        let context = RequestContext {
            client_ip: "203.0.113.9".to_string(),
            user_agent: "Thunderbird/115".to_string(),
            ..RequestContext::default()
        };

        record_engagement(
            &store,
            TIMEOUT,
            Some("tok-6"),
            EventType::Open,
            context,
            None,
        )
        .await;

        let events = store.events.lock().unwrap();
        assert_eq!(events[0].context.client_ip, "203.0.113.9");
        assert_eq!(events[0].context.user_agent, "Thunderbird/115");
    }
}
