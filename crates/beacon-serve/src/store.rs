//! Datastore boundary: the `TrackingStore` trait and its Postgres
//! implementation.
//!
//! All SQL is runtime-checked (`sqlx::query`, not `sqlx::query!`) and
//! built from a [`SchemaProfile`], so one implementation serves both the
//! legacy and mailmeteor table layouts. Table, column, and status names
//! come exclusively from the profile's static strings; request data is
//! always bound, never interpolated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use beacon_core::{EngagementEvent, EngagementStatus, ResolvedEntity, SchemaProfile};

/// Result type for datastore operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the datastore boundary.
///
/// Every variant is handled the same way by the pipeline (logged and
/// swallowed); the distinction exists for operators reading the logs.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The call exceeded the configured datastore timeout.
    #[error("datastore call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Operations the tracking pipeline needs from the datastore.
///
/// All three calls are independently failable, network-latent, and
/// treated as best-effort by the caller.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Look up the entity owning a tracking token.
    async fn find_entity_by_token(&self, token: &str) -> StoreResult<Option<ResolvedEntity>>;

    /// Append one immutable engagement event. No uniqueness constraint:
    /// concurrent identical events all persist.
    async fn insert_event(&self, event: &EngagementEvent) -> StoreResult<()>;

    /// Conditionally advance the entity's status and its timestamp.
    ///
    /// The write must never lower the stored rank; implementations
    /// enforce the guard atomically (a single conditional write, not a
    /// read-then-write), since concurrent open/click requests for the
    /// same entity can race.
    async fn advance_status(
        &self,
        entity_id: Uuid,
        status: EngagementStatus,
        observed_at: DateTime<Utc>,
    ) -> StoreResult<()>;
}

/// Postgres-backed tracking store.
pub struct PgTrackingStore {
    pool: PgPool,
    profile: SchemaProfile,
}

impl PgTrackingStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool, profile: SchemaProfile) -> Self {
        Self { pool, profile }
    }

    /// Build a store with a lazily connected pool.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        profile: SchemaProfile,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool, profile))
    }
}

#[async_trait]
impl TrackingStore for PgTrackingStore {
    async fn find_entity_by_token(&self, token: &str) -> StoreResult<Option<ResolvedEntity>> {
        let row = sqlx::query(&find_entity_sql(self.profile))
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            Ok(ResolvedEntity {
                id: r.try_get("id")?,
                campaign_id: r.try_get("campaign_id")?,
            })
        })
        .transpose()
    }

    async fn insert_event(&self, event: &EngagementEvent) -> StoreResult<()> {
        sqlx::query(&insert_event_sql(self.profile))
            .bind(event.entity_id)
            .bind(event.event_type.as_str())
            .bind(&event.context.client_ip)
            .bind(&event.context.user_agent)
            .bind(&event.link_clicked)
            .bind(event.context.metadata())
            .bind(event.observed_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn advance_status(
        &self,
        entity_id: Uuid,
        status: EngagementStatus,
        observed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Sent has no timestamp column and is never written by tracking.
        let Some(sql) = advance_status_sql(self.profile, status) else {
            return Ok(());
        };

        sqlx::query(&sql)
            .bind(entity_id)
            .bind(self.profile.status_value(status))
            .bind(observed_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// `SELECT` resolving a tracking token to an entity.
fn find_entity_sql(profile: SchemaProfile) -> String {
    format!(
        "SELECT id, campaign_id FROM {} WHERE tracking_id = $1 LIMIT 1",
        profile.entity_table()
    )
}

/// `INSERT` appending one engagement event.
fn insert_event_sql(profile: SchemaProfile) -> String {
    format!(
        "INSERT INTO {} ({}, event_type, ip_address, user_agent, link_clicked, metadata, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        profile.events_table(),
        profile.entity_ref_column()
    )
}

/// Conditional `UPDATE` advancing the entity status.
///
/// The WHERE clause excludes every status value of strictly higher rank
/// than the one being written, which makes the monotonicity guard a
/// single atomic statement. For the maximal rank (clicked) the guard is
/// empty and the update is unconditional. Returns `None` for statuses
/// tracking never writes.
fn advance_status_sql(profile: SchemaProfile, status: EngagementStatus) -> Option<String> {
    let timestamp_column = status.timestamp_column()?;

    let mut sql = format!(
        "UPDATE {} SET {} = $2, {} = $3 WHERE id = $1",
        profile.entity_table(),
        profile.status_column(),
        timestamp_column
    );

    // Guard values are static profile strings, not request data.
    let higher: Vec<String> = status
        .higher_ranked()
        .map(|s| format!("'{}'", profile.status_value(s)))
        .collect();
    if !higher.is_empty() {
        sql.push_str(&format!(
            " AND {} NOT IN ({})",
            profile.status_column(),
            higher.join(", ")
        ));
    }

    Some(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_entity_sql_legacy() {
        assert_eq!(
            find_entity_sql(SchemaProfile::Legacy),
            "SELECT id, campaign_id FROM emails WHERE tracking_id = $1 LIMIT 1"
        );
    }

    #[test]
    fn find_entity_sql_mailmeteor() {
        assert_eq!(
            find_entity_sql(SchemaProfile::Mailmeteor),
            "SELECT id, campaign_id FROM recipients WHERE tracking_id = $1 LIMIT 1"
        );
    }

    #[test]
    fn insert_event_sql_uses_profile_names() {
        let legacy = insert_event_sql(SchemaProfile::Legacy);
        assert!(legacy.starts_with("INSERT INTO email_events (email_id,"));

        let mm = insert_event_sql(SchemaProfile::Mailmeteor);
        assert!(mm.starts_with("INSERT INTO tracking_events (recipient_id,"));
    }

    #[test]
    fn open_update_guards_against_clicked() {
        let sql = advance_status_sql(SchemaProfile::Mailmeteor, EngagementStatus::Opened).unwrap();
        assert_eq!(
            sql,
            "UPDATE recipients SET campaign_status = $2, opened_at = $3 \
             WHERE id = $1 AND campaign_status NOT IN ('EMAIL_CLICKED')"
        );
    }

    #[test]
    fn click_update_is_unconditional() {
        let sql = advance_status_sql(SchemaProfile::Legacy, EngagementStatus::Clicked).unwrap();
        assert_eq!(
            sql,
            "UPDATE emails SET status = $2, clicked_at = $3 WHERE id = $1"
        );
    }

    #[test]
    fn sent_is_never_written() {
        assert!(advance_status_sql(SchemaProfile::Legacy, EngagementStatus::Sent).is_none());
        assert!(advance_status_sql(SchemaProfile::Mailmeteor, EngagementStatus::Sent).is_none());
    }
}
