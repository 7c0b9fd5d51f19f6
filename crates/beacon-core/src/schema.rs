//! Schema profiles for the two supported datastore layouts.
//!
//! The legacy and Mailmeteor deployments run identical tracking logic
//! against differently named tables, columns, and status values. A
//! profile owns every name that differs; everything else (tracking_id,
//! opened_at/clicked_at, the event columns) is shared.

use std::str::FromStr;

use crate::status::EngagementStatus;

/// Datastore naming profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaProfile {
    /// `emails` / `email_events`, lowercase status values.
    Legacy,
    /// `recipients` / `tracking_events`, `EMAIL_*` status values.
    Mailmeteor,
}

impl SchemaProfile {
    /// Table holding tracked entities, keyed by `tracking_id`.
    pub fn entity_table(self) -> &'static str {
        match self {
            Self::Legacy => "emails",
            Self::Mailmeteor => "recipients",
        }
    }

    /// Append-only events table.
    pub fn events_table(self) -> &'static str {
        match self {
            Self::Legacy => "email_events",
            Self::Mailmeteor => "tracking_events",
        }
    }

    /// Events-table column referencing the entity.
    pub fn entity_ref_column(self) -> &'static str {
        match self {
            Self::Legacy => "email_id",
            Self::Mailmeteor => "recipient_id",
        }
    }

    /// Entity-table column holding the engagement status.
    pub fn status_column(self) -> &'static str {
        match self {
            Self::Legacy => "status",
            Self::Mailmeteor => "campaign_status",
        }
    }

    /// Stored value for a status under this profile.
    pub fn status_value(self, status: EngagementStatus) -> &'static str {
        match (self, status) {
            (Self::Legacy, EngagementStatus::Sent) => "sent",
            (Self::Legacy, EngagementStatus::Opened) => "opened",
            (Self::Legacy, EngagementStatus::Clicked) => "clicked",
            (Self::Mailmeteor, EngagementStatus::Sent) => "EMAIL_SENT",
            (Self::Mailmeteor, EngagementStatus::Opened) => "EMAIL_OPENED",
            (Self::Mailmeteor, EngagementStatus::Clicked) => "EMAIL_CLICKED",
        }
    }
}

/// Error parsing a schema profile name from configuration.
#[derive(Debug, thiserror::Error)]
#[error("unknown schema profile: {0} (expected \"legacy\" or \"mailmeteor\")")]
pub struct ParseSchemaProfileError(String);

impl FromStr for SchemaProfile {
    type Err = ParseSchemaProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "mailmeteor" => Ok(Self::Mailmeteor),
            other => Err(ParseSchemaProfileError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_names() {
        let p = SchemaProfile::Legacy;
        assert_eq!(p.entity_table(), "emails");
        assert_eq!(p.events_table(), "email_events");
        assert_eq!(p.entity_ref_column(), "email_id");
        assert_eq!(p.status_column(), "status");
        assert_eq!(p.status_value(EngagementStatus::Clicked), "clicked");
    }

    #[test]
    fn mailmeteor_names() {
        let p = SchemaProfile::Mailmeteor;
        assert_eq!(p.entity_table(), "recipients");
        assert_eq!(p.events_table(), "tracking_events");
        assert_eq!(p.entity_ref_column(), "recipient_id");
        assert_eq!(p.status_column(), "campaign_status");
        assert_eq!(p.status_value(EngagementStatus::Opened), "EMAIL_OPENED");
        assert_eq!(p.status_value(EngagementStatus::Clicked), "EMAIL_CLICKED");
    }

    #[test]
    fn status_values_are_distinct_per_profile() {
        for profile in [SchemaProfile::Legacy, SchemaProfile::Mailmeteor] {
            let values: Vec<_> = EngagementStatus::ALL
                .into_iter()
                .map(|s| profile.status_value(s))
                .collect();
            assert_eq!(values.len(), 3);
            assert_ne!(values[0], values[1]);
            assert_ne!(values[1], values[2]);
        }
    }

    #[test]
    fn parse_profile_names() {
        assert_eq!(
            "legacy".parse::<SchemaProfile>().unwrap(),
            SchemaProfile::Legacy
        );
        assert_eq!(
            "Mailmeteor".parse::<SchemaProfile>().unwrap(),
            SchemaProfile::Mailmeteor
        );
        assert_eq!(
            " MAILMETEOR ".parse::<SchemaProfile>().unwrap(),
            SchemaProfile::Mailmeteor
        );
        assert!("supabase".parse::<SchemaProfile>().is_err());
    }
}
