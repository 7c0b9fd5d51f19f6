//! Beacon Core - domain model for email engagement tracking.
//!
//! This crate holds the I/O-free types shared by the tracking service:
//! the engagement status scale, the event/record types, and the schema
//! profiles describing the two supported datastore layouts. All network
//! and database access lives in `beacon-serve`.

pub mod event;
pub mod schema;
pub mod status;

pub use event::{EngagementEvent, EventType, RequestContext, ResolvedEntity};
pub use schema::SchemaProfile;
pub use status::EngagementStatus;
