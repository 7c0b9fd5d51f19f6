//! Beacon Serve - HTTP endpoints for email engagement tracking.
//!
//! This crate hosts the two tracking endpoints embedded in outbound
//! emails:
//!
//! - `GET /pixel?tid=<token>` returns a 1x1 transparent GIF and records
//!   an `open` event.
//! - `GET /click?tid=<token>&url=<destination>` redirects to the
//!   destination and records a `click` event.
//!
//! # Fail-open contract
//!
//! Tracking URLs are rendered by arbitrary mail clients, so these
//! endpoints must never surface an error page or a broken image. Every
//! stage after input validation (entity lookup, event append, status
//! update) is best-effort: failures are logged and discarded, and the
//! response (pixel bytes or redirect) is built unconditionally at the
//! end of the pipeline.
//!
//! # Status monotonicity
//!
//! The entity's engagement status ranks on `SENT < OPENED < CLICKED`
//! and never regresses. The guard is a single conditional UPDATE in the
//! datastore, so concurrent open/click requests for the same entity
//! cannot race each other into a lower rank.

pub mod config;
pub mod context;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
