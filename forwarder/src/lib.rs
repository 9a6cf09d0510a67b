//! Relay Forwarder - delivers analytics calls to CRM destinations.
//!
//! The routing pipeline hands every validated identify or track call to each
//! configured destination. A destination maps the call onto one record per
//! applicable rule and writes those records through the destination's REST
//! API, re-authenticating when the session has expired.
//!
//! # Architecture
//!
//! ```text
//!      Analytics client (identify / track)
//!                    ↓
//!        POST /api/events (ingestion API)
//!                    ↓
//! ┌─────────────────────────────────────────┐
//! │       Destination (implements trait)     │
//! │  - Authorize (cached bearer token)       │
//! │  - Map event fields per rule             │
//! │  - Write one record per rule             │
//! └─────────────────────────────────────────┘
//!                    ↓
//!      Salesforce REST API (sObject create)
//! ```
//!
//! # Core Types
//!
//! - [`Destination`] - Trait every destination implements
//! - [`DestinationResponse`] - Response to a successful record write
//! - [`ForwardError`] - Classified forwarding failures
//! - [`DestinationStatus`] - Per-destination counters shown by the API

mod destination;
mod error;
mod types;
pub mod api;
pub mod destinations;
pub mod registry;

pub use destination::Destination;
pub use destinations::SalesforceDestination;
pub use error::ForwardError;
pub use types::{DestinationResponse, DestinationStatus};

// Re-export the event type for convenience
pub use relay::RelayEvent;
