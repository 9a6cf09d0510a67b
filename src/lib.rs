// Inbound event envelope and typed field resolution
pub mod event;

// Workspace configuration (TOML + environment overrides)
pub mod config;

// Destination credentials
pub mod credentials;

pub use event::{EventKind, FieldSource, RelayEvent, ValidationError};
