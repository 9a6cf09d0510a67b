use super::{EventKind, RelayEvent};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for RelayEvent
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("type is required")]
    MissingType,
    #[error("unsupported event type '{0}': expected identify or track")]
    UnsupportedType(String),
    #[error("event name is required for track calls")]
    MissingEventName,
    #[error("traits must be a JSON object")]
    TraitsNotObject,
    #[error("properties must be a JSON object")]
    PropertiesNotObject,
}

/// Validates and prepares a RelayEvent for forwarding.
///
/// Validation rules:
/// - Required fields: type (identify or track)
/// - Track calls carry a non-empty event name
/// - traits/properties: JSON objects when present (null is treated as absent)
/// - messageId: auto-generated UUIDv7 if missing or empty
pub fn validate_and_prepare(event: &mut RelayEvent) -> Result<(), ValidationError> {
    if event.event_type.trim().is_empty() {
        return Err(ValidationError::MissingType);
    }

    let kind = event
        .kind()
        .ok_or_else(|| ValidationError::UnsupportedType(event.event_type.clone()))?;

    if kind == EventKind::Track && event.event.as_deref().map_or(true, |name| name.trim().is_empty()) {
        return Err(ValidationError::MissingEventName);
    }

    if event.traits.as_ref().is_some_and(|t| !t.is_object() && !t.is_null()) {
        return Err(ValidationError::TraitsNotObject);
    }
    if event
        .properties
        .as_ref()
        .is_some_and(|p| !p.is_object() && !p.is_null())
    {
        return Err(ValidationError::PropertiesNotObject);
    }

    // Normalize the type so downstream matching is exact
    event.event_type = kind.as_str().to_string();

    if event.message_id.as_ref().map_or(true, |id| id.is_empty()) {
        event.message_id = Some(Uuid::now_v7().to_string());
    }

    Ok(())
}
