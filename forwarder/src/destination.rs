use crate::error::ForwardError;
use crate::types::DestinationResponse;
use async_trait::async_trait;
use relay::{EventKind, RelayEvent, ValidationError};

/// Destination interface for outbound integrations.
///
/// Every destination receives the same two call types from the routing
/// pipeline. A call resolves exactly once: `Ok(Some(response))` when at
/// least one record was written, `Ok(None)` when no configured rule applied
/// (a no-op, not an error), or a classified [`ForwardError`].
///
/// # Lifecycle
/// 1. Registry builds the destination from validated settings
/// 2. Ingestion API validates the inbound event
/// 3. API calls `forward(event)`, which dispatches on the call type
/// 4. Destination authorizes, maps and writes, then reports one result
///
/// # Example
/// ```no_run
/// use async_trait::async_trait;
/// use forwarder::{Destination, DestinationResponse, ForwardError};
/// use relay::RelayEvent;
///
/// struct LogDestination;
///
/// #[async_trait]
/// impl Destination for LogDestination {
///     fn name(&self) -> &str {
///         "log"
///     }
///
///     async fn identify(
///         &self,
///         event: &RelayEvent,
///     ) -> Result<Option<DestinationResponse>, ForwardError> {
///         tracing::info!(user_id = ?event.user_id, "identify");
///         Ok(None)
///     }
///
///     async fn track(
///         &self,
///         event: &RelayEvent,
///     ) -> Result<Option<DestinationResponse>, ForwardError> {
///         tracing::info!(event = ?event.event, "track");
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait Destination: Send + Sync {
    /// Returns the unique identifier for this destination.
    ///
    /// Lowercase (e.g. "salesforce"); used for API status and logging.
    fn name(&self) -> &str;

    /// Forwards an identify call using the identify rule list.
    async fn identify(&self, event: &RelayEvent)
        -> Result<Option<DestinationResponse>, ForwardError>;

    /// Forwards a track call using the track rule list.
    async fn track(&self, event: &RelayEvent) -> Result<Option<DestinationResponse>, ForwardError>;

    /// Dispatches on the event's call type.
    async fn forward(
        &self,
        event: &RelayEvent,
    ) -> Result<Option<DestinationResponse>, ForwardError> {
        match event.kind() {
            Some(EventKind::Identify) => self.identify(event).await,
            Some(EventKind::Track) => self.track(event).await,
            None if event.event_type.is_empty() => Err(ValidationError::MissingType.into()),
            None => Err(ValidationError::UnsupportedType(event.event_type.clone()).into()),
        }
    }
}
