pub mod api;
pub mod auth;
pub mod config;
pub mod mapping;

use crate::{Destination, DestinationResponse, ForwardError};
use async_trait::async_trait;
use futures::future::join_all;
use relay::config::{EventRules, ForwardingConfig, SalesforceSettings};
use relay::{EventKind, RelayEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use self::api::SalesforceClient;
use self::auth::{AuthorizationManager, TokenProvider};
use self::config::SalesforceConfig;
use self::mapping::plan_writes;

/// Salesforce destination: writes one sObject per applicable rule.
///
/// Each call authorizes, builds one record per rule, writes them all
/// concurrently and joins on the lot. If the destination reports the
/// session as expired, the cached token is dropped and the whole call is
/// replayed, at most `max_session_retries` times.
pub struct SalesforceDestination {
    client: Arc<SalesforceClient>,
    auth: AuthorizationManager,
    rules: EventRules,
    max_session_retries: u32,
}

impl SalesforceDestination {
    /// Create a destination that obtains tokens through its own REST client.
    pub fn new(config: SalesforceConfig) -> Result<Self, ForwardError> {
        let client = Arc::new(SalesforceClient::new(config.endpoint, config.credentials)?);
        let provider: Arc<dyn TokenProvider> = client.clone();
        Ok(Self {
            auth: AuthorizationManager::new(provider),
            client,
            rules: config.rules,
            max_session_retries: config.max_session_retries,
        })
    }

    /// Create a destination with a substitute token source (for testing).
    pub fn with_token_provider(
        config: SalesforceConfig,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, ForwardError> {
        Ok(Self {
            client: Arc::new(SalesforceClient::new(config.endpoint, config.credentials)?),
            auth: AuthorizationManager::new(provider),
            rules: config.rules,
            max_session_retries: config.max_session_retries,
        })
    }

    /// Validates settings and builds the destination.
    pub fn from_settings(
        settings: &SalesforceSettings,
        forwarding: &ForwardingConfig,
    ) -> Result<Self, ForwardError> {
        Self::new(SalesforceConfig::from_settings(settings, forwarding)?)
    }

    /// Token cache backing this destination.
    pub(crate) fn authorization_manager(&self) -> &AuthorizationManager {
        &self.auth
    }

    /// Forwards one call, replaying it after session expiry.
    ///
    /// Returns the last rule's response (rule order, not completion order),
    /// or `None` when no rule applied.
    pub async fn forward_as(
        &self,
        kind: EventKind,
        event: &RelayEvent,
    ) -> Result<Option<DestinationResponse>, ForwardError> {
        let call_id = Uuid::now_v7();
        let mut retries = 0;

        loop {
            match self.attempt(kind, event, call_id).await {
                Err(e) if e.is_session_expired() => {
                    if retries >= self.max_session_retries {
                        warn!(
                            %call_id,
                            kind = %kind,
                            retries,
                            "Session still rejected after re-authentication"
                        );
                        return Err(ForwardError::SessionExpired { retries });
                    }
                    retries += 1;
                    info!(%call_id, kind = %kind, retries, "Session expired, re-authenticating");
                }
                Err(e) => {
                    warn!(%call_id, kind = %kind, error = %e, error_kind = e.kind(), "Forward failed");
                    return Err(e);
                }
                Ok(response) => return Ok(response),
            }
        }
    }

    /// One pass: authorize, build, write, join.
    async fn attempt(
        &self,
        kind: EventKind,
        event: &RelayEvent,
        call_id: Uuid,
    ) -> Result<Option<DestinationResponse>, ForwardError> {
        let token = self.auth.authorization().await?;

        let writes = plan_writes(
            self.rules.rules_for(kind),
            kind,
            event.event.as_deref(),
            event,
        );
        if writes.is_empty() {
            debug!(%call_id, kind = %kind, event = ?event.event, "No applicable rules");
            return Ok(None);
        }

        debug!(%call_id, kind = %kind, writes = writes.len(), "Issuing record writes");
        let results = join_all(
            writes
                .iter()
                .map(|write| self.client.create_record(&token, write.object, &write.record)),
        )
        .await;

        let mut last = None;
        let mut first_failure = None;
        let mut session_expired = false;
        for result in results {
            match result {
                Ok(response) => {
                    debug!(%call_id, object = %response.object, id = ?response.record_id(), "Record created");
                    last = Some(response);
                }
                Err(e) if e.is_session_expired() => session_expired = true,
                Err(e) => {
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
            }
        }

        if session_expired {
            self.auth.invalidate(&token).await;
            return Err(ForwardError::SessionExpired { retries: 0 });
        }
        if let Some(e) = first_failure {
            return Err(e);
        }

        info!(%call_id, kind = %kind, writes = writes.len(), "Event forwarded");
        Ok(last)
    }
}

#[async_trait]
impl Destination for SalesforceDestination {
    fn name(&self) -> &str {
        "salesforce"
    }

    async fn identify(
        &self,
        event: &RelayEvent,
    ) -> Result<Option<DestinationResponse>, ForwardError> {
        self.forward_as(EventKind::Identify, event).await
    }

    async fn track(&self, event: &RelayEvent) -> Result<Option<DestinationResponse>, ForwardError> {
        self.forward_as(EventKind::Track, event).await
    }
}
