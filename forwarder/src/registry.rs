//! Destination registry - builds the configured destinations.

use crate::destinations::SalesforceDestination;
use crate::Destination;
use anyhow::{Context, Result};
use relay::config::RelayConfig;
use std::sync::Arc;
use tracing::info;

/// Builds every configured destination.
///
/// Settings are validated here, so a missing credential stops startup
/// instead of failing the first forwarded call.
pub fn build_destinations(config: &RelayConfig) -> Result<Vec<Arc<dyn Destination>>> {
    let salesforce = SalesforceDestination::from_settings(&config.salesforce, &config.forwarding)
        .context("Failed to configure salesforce destination")?;
    info!(
        identify_rules = config.salesforce.events.identify.len(),
        track_rules = config.salesforce.events.track.len(),
        max_session_retries = config.forwarding.max_session_retries,
        "Salesforce destination configured"
    );

    Ok(vec![Arc::new(salesforce)])
}
