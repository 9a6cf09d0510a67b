//! Bearer token cache for one credential set.
//!
//! The token is fetched lazily, cached with no expiry timer, and dropped
//! only when the destination reports the session as invalid. The next
//! call then fetches a fresh one.

use crate::error::ForwardError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Source of fresh bearer tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Performs one token grant round-trip.
    async fn fetch_token(&self) -> Result<String, ForwardError>;
}

/// Owns the cached bearer token for a single credential set.
///
/// The slot lock is held across the fetch, so callers racing on an empty
/// cache wait for one grant instead of each issuing their own.
pub struct AuthorizationManager {
    provider: Arc<dyn TokenProvider>,
    cached: Mutex<Option<String>>,
}

impl AuthorizationManager {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached token, fetching one first if the cache is empty.
    ///
    /// A failed fetch leaves the cache empty and propagates the error.
    pub async fn authorization(&self) -> Result<String, ForwardError> {
        let mut slot = self.cached.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        debug!("No cached bearer token, requesting a new one");
        let token = self.provider.fetch_token().await?;
        *slot = Some(token.clone());
        info!("Bearer token acquired");
        Ok(token)
    }

    /// Drops the cached token if it is still `stale`.
    ///
    /// Returns false when another caller already replaced it; that newer
    /// token is kept.
    pub async fn invalidate(&self, stale: &str) -> bool {
        let mut slot = self.cached.lock().await;
        if slot.as_deref() == Some(stale) {
            *slot = None;
            debug!("Cached bearer token invalidated");
            true
        } else {
            false
        }
    }

    pub async fn is_cached(&self) -> bool {
        self.cached.lock().await.is_some()
    }
}
