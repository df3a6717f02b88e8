//! Process-wide bearer token cache.
//!
//! One injectable cache instance is shared by every worker of a process
//! through the dependency context, so tests can substitute isolated
//! instances and concurrent access stays race-free. Tokens are cached until
//! a caller explicitly replaces or invalidates them; expiry is not tracked
//! here.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use vodarc_models::Platform;

/// Thread-safe bearer token cache keyed by platform.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<Platform, String>>,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached token for a platform, if any.
    pub async fn get(&self, platform: Platform) -> Option<String> {
        self.tokens.read().await.get(&platform).cloned()
    }

    /// Replace the cached token for a platform.
    pub async fn set(&self, platform: Platform, token: impl Into<String>) {
        self.tokens.write().await.insert(platform, token.into());
        debug!(platform = %platform, "Cached access token");
    }

    /// Drop the cached token for a platform.
    pub async fn invalidate(&self, platform: Platform) {
        self.tokens.write().await.remove(&platform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_invalidate() {
        let cache = TokenCache::new();
        assert!(cache.get(Platform::Twitch).await.is_none());

        cache.set(Platform::Twitch, "abc").await;
        assert_eq!(cache.get(Platform::Twitch).await.as_deref(), Some("abc"));
        // Other platforms are unaffected
        assert!(cache.get(Platform::Kick).await.is_none());

        cache.invalidate(Platform::Twitch).await;
        assert!(cache.get(Platform::Twitch).await.is_none());
    }

    #[tokio::test]
    async fn set_replaces_existing_token() {
        let cache = TokenCache::new();
        cache.set(Platform::Kick, "old").await;
        cache.set(Platform::Kick, "new").await;
        assert_eq!(cache.get(Platform::Kick).await.as_deref(), Some("new"));
    }
}
