use chrono::{DateTime, Duration, Utc};
use log::debug;
use tokio::sync::RwLock;

/// How long an issued bearer token is served from cache before re-authenticating. The gateway
/// reports its own `expiryDate` alongside the token; the cache works off this constant instead.
pub const TOKEN_TTL: Duration = Duration::hours(1);

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// A single-slot bearer token cache, owned by the client instance that uses it.
///
/// [`get`](Self::get) serves the cached value only while `now` is strictly before the expiry
/// instant. Refreshing happens outside the lock, so two concurrent callers may both re-authenticate;
/// the last writer wins and the extra round trip is harmless.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, if one exists and has not expired at `now`.
    pub async fn get(&self, now: DateTime<Utc>) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref().filter(|token| now < token.expires_at).map(|token| token.value.clone())
    }

    pub async fn store(&self, value: String, expires_at: DateTime<Utc>) {
        debug!("Caching gateway token until {expires_at}");
        *self.slot.write().await = Some(CachedToken { value, expires_at });
    }

    /// Drops the cached token so the next call re-authenticates.
    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn an_empty_cache_misses() {
        let cache = TokenCache::new();
        assert_eq!(cache.get(Utc::now()).await, None);
    }

    #[tokio::test]
    async fn serves_strictly_before_the_expiry_instant() {
        let cache = TokenCache::new();
        let expires_at = Utc::now() + Duration::minutes(5);
        cache.store("tok-1".to_string(), expires_at).await;
        assert_eq!(cache.get(expires_at - Duration::seconds(1)).await.as_deref(), Some("tok-1"));
        assert_eq!(cache.get(expires_at).await, None);
        assert_eq!(cache.get(expires_at + Duration::seconds(1)).await, None);
    }

    #[tokio::test]
    async fn storing_replaces_the_previous_token() {
        let cache = TokenCache::new();
        let now = Utc::now();
        cache.store("tok-1".to_string(), now + Duration::minutes(5)).await;
        cache.store("tok-2".to_string(), now + Duration::minutes(10)).await;
        assert_eq!(cache.get(now).await.as_deref(), Some("tok-2"));
    }

    #[tokio::test]
    async fn clearing_forces_a_miss() {
        let cache = TokenCache::new();
        cache.store("tok-1".to_string(), Utc::now() + TOKEN_TTL).await;
        cache.clear().await;
        assert_eq!(cache.get(Utc::now()).await, None);
    }
}
