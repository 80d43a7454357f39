//! TTL key-value cache with family invalidation.
//!
//! Keys are namespaced by family prefix (`nearby:`, `service_detail:`,
//! `auth:`) so a whole family can be invalidated at once. Family
//! invalidation is predicate-based rather than relying on a backend's
//! pattern-delete semantics. The TTL is a single process-wide value; it is
//! the staleness fallback when an invalidation is lost between a store
//! write and the cache write (crash window), never the primary mechanism.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::{debug, warn};
use uuid::Uuid;

/// Nearby-search results, keyed by the raw query inputs.
pub const NEARBY_FAMILY: &str = "nearby:";
/// Single-service detail payloads.
pub const DETAIL_FAMILY: &str = "service_detail:";
/// Resolved principals, keyed by bearer token.
pub const AUTH_FAMILY: &str = "auth:";

/// Key for a nearby query. Built from the parsed values' canonical display
/// form: identical inputs always map to the identical key. This is
/// deliberate cache-aside keying, not semantic rounding — `12.90` and
/// `12.9` parse to the same float and therefore share an entry, but two
/// queries 1 m apart do not.
pub fn nearby_key(lat: f64, lng: f64, radius_km: f64, category: &str) -> String {
    format!("{}{}:{}:{}:{}", NEARBY_FAMILY, lat, lng, radius_km, category)
}

pub fn detail_key(id: Uuid) -> String {
    format!("{}{}", DETAIL_FAMILY, id)
}

pub fn auth_key(token: &str) -> String {
    format!("{}{}", AUTH_FAMILY, token)
}

/// Shared in-process cache. Values are pre-serialized JSON strings so a
/// cache hit returns byte-identical data to the original response.
pub struct ApiCache {
    inner: MokaCache<String, String>,
}

impl ApiCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let inner = MokaCache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let hit = self.inner.get(key).await;
        match &hit {
            Some(_) => debug!(key, "cache hit"),
            None => debug!(key, "cache miss"),
        }
        hit
    }

    pub async fn set(&self, key: String, value: String) {
        self.inner.insert(key, value).await;
    }

    pub async fn delete(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Invalidate every entry whose key starts with `prefix`. Best effort:
    /// a failure here is logged, and the TTL still bounds staleness.
    pub fn invalidate_family(&self, prefix: &'static str) {
        if let Err(e) = self.inner.invalidate_entries_if(move |k, _| k.starts_with(prefix)) {
            warn!(prefix, error = %e, "family invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ApiCache {
        ApiCache::new(Duration::from_secs(60), 1_000)
    }

    #[test]
    fn nearby_key_is_input_stable() {
        let a = nearby_key(12.9, 77.6, 2.0, "cafe");
        let b = nearby_key(12.9, 77.6, 2.0, "cafe");
        assert_eq!(a, b);
        assert_eq!(a, "nearby:12.9:77.6:2:cafe");
        // empty category still occupies its key slot
        assert_eq!(nearby_key(0.0, 0.0, 5.0, ""), "nearby:0:0:5:");
    }

    #[tokio::test]
    async fn get_set_delete_round_trip() {
        let c = cache();
        let key = detail_key(Uuid::new_v4());
        assert!(c.get(&key).await.is_none());
        c.set(key.clone(), "payload".into()).await;
        assert_eq!(c.get(&key).await.as_deref(), Some("payload"));
        c.delete(&key).await;
        assert!(c.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn family_invalidation_spares_other_families() {
        let c = cache();
        c.set(nearby_key(1.0, 2.0, 5.0, ""), "a".into()).await;
        c.set(nearby_key(3.0, 4.0, 5.0, "cafe"), "b".into()).await;
        let detail = detail_key(Uuid::new_v4());
        c.set(detail.clone(), "d".into()).await;

        c.invalidate_family(NEARBY_FAMILY);

        assert!(c.get(&nearby_key(1.0, 2.0, 5.0, "")).await.is_none());
        assert!(c.get(&nearby_key(3.0, 4.0, 5.0, "cafe")).await.is_none());
        assert_eq!(c.get(&detail).await.as_deref(), Some("d"));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let c = ApiCache::new(Duration::from_millis(50), 100);
        c.set("auth:tok".into(), "p".into()).await;
        assert!(c.get("auth:tok").await.is_some());
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(c.get("auth:tok").await.is_none());
    }
}
