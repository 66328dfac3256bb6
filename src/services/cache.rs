use serde::{Deserialize, Serialize};
use std::time::Duration;

/// In-memory TTL cache of route geometries
///
/// Only successful lookups are stored, so a missing API key or a network
/// failure is retried on the next request.
pub struct RouteCache {
    routes: moka::future::Cache<String, serde_json::Value>,
}

impl RouteCache {
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let routes = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { routes }
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let hit = self.routes.get(key).await;
        if hit.is_some() {
            tracing::trace!("Route cache hit: {}", key);
        }
        hit
    }

    pub async fn insert(&self, key: String, geometry: serde_json::Value) {
        self.routes.insert(key, geometry).await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.routes.entry_count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a route between two points, rounded to 1e-5 degrees (~1 m)
    pub fn route(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> String {
        format!(
            "route:{:.5},{:.5}:{:.5},{:.5}",
            from_lat, from_lon, to_lat, to_lon
        )
    }
}
