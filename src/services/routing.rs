use crate::models::UserPosition;
use crate::services::cache::{CacheKey, CacheStats, RouteCache};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Default OpenRouteService endpoint
pub const DEFAULT_ROUTING_ENDPOINT: &str = "https://api.openrouteservice.org";

/// Placeholder shipped in sample configs; treated as "no key"
pub const PLACEHOLDER_API_KEY: &str = "YOUR_OPENROUTESERVICE_API_KEY";

const DIRECTIONS_PATH: &str = "/v2/directions/driving-car/geojson";

/// Errors that can occur when requesting a route
///
/// None of these are fatal to a recommendation; callers degrade to "no route".
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing API key is not configured")]
    ApiKeyNotConfigured,

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("routing service returned HTTP {status}")]
    HttpError { status: u16 },

    #[error("invalid routing response: {0}")]
    InvalidResponse(String),
}

/// Client for an OpenRouteService-compatible directions API
///
/// Requests are bounded by the configured timeout and never retried.
pub struct RoutingClient {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
    cache: Option<RouteCache>,
}

impl RoutingClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RoutingError> {
        let client = Client::builder().timeout(timeout).build()?;

        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY);

        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: RouteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(RouteCache::stats)
    }

    /// Driving route from the user to a destination, as GeoJSON
    pub async fn route(
        &self,
        from: &UserPosition,
        to: &UserPosition,
    ) -> Result<Value, RoutingError> {
        let api_key = self.api_key.as_deref().ok_or(RoutingError::ApiKeyNotConfigured)?;

        let key = CacheKey::route(from.lat(), from.lon(), to.lat(), to.lon());
        if let Some(cache) = &self.cache {
            if let Some(geometry) = cache.get(&key).await {
                return Ok(geometry);
            }
        }

        let url = format!("{}{}", self.endpoint.trim_end_matches('/'), DIRECTIONS_PATH);
        // The directions API takes [lon, lat] pairs
        let body = json!({
            "coordinates": [[from.lon(), from.lat()], [to.lon(), to.lat()]]
        });

        tracing::debug!("Requesting route from: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RoutingError::HttpError {
                status: response.status().as_u16(),
            });
        }

        let geometry: Value = response
            .json()
            .await
            .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

        if !geometry.is_object() {
            return Err(RoutingError::InvalidResponse("expected a GeoJSON object".into()));
        }

        if let Some(cache) = &self.cache {
            cache.insert(key, geometry.clone()).await;
        }

        Ok(geometry)
    }
}
