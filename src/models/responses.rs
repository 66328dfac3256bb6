use crate::core::projector::{MapMarker, TableRow};
use crate::models::domain::RankedCandidate;
use crate::services::CacheStats;
use serde::{Deserialize, Serialize};

/// Response for the recommendation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub candidates: Vec<RankedCandidate>,
    pub table: Vec<TableRow>,
    pub markers: Vec<MapMarker>,
    pub total_hospitals: usize,
    pub rows_in: usize,
    pub rows_dropped: usize,
    pub outside_radius: usize,
    /// Encoding the dataset was decoded with
    pub encoding: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "routingConfigured")]
    pub routing_configured: bool,
    #[serde(rename = "routeCache")]
    pub route_cache: Option<CacheStats>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

/// Feedback submission response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(rename = "feedbackId")]
    pub feedback_id: i64,
}

/// Administrative update response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub success: bool,
    pub id: String,
}

/// Route lookup response; routing failures degrade to `available: false`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub available: bool,
    pub geometry: Option<serde_json::Value>,
    pub reason: Option<String>,
}
