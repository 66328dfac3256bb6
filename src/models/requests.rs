use crate::models::domain::{InvalidCoordinate, RankQuery, SearchContext, StatusUpdate, UserPosition};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Request to rank hospitals around a position
///
/// Also read from the query string of the upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
    #[validate(range(min = 0.0))]
    #[serde(default, alias = "radius_km", rename = "radiusKm")]
    pub radius_km: Option<f64>,
    #[validate(range(min = 1))]
    #[serde(default, alias = "top_n", rename = "topN")]
    pub top_n: Option<u16>,
}

/// Reasons a validated request still cannot become a search context
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ContextError {
    #[error(transparent)]
    Coordinate(#[from] InvalidCoordinate),

    #[error("radius must be a finite, non-negative number of km, got {0}")]
    InvalidRadius(f64),
}

impl RecommendRequest {
    /// Build the per-request search context
    ///
    /// An explicit `topN` is capped at `max_top_n`. A radius without `topN`
    /// lists every hospital inside it; with neither, `default_top_n` applies.
    pub fn to_context(&self, default_top_n: usize, max_top_n: usize) -> Result<SearchContext, ContextError> {
        let position = UserPosition::new(self.lat, self.lon)?;

        // NaN slips through range validation
        if let Some(radius_km) = self.radius_km {
            if !radius_km.is_finite() || radius_km < 0.0 {
                return Err(ContextError::InvalidRadius(radius_km));
            }
        }

        let top_n = match (self.top_n, self.radius_km) {
            (Some(n), _) => Some((n as usize).min(max_top_n)),
            (None, Some(_)) => None,
            (None, None) => Some(default_top_n.min(max_top_n)),
        };

        Ok(SearchContext {
            position,
            query: RankQuery {
                radius_km: self.radius_km,
                top_n,
            },
        })
    }
}

/// Request to leave a rating for a hospital
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "hospital_id", rename = "hospitalId")]
    pub hospital_id: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub comment: String,
}

/// Administrative status change; the hospital id comes from the path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub accepting: Option<bool>,
    #[serde(default)]
    pub waiting: Option<u32>,
    #[serde(default, alias = "capacity_resource", alias = "deliveryBeds", rename = "capacityResource")]
    pub capacity_resource: Option<u32>,
}

impl StatusUpdateRequest {
    pub fn into_update(self, id: String) -> StatusUpdate {
        StatusUpdate {
            id,
            accepting: self.accepting,
            waiting: self.waiting,
            capacity_resource: self.capacity_resource,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accepting.is_none() && self.waiting.is_none() && self.capacity_resource.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct PointRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
}

impl PointRequest {
    pub fn to_position(&self) -> Result<UserPosition, InvalidCoordinate> {
        UserPosition::new(self.lat, self.lon)
    }
}

/// Request for a driving route between two points
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RouteRequest {
    #[validate(nested)]
    pub from: PointRequest,
    #[validate(nested)]
    pub to: PointRequest,
}
