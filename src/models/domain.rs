use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display label used when a dataset has no usable name for a hospital
pub const DEFAULT_HOSPITAL_NAME: &str = "Hospital";

/// A coordinate pair outside the valid latitude/longitude ranges
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid coordinate: lat={lat}, lon={lon}")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Returns true when `lat`/`lon` are finite and within ±90 / ±180 degrees
#[inline]
pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

/// One hospital row after column normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalRecord {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_true")]
    pub accepting: bool,
    #[serde(default)]
    pub waiting: u32,
    /// Scarce specialized resource, e.g. delivery beds
    #[serde(default)]
    pub capacity_resource: u32,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(default)]
    pub addr: Option<String>,
}

fn default_true() -> bool { true }

/// Where the user is, entered manually or taken from a device location source
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UserPosition {
    lat: f64,
    lon: f64,
}

impl UserPosition {
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinate> {
        if is_valid_coordinate(lat, lon) {
            Ok(Self { lat, lon })
        } else {
            Err(InvalidCoordinate { lat, lon })
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// A hospital with its distance to the user and composite score (lower is better)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub record: HospitalRecord,
    pub distance_km: f64,
    pub score: f64,
}

/// Optional radius filter and result cap for a ranking pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RankQuery {
    pub radius_km: Option<f64>,
    pub top_n: Option<usize>,
}

/// Everything one recommendation request needs, built per request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchContext {
    pub position: UserPosition,
    pub query: RankQuery,
}

/// Penalty terms added to distance when scoring a candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyWeights {
    pub not_accepting: f64,
    pub missing_resource: f64,
    pub waiting_weight: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            not_accepting: 1000.0,
            missing_resource: 20.0,
            waiting_weight: 2.0,
        }
    }
}

/// Weights of the per-hospital vulnerability index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityWeights {
    pub not_accepting: f64,
    pub rating_gap: f64,
    pub missing_resource: f64,
    pub waiting_weight: f64,
}

impl Default for VulnerabilityWeights {
    fn default() -> Self {
        Self {
            not_accepting: 50.0,
            rating_gap: 5.0,
            missing_resource: 20.0,
            waiting_weight: 2.0,
        }
    }
}

/// Administrative change to a hospital's operational status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: String,
    pub accepting: Option<bool>,
    pub waiting: Option<u32>,
    pub capacity_resource: Option<u32>,
}

/// Aggregated visitor feedback for one hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub hospital_id: String,
    pub avg_rating: f64,
    pub count: i64,
}

/// One row of the vulnerability report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRow {
    pub id: String,
    pub name: String,
    pub accepting: bool,
    pub capacity_resource: u32,
    pub waiting: u32,
    pub avg_rating: f64,
    pub vulnerability: f64,
}
