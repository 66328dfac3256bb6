// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    is_valid_coordinate, FeedbackSummary, HospitalRecord, InvalidCoordinate, PenaltyWeights,
    RankQuery, RankedCandidate, SearchContext, StatusUpdate, UserPosition, VulnerabilityRow,
    VulnerabilityWeights, DEFAULT_HOSPITAL_NAME,
};
pub use requests::{ContextError, FeedbackRequest, PointRequest, RecommendRequest, RouteRequest, StatusUpdateRequest};
pub use responses::{
    ErrorResponse, FeedbackResponse, HealthResponse, RecommendResponse, RouteResponse,
    StatusUpdateResponse,
};
