// Service exports
pub mod cache;
pub mod feedback;
pub mod hospital_store;
pub mod routing;

pub use cache::{CacheKey, CacheStats, RouteCache};
pub use feedback::{FeedbackEntry, FeedbackError, FeedbackStore};
pub use hospital_store::{HospitalStore, StoreError, SAMPLE_HOSPITALS_CSV};
pub use routing::{RoutingClient, RoutingError, DEFAULT_ROUTING_ENDPOINT, PLACEHOLDER_API_KEY};
