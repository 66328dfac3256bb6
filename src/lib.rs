//! Obstetric hospital matching - ranks maternity hospitals for an emergency
//!
//! This library provides the pipeline behind the matching service: a hospital
//! table is decoded and normalized, distances from the user are computed with
//! the haversine formula, candidates are scored and ranked, and the ranking is
//! projected into table rows and map markers.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{distance::haversine_distance, load_table, Ranker};
pub use models::{HospitalRecord, PenaltyWeights, RankedCandidate, SearchContext, UserPosition};
