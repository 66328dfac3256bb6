use crate::core::{distance::distance_from, scoring::calculate_score};
use crate::models::{HospitalRecord, PenaltyWeights, RankedCandidate, SearchContext};

/// Result of a ranking pass
#[derive(Debug, Clone, PartialEq)]
pub struct RankResult {
    pub candidates: Vec<RankedCandidate>,
    pub total_candidates: usize,
    /// Candidates removed by the radius filter
    pub outside_radius: usize,
}

/// Candidate ranker - orders hospitals for a user position
///
/// # Pipeline Stages
/// 1. Distance from the user to every hospital
/// 2. Composite score
/// 3. Optional radius filter
/// 4. Stable sort by score (ties keep input order)
/// 5. Optional top-N cap
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    weights: PenaltyWeights,
}

impl Ranker {
    pub fn new(weights: PenaltyWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: PenaltyWeights::default(),
        }
    }

    pub fn weights(&self) -> &PenaltyWeights {
        &self.weights
    }

    /// Rank hospitals for the position and query in `context`
    ///
    /// An empty input, or a radius that excludes everything, yields an empty
    /// result rather than an error.
    pub fn rank(&self, context: &SearchContext, records: Vec<HospitalRecord>) -> RankResult {
        let total_candidates = records.len();
        let position = &context.position;

        let scored = records.into_iter().map(|record| {
            let distance_km = distance_from(position, record.lat, record.lon);
            let score = calculate_score(&record, distance_km, &self.weights);
            RankedCandidate {
                record,
                distance_km,
                score,
            }
        });

        let mut candidates: Vec<RankedCandidate> = match context.query.radius_km {
            Some(radius_km) => scored.filter(|c| c.distance_km <= radius_km).collect(),
            None => scored.collect(),
        };
        let outside_radius = total_candidates - candidates.len();

        // `sort_by` is stable, so equal scores keep their input order
        candidates.sort_by(|a, b| a.score.total_cmp(&b.score));

        if let Some(top_n) = context.query.top_n {
            candidates.truncate(top_n);
        }

        tracing::debug!(
            "Ranked {} of {} hospitals ({} outside radius)",
            candidates.len(),
            total_candidates,
            outside_radius
        );

        RankResult {
            candidates,
            total_candidates,
            outside_radius,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
