use crate::models::{FeedbackSummary, HospitalRecord, PenaltyWeights, VulnerabilityRow, VulnerabilityWeights};
use std::collections::HashMap;

/// Composite suitability score for a hospital; lower is better
///
/// Scoring formula:
/// score = distance_km
///     + not_accepting     (if the hospital is not accepting patients)
///     + missing_resource  (if no delivery beds are available)
///     + waiting_weight * waiting
///
/// With non-negative weights the score never decreases as distance or the
/// waiting count grow, or when acceptance or the resource is lost.
#[inline]
pub fn calculate_score(record: &HospitalRecord, distance_km: f64, weights: &PenaltyWeights) -> f64 {
    let mut score = distance_km;

    if !record.accepting {
        score += weights.not_accepting;
    }

    if record.capacity_resource == 0 {
        score += weights.missing_resource;
    }

    score + weights.waiting_weight * record.waiting as f64
}

/// Vulnerability index of a hospital given its average visitor rating
///
/// Hospitals without feedback are scored with an average rating of 0.
#[inline]
pub fn calculate_vulnerability(
    record: &HospitalRecord,
    avg_rating: f64,
    weights: &VulnerabilityWeights,
) -> f64 {
    let mut index = 0.0;

    if !record.accepting {
        index += weights.not_accepting;
    }

    index += (5.0 - avg_rating).max(0.0) * weights.rating_gap;

    if record.capacity_resource == 0 {
        index += weights.missing_resource;
    }

    index + weights.waiting_weight * record.waiting as f64
}

/// Join hospitals with their feedback summary, keeping dataset order
pub fn vulnerability_report(
    records: &[HospitalRecord],
    feedback: &[FeedbackSummary],
    weights: &VulnerabilityWeights,
) -> Vec<VulnerabilityRow> {
    let ratings: HashMap<&str, f64> = feedback
        .iter()
        .map(|f| (f.hospital_id.as_str(), f.avg_rating))
        .collect();

    records
        .iter()
        .map(|record| {
            let avg_rating = ratings.get(record.id.as_str()).copied().unwrap_or(0.0);
            VulnerabilityRow {
                id: record.id.clone(),
                name: record.name.clone(),
                accepting: record.accepting,
                capacity_resource: record.capacity_resource,
                waiting: record.waiting,
                avg_rating,
                vulnerability: calculate_vulnerability(record, avg_rating, weights),
            }
        })
        .collect()
}
