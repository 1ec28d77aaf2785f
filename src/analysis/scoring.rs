use crate::models::score_report::{Badge, ScoreWeights};

/// Descending thresholds; the first one `overall` reaches wins.
const BADGE_THRESHOLDS: [(u8, Badge); 5] = [
    (85, Badge::Exceptional),
    (70, Badge::Strong),
    (55, Badge::SolidFoundation),
    (40, Badge::NeedsRefinement),
    (0, Badge::RequiresAttention),
];

/// Weighted sums are settled to six decimals before rounding, so 11.499999999999998 rounds as 11.5.
const ROUNDING_SCALE: f64 = 1e6;

/// Weighted overall score (0–100)
pub fn compute_overall(clarity: u8, credibility: u8, visibility: u8, weights: &ScoreWeights) -> u8 {
    let weighted = f64::from(clarity) * weights.clarity
        + f64::from(credibility) * weights.credibility
        + f64::from(visibility) * weights.visibility;

    if weighted.is_nan() {
        return 0;
    }
    let settled = (weighted * ROUNDING_SCALE).round() / ROUNDING_SCALE;
    settled.round().clamp(0.0, 100.0) as u8
}

pub fn badge_for(overall: u8) -> Badge {
    BADGE_THRESHOLDS
        .iter()
        .find(|(min, _)| overall >= *min)
        .map(|(_, badge)| *badge)
        .unwrap_or(Badge::RequiresAttention)
}
