use crate::core::curve::round2;
use crate::models::{
    CatalogItem, CostAssumptions, PerformanceSample, RecommendationLevel, ScoredCandidate,
    ScoringWeights, SelectionRequest, SubScores,
};

/// Score one operating point of a catalog item against a duty point
///
/// Scoring formula:
/// score = (
///     flow_margin_score * 0.2 +    # Small positive flow margin is best
///     head_margin_score * 0.2 +    # Small positive head margin is best
///     efficiency_score * 0.3 +     # Efficiency at the operating point
///     bep_match_score * 0.2 +      # Operating flow close to rated flow
///     power_margin_score * 0.1     # Power draw relative to rated power
/// )
///
/// The item must satisfy [`CatalogItem::validate`].
pub fn score_candidate(
    item: &CatalogItem,
    sample: &PerformanceSample,
    request: &SelectionRequest,
    weights: &ScoringWeights,
    cost: &CostAssumptions,
) -> ScoredCandidate {
    let flow_margin = margin_percent(sample.flow_rate, request.required_flow);
    let head_margin = margin_percent(sample.head, request.required_head);
    let power_margin = sample
        .power
        .map(|power| margin_percent(power, item.rated_power));

    let scores = SubScores {
        flow_margin: flow_margin_score(flow_margin),
        head_margin: head_margin_score(head_margin),
        efficiency: efficiency_score(sample.efficiency),
        bep_match: bep_match_score(sample.flow_rate / item.rated_flow),
        power_margin: power_margin_score(power_margin),
    };

    let composite_score = composite(&scores, weights);
    let level = RecommendationLevel::from_score(composite_score);

    ScoredCandidate {
        item_id: item.item_id.clone(),
        operating_point: sample.clone(),
        flow_margin,
        head_margin,
        power_margin,
        scores,
        composite_score,
        recommendation_level: level,
        recommendation_reason: level.reason().to_string(),
        annual_operating_cost: sample
            .power
            .map(|power| round2(power * cost.annual_run_hours * cost.energy_price)),
    }
}

/// Weighted combination of the sub-scores, clamped to 0-100
///
/// Weights that don't sum to 1 still yield a score in range.
#[inline]
pub fn composite(scores: &SubScores, weights: &ScoringWeights) -> f64 {
    let total_score = scores.flow_margin * weights.flow_margin
        + scores.head_margin * weights.head_margin
        + scores.efficiency * weights.efficiency
        + scores.bep_match * weights.bep_match
        + scores.power_margin * weights.power_margin;

    total_score.min(100.0).max(0.0)
}

/// Percentage by which `actual` exceeds `reference`
#[inline]
fn margin_percent(actual: f64, reference: f64) -> f64 {
    (actual - reference) / reference * 100.0
}

#[inline]
fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Flow margin score (0-100), peaking at a 5% margin
#[inline]
pub fn flow_margin_score(m: f64) -> f64 {
    let score = if m < 5.0 {
        60.0 + (m / 5.0) * 20.0
    } else if m <= 20.0 {
        80.0 + ((20.0 - m) / 15.0) * 15.0
    } else if m <= 50.0 {
        65.0 - ((m - 20.0) / 30.0) * 35.0
    } else if m <= 100.0 {
        30.0 - ((m - 50.0) / 50.0) * 20.0
    } else {
        5.0
    };
    clamp_score(score)
}

/// Head margin score (0-100), peaking at a 5% margin with a tighter band
#[inline]
pub fn head_margin_score(m: f64) -> f64 {
    let score = if m < 5.0 {
        60.0 + (m / 5.0) * 20.0
    } else if m <= 15.0 {
        80.0 + ((15.0 - m) / 10.0) * 15.0
    } else if m <= 40.0 {
        65.0 - ((m - 15.0) / 25.0) * 35.0
    } else if m <= 100.0 {
        30.0 - ((m - 40.0) / 60.0) * 20.0
    } else {
        5.0
    };
    clamp_score(score)
}

/// Efficiency score (0-100); unknown efficiency scores a neutral 50
#[inline]
pub fn efficiency_score(efficiency: Option<f64>) -> f64 {
    let Some(e) = efficiency else {
        return 50.0;
    };

    let score = if e >= 75.0 {
        (95.0 + ((e - 75.0) / 25.0) * 5.0).min(100.0)
    } else if e >= 60.0 {
        75.0 + ((e - 60.0) / 15.0) * 20.0
    } else {
        50.0 + ((e - 30.0) / 30.0) * 25.0
    };
    clamp_score(score)
}

/// Best-efficiency-point match score (0-100)
///
/// `ratio` is operating flow over rated flow; 1.0 is a perfect match.
#[inline]
pub fn bep_match_score(ratio: f64) -> f64 {
    let d = (ratio - 1.0).abs();

    let score = if (0.8..=1.2).contains(&ratio) {
        90.0 + (1.0 - d / 0.2) * 10.0
    } else if (0.6..0.8).contains(&ratio) || (ratio > 1.2 && ratio <= 1.4) {
        70.0 + (1.0 - (d - 0.2) / 0.2) * 20.0
    } else if (0.3..0.6).contains(&ratio) || (ratio > 1.4 && ratio <= 1.7) {
        40.0 + (1.0 - (d - 0.4) / 0.3) * 30.0
    } else {
        20.0 + (1.0 - ((d - 0.7) / 0.3).min(1.0)) * 20.0
    };
    clamp_score(score)
}

/// Power margin score (0-100); unknown power scores a neutral 50
#[inline]
pub fn power_margin_score(margin: Option<f64>) -> f64 {
    let Some(m) = margin else {
        return 50.0;
    };

    let score = if m < 10.0 {
        60.0 + (m / 10.0) * 20.0
    } else if m <= 30.0 {
        80.0 + ((30.0 - m) / 20.0) * 15.0
    } else if m <= 60.0 {
        95.0 - ((m - 30.0) / 30.0) * 35.0
    } else {
        (60.0 - (m - 60.0) / 10.0).max(0.0)
    };
    clamp_score(score)
}
