use std::collections::HashMap;

use crate::models::ScoredCandidate;

/// Keep the best operating point per item and order items by score
///
/// A later candidate replaces an item's current best only when its composite
/// score is strictly greater, so ties keep the first one seen. The sort is
/// stable: items with equal scores stay in first-seen order. Applying `rank`
/// to its own output returns it unchanged.
pub fn rank(candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(candidates.len());
    let mut best: Vec<ScoredCandidate> = Vec::new();

    for candidate in candidates {
        match slots.get(&candidate.item_id) {
            Some(&idx) => {
                if candidate.composite_score > best[idx].composite_score {
                    best[idx] = candidate;
                }
            }
            None => {
                slots.insert(candidate.item_id.clone(), best.len());
                best.push(candidate);
            }
        }
    }

    best.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PerformanceSample, RecommendationLevel, SubScores};

    fn candidate(item_id: &str, flow: f64, score: f64) -> ScoredCandidate {
        let level = RecommendationLevel::from_score(score);
        ScoredCandidate {
            item_id: item_id.to_string(),
            operating_point: PerformanceSample {
                item_id: item_id.to_string(),
                flow_rate: flow,
                head: 20.0,
                power: Some(1.5),
                efficiency: None,
            },
            flow_margin: 0.0,
            head_margin: 0.0,
            power_margin: Some(0.0),
            scores: SubScores {
                flow_margin: score,
                head_margin: score,
                efficiency: score,
                bep_match: score,
                power_margin: score,
            },
            composite_score: score,
            recommendation_level: level,
            recommendation_reason: level.reason().to_string(),
            annual_operating_cost: None,
        }
    }

    #[test]
    fn test_keeps_best_sample_per_item() {
        let ranked = rank(vec![
            candidate("a", 10.0, 70.0),
            candidate("a", 10.5, 82.0),
            candidate("b", 10.0, 75.0),
            candidate("a", 11.0, 64.0),
        ]);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item_id, "a");
        assert_eq!(ranked[0].operating_point.flow_rate, 10.5);
        assert_eq!(ranked[1].item_id, "b");
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let ranked = rank(vec![
            candidate("a", 10.0, 80.0),
            candidate("a", 12.0, 80.0),
        ]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].operating_point.flow_rate, 10.0);
    }

    #[test]
    fn test_equal_scores_keep_first_seen_order() {
        let ranked = rank(vec![
            candidate("x", 10.0, 70.0),
            candidate("y", 10.0, 90.0),
            candidate("z", 10.0, 70.0),
        ]);

        let ids: Vec<&str> = ranked.iter().map(|c| c.item_id.as_str()).collect();
        assert_eq!(ids, vec!["y", "x", "z"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let once = rank(vec![
            candidate("a", 10.0, 61.0),
            candidate("b", 10.0, 93.0),
            candidate("c", 10.0, 77.0),
            candidate("b", 11.0, 55.0),
        ]);
        let twice = rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new()).is_empty());
    }
}
