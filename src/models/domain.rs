use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::curve::FLOW_STEP;

/// Default operating range above the rated point, as a multiple of rated flow
pub const DEFAULT_MAX_FLOW_FACTOR: f64 = 1.5;

/// Default shut-off head, as a multiple of rated head
pub const DEFAULT_MAX_HEAD_FACTOR: f64 = 1.3;

/// Upper bound on synthetic samples per curve (max flow of 20,000 at 0.1 steps)
pub const MAX_CURVE_SAMPLES: usize = 200_000;

/// A catalog item that violates the curve generator's preconditions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("item {item_id}: {field} must be a positive number, got {value}")]
    NotPositive {
        item_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("item {item_id}: max flow {max_flow} must exceed rated flow {rated_flow}")]
    MaxFlowBelowRated {
        item_id: String,
        rated_flow: f64,
        max_flow: f64,
    },

    #[error("item {item_id}: efficiency {value} is outside 0..=100")]
    EfficiencyOutOfRange { item_id: String, value: f64 },

    #[error("item {item_id}: max flow {max_flow} needs more than {limit} curve samples")]
    CurveTooLarge {
        item_id: String,
        max_flow: f64,
        limit: usize,
    },
}

/// Catalog pump with its rated (duty) point and descriptive attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "itemId")]
    pub item_id: String,
    pub name: String,
    #[serde(rename = "ratedFlow")]
    pub rated_flow: f64,
    #[serde(rename = "ratedHead")]
    pub rated_head: f64,
    #[serde(rename = "ratedPower")]
    pub rated_power: f64,
    #[serde(rename = "ratedEfficiency", default)]
    pub rated_efficiency: Option<f64>,
    #[serde(rename = "maxFlow", default)]
    pub max_flow: Option<f64>,
    #[serde(rename = "maxHead", default)]
    pub max_head: Option<f64>,
    #[serde(rename = "pumpType", default)]
    pub pump_type: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(rename = "maxTemperature", default)]
    pub max_temperature: Option<f64>,
    #[serde(rename = "maxPressure", default)]
    pub max_pressure: Option<f64>,
}

impl CatalogItem {
    /// Build an item from its rated point, leaving optional fields unset
    pub fn new(
        item_id: impl Into<String>,
        name: impl Into<String>,
        rated_flow: f64,
        rated_head: f64,
        rated_power: f64,
    ) -> Result<Self, CatalogError> {
        let item = Self {
            item_id: item_id.into(),
            name: name.into(),
            rated_flow,
            rated_head,
            rated_power,
            rated_efficiency: None,
            max_flow: None,
            max_head: None,
            pump_type: None,
            material: None,
            application: None,
            max_temperature: None,
            max_pressure: None,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn with_efficiency(mut self, efficiency: f64) -> Self {
        self.rated_efficiency = Some(efficiency);
        self
    }

    pub fn with_max_flow(mut self, max_flow: f64) -> Self {
        self.max_flow = Some(max_flow);
        self
    }

    /// Maximum flow on the curve, defaulting to 1.5x rated flow
    pub fn effective_max_flow(&self) -> f64 {
        self.max_flow
            .unwrap_or(self.rated_flow * DEFAULT_MAX_FLOW_FACTOR)
    }

    /// Shut-off head, defaulting to 1.3x rated head
    pub fn effective_max_head(&self) -> f64 {
        self.max_head
            .unwrap_or(self.rated_head * DEFAULT_MAX_HEAD_FACTOR)
    }

    /// Check the invariants the curve generator and scoring engine divide by
    ///
    /// Items read back from storage bypass `new`, so callers at the catalog
    /// boundary must run this before generating or scoring.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let positive = [
            ("ratedFlow", self.rated_flow),
            ("ratedHead", self.rated_head),
            ("ratedPower", self.rated_power),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CatalogError::NotPositive {
                    item_id: self.item_id.clone(),
                    field,
                    value,
                });
            }
        }

        if let Some(max_head) = self.max_head {
            if !(max_head.is_finite() && max_head > 0.0) {
                return Err(CatalogError::NotPositive {
                    item_id: self.item_id.clone(),
                    field: "maxHead",
                    value: max_head,
                });
            }
        }

        let max_flow = self.effective_max_flow();
        if !(max_flow.is_finite() && max_flow > self.rated_flow) {
            return Err(CatalogError::MaxFlowBelowRated {
                item_id: self.item_id.clone(),
                rated_flow: self.rated_flow,
                max_flow,
            });
        }

        if max_flow / FLOW_STEP >= MAX_CURVE_SAMPLES as f64 {
            return Err(CatalogError::CurveTooLarge {
                item_id: self.item_id.clone(),
                max_flow,
                limit: MAX_CURVE_SAMPLES,
            });
        }

        if let Some(efficiency) = self.rated_efficiency {
            if !(0.0..=100.0).contains(&efficiency) {
                return Err(CatalogError::EfficiencyOutOfRange {
                    item_id: self.item_id.clone(),
                    value: efficiency,
                });
            }
        }

        Ok(())
    }

    /// Whether an update to this item invalidates its stored curve
    pub fn curve_inputs_changed(&self, other: &CatalogItem) -> bool {
        self.rated_flow != other.rated_flow
            || self.rated_head != other.rated_head
            || self.rated_power != other.rated_power
            || self.rated_efficiency != other.rated_efficiency
            || self.max_flow != other.max_flow
            || self.max_head != other.max_head
    }
}

/// One point on a pump's performance curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "flowRate")]
    pub flow_rate: f64,
    pub head: f64,
    pub power: Option<f64>,
    #[serde(default)]
    pub efficiency: Option<f64>,
}

/// Optional constraints on the owning catalog item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionFilters {
    #[serde(rename = "pumpType", default)]
    pub pump_type: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
    /// Item's max temperature must be at least this
    #[serde(rename = "fluidTemperature", default)]
    pub fluid_temperature: Option<f64>,
    /// Item's max pressure must be at least this
    #[serde(rename = "workingPressure", default)]
    pub working_pressure: Option<f64>,
}

/// Recommendation tier derived from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    BestChoice,
    Recommended,
    Alternative,
    Warning,
}

impl RecommendationLevel {
    pub fn from_score(composite: f64) -> Self {
        if composite >= 90.0 {
            RecommendationLevel::BestChoice
        } else if composite >= 80.0 {
            RecommendationLevel::Recommended
        } else if composite >= 65.0 {
            RecommendationLevel::Alternative
        } else {
            RecommendationLevel::Warning
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecommendationLevel::BestChoice => "Best choice",
            RecommendationLevel::Recommended => "Recommended",
            RecommendationLevel::Alternative => "Alternative",
            RecommendationLevel::Warning => "Warning",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            RecommendationLevel::BestChoice => "balanced margins, high efficiency, excellent BEP match",
            RecommendationLevel::Recommended => "good overall match, cost-effective",
            RecommendationLevel::Alternative => "meets basic requirement, usable as backup",
            RecommendationLevel::Warning => "oversized or low efficiency, choose with caution",
        }
    }
}

/// Per-factor scores, each in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    #[serde(rename = "flowMargin")]
    pub flow_margin: f64,
    #[serde(rename = "headMargin")]
    pub head_margin: f64,
    pub efficiency: f64,
    #[serde(rename = "bepMatch")]
    pub bep_match: f64,
    #[serde(rename = "powerMargin")]
    pub power_margin: f64,
}

/// A catalog item scored at one operating point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "operatingPoint")]
    pub operating_point: PerformanceSample,
    #[serde(rename = "flowMargin")]
    pub flow_margin: f64,
    #[serde(rename = "headMargin")]
    pub head_margin: f64,
    #[serde(rename = "powerMargin")]
    pub power_margin: Option<f64>,
    pub scores: SubScores,
    #[serde(rename = "compositeScore")]
    pub composite_score: f64,
    #[serde(rename = "recommendationLevel")]
    pub recommendation_level: RecommendationLevel,
    #[serde(rename = "recommendationReason")]
    pub recommendation_reason: String,
    #[serde(rename = "annualOperatingCost")]
    pub annual_operating_cost: Option<f64>,
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub flow_margin: f64,
    pub head_margin: f64,
    pub efficiency: f64,
    pub bep_match: f64,
    pub power_margin: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            flow_margin: 0.2,
            head_margin: 0.2,
            efficiency: 0.3,
            bep_match: 0.2,
            power_margin: 0.1,
        }
    }
}

/// Assumptions behind the illustrative annual operating cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostAssumptions {
    pub annual_run_hours: f64,
    pub energy_price: f64,
}

impl Default for CostAssumptions {
    fn default() -> Self {
        Self {
            annual_run_hours: 8000.0,
            energy_price: 0.8,
        }
    }
}
