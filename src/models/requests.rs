use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::SelectionFilters;

/// Duty point a caller needs a pump for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SelectionRequest {
    #[validate(custom(function = "positive_finite"))]
    #[serde(alias = "required_flow", rename = "requiredFlow")]
    pub required_flow: f64,
    #[validate(custom(function = "positive_finite"))]
    #[serde(alias = "required_head", rename = "requiredHead")]
    pub required_head: f64,
    #[serde(default)]
    pub filters: SelectionFilters,
}

impl SelectionRequest {
    pub fn new(required_flow: f64, required_head: f64) -> Self {
        Self {
            required_flow,
            required_head,
            filters: SelectionFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: SelectionFilters) -> Self {
        self.filters = filters;
        self
    }
}

// A plain range check lets NaN through, so finiteness is checked explicitly
fn positive_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive");
        err.message = Some(format!("must be a positive number, got {}", value).into());
        Err(err)
    }
}
