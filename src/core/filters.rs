use crate::models::{CatalogItem, PerformanceSample, SelectionFilters};

/// Default cap on candidate rows returned by a store query
pub const DEFAULT_CANDIDATE_LIMIT: usize = 100;

/// Check if a sample covers the required duty point
#[inline]
pub fn meets_duty_point(sample: &PerformanceSample, required_flow: f64, required_head: f64) -> bool {
    sample.flow_rate >= required_flow && sample.head >= required_head
}

/// Check if an item satisfies every supplied filter
///
/// Categorical fields must match exactly. Temperature and pressure filters are
/// lower bounds on the item's rated ceiling; an item without a declared
/// ceiling never satisfies one.
#[inline]
pub fn matches_item_filters(item: &CatalogItem, filters: &SelectionFilters) -> bool {
    if !matches_exact(&filters.pump_type, &item.pump_type) {
        return false;
    }

    if !matches_exact(&filters.material, &item.material) {
        return false;
    }

    if !matches_exact(&filters.application, &item.application) {
        return false;
    }

    if !meets_ceiling(filters.fluid_temperature, item.max_temperature) {
        return false;
    }

    if !meets_ceiling(filters.working_pressure, item.max_pressure) {
        return false;
    }

    true
}

/// Full candidate predicate: duty point plus item filters
#[inline]
pub fn matches_candidate(
    item: &CatalogItem,
    sample: &PerformanceSample,
    required_flow: f64,
    required_head: f64,
    filters: &SelectionFilters,
) -> bool {
    meets_duty_point(sample, required_flow, required_head) && matches_item_filters(item, filters)
}

fn matches_exact(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual.as_deref() == Some(wanted.as_str()),
    }
}

fn meets_ceiling(required: Option<f64>, ceiling: Option<f64>) -> bool {
    match (required, ceiling) {
        (None, _) => true,
        (Some(required), Some(ceiling)) => ceiling >= required,
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_item() -> CatalogItem {
        let mut item = CatalogItem::new("p1", "Test Pump", 10.0, 20.0, 1.5).unwrap();
        item.pump_type = Some("centrifugal".to_string());
        item.material = Some("stainless".to_string());
        item.application = Some("water supply".to_string());
        item.max_temperature = Some(80.0);
        item.max_pressure = None;
        item
    }

    fn sample(flow: f64, head: f64) -> PerformanceSample {
        PerformanceSample {
            item_id: "p1".to_string(),
            flow_rate: flow,
            head,
            power: Some(1.5),
            efficiency: None,
        }
    }

    #[test]
    fn test_duty_point_inclusive() {
        assert!(meets_duty_point(&sample(10.0, 20.0), 10.0, 20.0));
        assert!(!meets_duty_point(&sample(9.9, 25.0), 10.0, 20.0));
        assert!(!meets_duty_point(&sample(12.0, 19.9), 10.0, 20.0));
    }

    #[test]
    fn test_empty_filters_match() {
        assert!(matches_item_filters(&create_test_item(), &SelectionFilters::default()));
    }

    #[test]
    fn test_categorical_filters() {
        let item = create_test_item();

        let filters = SelectionFilters {
            pump_type: Some("centrifugal".to_string()),
            material: Some("stainless".to_string()),
            ..Default::default()
        };
        assert!(matches_item_filters(&item, &filters));

        let filters = SelectionFilters {
            material: Some("cast iron".to_string()),
            ..Default::default()
        };
        assert!(!matches_item_filters(&item, &filters));
    }

    #[test]
    fn test_ceiling_filters() {
        let item = create_test_item();

        let hot = SelectionFilters {
            fluid_temperature: Some(90.0),
            ..Default::default()
        };
        assert!(!matches_item_filters(&item, &hot));

        let warm = SelectionFilters {
            fluid_temperature: Some(80.0),
            ..Default::default()
        };
        assert!(matches_item_filters(&item, &warm));

        // No declared pressure rating
        let pressurised = SelectionFilters {
            working_pressure: Some(1.0),
            ..Default::default()
        };
        assert!(!matches_item_filters(&item, &pressurised));
    }
}
