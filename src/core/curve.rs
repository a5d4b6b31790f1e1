use crate::models::{CatalogItem, PerformanceSample, MAX_CURVE_SAMPLES};

/// Flow increment between synthetic curve samples
pub const FLOW_STEP: f64 = 0.1;

/// Round to two decimal places
#[inline]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Synthesize a performance curve from an item's rated point
///
/// Used when no manufacturer-measured curve exists. Samples run from zero
/// flow to the item's max flow in steps of [`FLOW_STEP`]:
/// - up to rated flow, head droops 10% while power climbs from 30% to 100%
/// - past rated flow, head falls from 90% to 50% of rated head at max flow
///   while power rises a further 30% and efficiency drops 20%
///
/// Samples whose head or power would round to zero are skipped. Output is ascending
/// in flow. The item must satisfy [`CatalogItem::validate`]; an item with
/// zero rated flow or max flow at rated flow has no defined curve.
///
/// # Arguments
/// * `item` - Catalog item with its rated point
///
/// # Returns
/// Samples rounded to two decimals
pub fn generate_curve(item: &CatalogItem) -> Vec<PerformanceSample> {
    let rated_flow = item.rated_flow;
    let rated_head = item.rated_head;
    let rated_power = item.rated_power;
    let max_flow = item.effective_max_flow();

    // Guard against 15.0 / 0.1 landing just under 150
    let steps = (max_flow / FLOW_STEP + 1e-9).floor() as usize;

    let mut samples = Vec::with_capacity(steps.saturating_add(1).min(MAX_CURVE_SAMPLES));

    for i in 0..=steps {
        let flow = round2(i as f64 * FLOW_STEP);

        let (head, power, efficiency) = if flow <= rated_flow {
            let r = flow / rated_flow;
            (
                rated_head * (1.0 - 0.1 * r),
                rated_power * (0.3 + 0.7 * r),
                item.rated_efficiency.map(|e| e * (0.5 + 0.5 * r)),
            )
        } else {
            let r = (flow - rated_flow) / (max_flow - rated_flow);
            (
                rated_head * (0.9 - 0.4 * r),
                rated_power * (1.0 + 0.3 * r),
                item.rated_efficiency.map(|e| e * (1.0 - 0.2 * r)),
            )
        };

        let head = round2(head);
        let power = round2(power);
        if head <= 0.0 || power <= 0.0 {
            continue;
        }

        samples.push(PerformanceSample {
            item_id: item.item_id.clone(),
            flow_rate: flow,
            head,
            power: Some(power),
            efficiency: efficiency.map(round2),
        });
    }

    samples
}

/// Interpolated operating point on a curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    pub flow_rate: f64,
    pub head: f64,
    pub power: Option<f64>,
    pub efficiency: Option<f64>,
}

/// Linearly interpolate a curve at the given flow
///
/// `curve` must be ascending in flow. Returns `None` when the flow lies
/// outside the curve or the curve is empty.
pub fn operating_point(curve: &[PerformanceSample], flow: f64) -> Option<OperatingPoint> {
    let first = curve.first()?;
    let last = curve.last()?;
    if flow < first.flow_rate || flow > last.flow_rate {
        return None;
    }

    // First sample at or beyond the requested flow
    let upper_idx = curve.partition_point(|s| s.flow_rate < flow);
    let upper = &curve[upper_idx];
    if upper.flow_rate == flow || upper_idx == 0 {
        return Some(OperatingPoint {
            flow_rate: flow,
            head: upper.head,
            power: upper.power,
            efficiency: upper.efficiency,
        });
    }

    let lower = &curve[upper_idx - 1];
    let t = (flow - lower.flow_rate) / (upper.flow_rate - lower.flow_rate);
    let lerp = |a: f64, b: f64| a + (b - a) * t;
    let lerp_opt = |a: Option<f64>, b: Option<f64>| match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b)),
        _ => None,
    };

    Some(OperatingPoint {
        flow_rate: flow,
        head: lerp(lower.head, upper.head),
        power: lerp_opt(lower.power, upper.power),
        efficiency: lerp_opt(lower.efficiency, upper.efficiency),
    })
}
