//! Min-max normalization of raw metrics onto a 0–100 scale.
//!
//! Normalization is always scoped to the group passed in: the caller decides
//! what is comparable (all teams, or the players of one position) and no
//! state survives between calls.

use crate::models::{Entity, MetricSpec, Polarity, ScoringAnomaly};
use std::collections::HashMap;
use tracing::debug;

/// Value assigned to every entity when a group has no spread
pub const MIDPOINT: f64 = 50.0;

/// One metric normalized across a group
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetric {
    pub metric: String,
    /// Normalized value per entity, indexed like the input group.
    /// `None` when the entity has no value for the metric.
    pub values: Vec<Option<f64>>,
    /// Shared raw value when the group was degenerate
    pub degenerate: Option<f64>,
}

/// Every configured metric normalized across a group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedGroup {
    /// Metric name → normalized value, one row per input entity
    pub rows: Vec<HashMap<String, f64>>,
    pub anomalies: Vec<ScoringAnomaly>,
}

/// Normalize one metric across a group.
///
/// Entities without the metric are excluded from min/max and come back as
/// `None`. A group with no spread (one entity, or all values equal) maps
/// every entity to [`MIDPOINT`], including those without the metric.
pub fn normalize_metric(group: &[Entity], spec: &MetricSpec) -> NormalizedMetric {
    let raw: Vec<Option<f64>> = group.iter().map(|e| e.metric(&spec.name)).collect();

    let (min, max) = raw.iter().flatten().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });

    if min > max {
        // no entity carries this metric
        return NormalizedMetric { metric: spec.name.clone(), values: raw, degenerate: None };
    }

    if max == min {
        debug!("Degenerate group for {}: every value is {}", spec.name, min);
        return NormalizedMetric {
            metric: spec.name.clone(),
            values: vec![Some(MIDPOINT); raw.len()],
            degenerate: Some(min),
        };
    }

    let span = max - min;
    let values = raw
        .iter()
        .map(|v| {
            v.map(|raw| match spec.polarity {
                Polarity::HigherIsBetter => (raw - min) / span * 100.0,
                Polarity::LowerIsBetter => (max - raw) / span * 100.0,
            })
        })
        .collect();

    NormalizedMetric { metric: spec.name.clone(), values, degenerate: None }
}

/// Normalize several metrics across the same group
pub fn normalize_group(group: &[Entity], specs: &[MetricSpec]) -> NormalizedGroup {
    let mut rows = vec![HashMap::with_capacity(specs.len()); group.len()];
    let mut anomalies = Vec::new();

    for spec in specs {
        let normalized = normalize_metric(group, spec);
        if let Some(value) = normalized.degenerate {
            anomalies.push(ScoringAnomaly::DegenerateGroup { metric: spec.name.clone(), value });
        }
        for (row, value) in rows.iter_mut().zip(normalized.values) {
            if let Some(value) = value {
                row.insert(spec.name.clone(), value);
            }
        }
    }

    NormalizedGroup { rows, anomalies }
}
