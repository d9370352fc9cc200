//! Weighted aggregation of normalized metrics into one score per entity

use crate::config::CategoryProfile;
use crate::error::{Result, TierEngineError};
use crate::models::{Entity, ScoreMap, ScoreReport, ScoringAnomaly};
use crate::normalizer::normalize_group;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Metric name → non-negative weight.
///
/// Weights need not sum to 1; each entity is renormalized by the weight it
/// actually used. Ordered so that accumulation is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap(BTreeMap<String, f64>);

impl WeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: impl Into<String>, weight: f64) -> Self {
        self.0.insert(metric.into(), weight);
        self
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.0.get(metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(metric, &weight)| (metric.as_str(), weight))
    }

    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject negative weights
    pub fn validate(&self) -> Result<()> {
        match self.0.iter().find(|(_, w)| **w < 0.0 || w.is_nan()) {
            Some((metric, &weight)) => {
                Err(TierEngineError::NegativeWeight { metric: metric.clone(), weight })
            }
            None => Ok(()),
        }
    }
}

impl FromIterator<(String, f64)> for WeightMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Final scaling applied to `sum(weight * normalized) / used_weight`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScale {
    /// `sum / used_weight * 100`, kept for parity with published player
    /// scores. Only lands in [0, 100] when weights are tiny; with weights
    /// summing to 1 it spans [0, 10000].
    #[default]
    Legacy,
    /// `sum / used_weight`, a true weighted mean in [0, 100]
    WeightedMean,
}

/// Score for a single entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityScore {
    pub score: f64,
    pub used_weight: f64,
    /// Weighted metrics the entity had no value for
    pub skipped: Vec<String>,
}

/// Combines normalized metrics into one score using an explicit weight map
#[derive(Debug, Clone)]
pub struct WeightedScorer<'a> {
    weights: &'a WeightMap,
    scale: ScoreScale,
}

impl<'a> WeightedScorer<'a> {
    pub fn new(weights: &'a WeightMap, scale: ScoreScale) -> Self {
        Self { weights, scale }
    }

    /// Score one entity from its normalized values.
    ///
    /// Metrics in the weight map that the entity lacks are skipped and their
    /// weight is left out of the denominator. With nothing to use the score
    /// is 0.
    pub fn score(&self, normalized: &HashMap<String, f64>) -> EntityScore {
        let mut sum = 0.0;
        let mut used_weight = 0.0;
        let mut skipped = Vec::new();

        for (metric, weight) in self.weights.iter() {
            match normalized.get(metric) {
                Some(value) => {
                    sum += weight * value;
                    used_weight += weight;
                }
                None => skipped.push(metric.to_string()),
            }
        }

        let score = if used_weight > 0.0 {
            match self.scale {
                ScoreScale::Legacy => sum / used_weight * 100.0,
                ScoreScale::WeightedMean => sum / used_weight,
            }
        } else {
            0.0
        };

        EntityScore { score, used_weight, skipped }
    }
}

/// Normalize a group against a profile's metrics, then score every entity.
///
/// An empty group, or a weight map whose weights are all zero, yields an
/// empty score map.
pub fn score_group(group: &[Entity], profile: &CategoryProfile, scope: &str) -> ScoreReport {
    if group.is_empty() || profile.weights.total() <= 0.0 {
        debug!("Nothing to score for {}", scope);
        return ScoreReport::empty(scope);
    }

    let specs = profile.metric_specs();
    let normalized = normalize_group(group, &specs);
    let scorer = WeightedScorer::new(&profile.weights, profile.scale);

    let mut scores = ScoreMap::new();
    let mut anomalies = normalized.anomalies;

    for (entity, row) in group.iter().zip(&normalized.rows) {
        let result = scorer.score(row);

        for metric in result.skipped {
            debug!("{}: {} has no value for {}, skipped", scope, entity.name, metric);
            anomalies.push(ScoringAnomaly::MissingMetricSkip { entity: entity.name.clone(), metric });
        }
        if result.used_weight <= 0.0 {
            warn!("{}: {} matched no weighted metric, scoring 0", scope, entity.name);
            anomalies.push(ScoringAnomaly::NoOverlap { entity: entity.name.clone() });
        }

        scores.insert(entity.name.clone(), result.score);
    }

    info!("Scored {} entities for {} ({} anomalies)", scores.len(), scope, anomalies.len());
    ScoreReport { scores, anomalies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Polarity;

    fn row(values: &[(&str, f64)]) -> HashMap<String, f64> {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn forward_weights() -> WeightMap {
        WeightMap::new()
            .with("goals", 0.40)
            .with("assists", 0.25)
            .with("appearances", 0.15)
            .with("market_value", 0.20)
    }

    #[test]
    fn test_legacy_scale_multiplies_by_100() {
        let weights = WeightMap::new().with("goals", 0.5).with("assists", 0.5);
        let scorer = WeightedScorer::new(&weights, ScoreScale::Legacy);

        let result = scorer.score(&row(&[("goals", 80.0), ("assists", 40.0)]));
        assert!((result.score - 6000.0).abs() < 1e-9);
        assert!((result.used_weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_mean_scale() {
        let weights = WeightMap::new().with("goals", 3.0).with("assists", 1.0);
        let scorer = WeightedScorer::new(&weights, ScoreScale::WeightedMean);

        let result = scorer.score(&row(&[("goals", 80.0), ("assists", 40.0)]));
        assert!((result.score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_metric_renormalizes() {
        let weights = forward_weights();
        let scorer = WeightedScorer::new(&weights, ScoreScale::WeightedMean);

        let result = scorer.score(&row(&[("goals", 100.0), ("assists", 0.0), ("appearances", 50.0)]));
        let expected = (0.40 * 100.0 + 0.15 * 50.0) / (0.40 + 0.25 + 0.15);
        assert!((result.score - expected).abs() < 1e-9);
        assert_eq!(result.skipped, vec!["market_value".to_string()]);

        // the missing metric's weight has no influence
        let heavier = forward_weights().with("market_value", 9.0);
        let scorer = WeightedScorer::new(&heavier, ScoreScale::WeightedMean);
        let again = scorer.score(&row(&[("goals", 100.0), ("assists", 0.0), ("appearances", 50.0)]));
        assert!((again.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let weights = forward_weights();
        let scorer = WeightedScorer::new(&weights, ScoreScale::Legacy);

        let result = scorer.score(&row(&[("saves", 90.0)]));
        assert_eq!(result.score, 0.0);
        assert_eq!(result.used_weight, 0.0);
        assert_eq!(result.skipped.len(), 4);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = WeightMap::new().with("goals", -0.1);
        assert!(matches!(
            weights.validate(),
            Err(TierEngineError::NegativeWeight { ref metric, .. }) if metric == "goals"
        ));
        assert!(forward_weights().validate().is_ok());
    }

    #[test]
    fn test_score_group_absorbs_per_entity_anomalies() {
        let profile = CategoryProfile::new(
            WeightMap::new().with("goals", 0.5).with("saves", 0.5),
            ScoreScale::WeightedMean,
        );
        let group = vec![
            Entity::new("Mbappe").with_metric("goals", 31.0),
            Entity::new("Vinicius Jr").with_metric("goals", 21.0),
            Entity::new("Courtois").with_metric("clean_sheets", 14.0),
        ];

        let report = score_group(&group, &profile, "Forward");

        assert_eq!(report.scores.len(), 3);
        assert_eq!(report.scores.get("Mbappe"), Some(100.0));
        assert_eq!(report.scores.get("Vinicius Jr"), Some(0.0));
        assert_eq!(report.scores.get("Courtois"), Some(0.0));
        assert!(report
            .anomalies
            .contains(&ScoringAnomaly::NoOverlap { entity: "Courtois".to_string() }));
        assert!(report.anomalies.contains(&ScoringAnomaly::MissingMetricSkip {
            entity: "Mbappe".to_string(),
            metric: "saves".to_string(),
        }));
    }

    #[test]
    fn test_degenerate_metric_counts_for_missing_entity() {
        let profile = CategoryProfile::new(
            WeightMap::new().with("clean_sheets", 0.5).with("goals", 0.5),
            ScoreScale::WeightedMean,
        );
        let group = vec![
            Entity::new("Kounde").with_metric("clean_sheets", 12.0).with_metric("goals", 3.0),
            Entity::new("Cubarsi").with_metric("clean_sheets", 12.0).with_metric("goals", 1.0),
            Entity::new("Araujo").with_metric("goals", 1.0),
        ];

        let report = score_group(&group, &profile, "Defender");

        // clean_sheets sits at the midpoint for all three, Araujo included
        assert_eq!(report.scores.get("Kounde"), Some(75.0));
        assert_eq!(report.scores.get("Araujo"), Some(25.0));
        assert!(!report.anomalies.iter().any(|a| matches!(a, ScoringAnomaly::MissingMetricSkip { .. })));
        assert!(report.anomalies.contains(&ScoringAnomaly::DegenerateGroup {
            metric: "clean_sheets".to_string(),
            value: 12.0,
        }));
    }

    #[test]
    fn test_score_group_lower_is_better_profile() {
        let profile = CategoryProfile::new(WeightMap::new().with("position", 1.0), ScoreScale::WeightedMean)
            .with_polarity("position", Polarity::LowerIsBetter);
        let group = vec![
            Entity::new("Barcelona").with_metric("position", 1.0),
            Entity::new("Valladolid").with_metric("position", 20.0),
        ];

        let report = score_group(&group, &profile, "teams");
        assert_eq!(report.scores.get("Barcelona"), Some(100.0));
        assert_eq!(report.scores.get("Valladolid"), Some(0.0));
    }

    #[test]
    fn test_zero_weights_and_empty_group_yield_empty_map() {
        let zero = CategoryProfile::new(WeightMap::new().with("goals", 0.0), ScoreScale::Legacy);
        let group = vec![Entity::new("Mbappe").with_metric("goals", 31.0)];

        let report = score_group(&group, &zero, "Forward");
        assert!(report.scores.is_empty());
        assert_eq!(report.anomalies, vec![ScoringAnomaly::EmptyGroup { scope: "Forward".to_string() }]);

        let profile = CategoryProfile::new(forward_weights(), ScoreScale::Legacy);
        assert!(score_group(&[], &profile, "Forward").scores.is_empty());
    }
}
