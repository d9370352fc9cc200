//! Position-scoped player scoring.
//!
//! Players are only ever normalized against other players of the same
//! position, each position with its own weight map. Positions without a
//! profile borrow the first configured one.

use crate::config::{CategoryProfile, ComparisonConfig, PositionProfiles};
use crate::error::{Result, TierEngineError};
use crate::models::{Entity, Polarity, ScoreReport, ScoredEntity};
use crate::scorer::score_group;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Scores for one position group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScores {
    pub category: String,
    pub report: ScoreReport,
}

/// Which side of a head-to-head came out ahead
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    Winner(String),
    Draw,
}

/// One player in a head-to-head
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSide {
    pub name: String,
    pub score: f64,
    pub stats: BTreeMap<String, f64>,
}

/// A notable gap between two players on one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyDifference {
    pub metric: String,
    pub leader: String,
    pub margin: f64,
    pub description: String,
}

/// Result of comparing two players of the same position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub position: String,
    pub left: ComparisonSide,
    pub right: ComparisonSide,
    pub outcome: Outcome,
    pub key_differences: Vec<KeyDifference>,
}

/// Scores players within their position group
#[derive(Debug, Clone)]
pub struct PositionScorer {
    profiles: PositionProfiles,
}

impl PositionScorer {
    pub fn new(profiles: PositionProfiles) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &PositionProfiles {
        &self.profiles
    }

    /// Profile for a position, falling back to the first configured one
    pub fn profile_for(&self, position: &str) -> Result<&CategoryProfile> {
        if let Some(profile) = self.profiles.get(position) {
            return Ok(profile);
        }
        let fallback = self.profiles.fallback().ok_or_else(|| {
            TierEngineError::Configuration("no player position profiles configured".to_string())
        })?;
        debug!("No profile for {}, using {}", position, fallback.position);
        Ok(&fallback.profile)
    }

    /// Score the players of one position, normalized only against each other
    pub fn score_category(&self, players: &[Entity], position: &str) -> Result<ScoreReport> {
        let group: Vec<Entity> =
            players.iter().filter(|p| p.category_key() == position).cloned().collect();
        let profile = self.profile_for(position)?;
        Ok(score_group(&group, profile, position))
    }

    /// Score every position present, in order of first appearance.
    ///
    /// Positions are independent, so they are scored in parallel.
    pub fn score_all(&self, players: &[Entity]) -> Result<Vec<CategoryScores>> {
        let mut groups: Vec<(String, Vec<Entity>)> = Vec::new();
        for player in players {
            let key = player.category_key();
            match groups.iter_mut().find(|(category, _)| category == key) {
                Some((_, members)) => members.push(player.clone()),
                None => groups.push((key.to_string(), vec![player.clone()])),
            }
        }

        let scored = groups
            .into_par_iter()
            .map(|(category, members)| {
                let profile = self.profile_for(&category)?;
                let report = score_group(&members, profile, &category);
                Ok(CategoryScores { category, report })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Scored {} players across {} positions", players.len(), scored.len());
        Ok(scored)
    }

    /// Best `limit` players of a position, best first; equal scores keep
    /// input order
    pub fn top_by_category(
        &self,
        players: &[Entity],
        position: &str,
        limit: usize,
    ) -> Result<Vec<ScoredEntity>> {
        let report = self.score_category(players, position)?;
        Ok(report.scores.top(limit).into_iter().cloned().collect())
    }

    /// Compare two players head to head.
    ///
    /// Both must play the same position; the pair is scored as its own
    /// group.
    pub fn compare(&self, left: &Entity, right: &Entity, rules: &ComparisonConfig) -> Result<Comparison> {
        if left.category != right.category {
            return Err(TierEngineError::CategoryMismatch {
                left: left.name.clone(),
                left_category: left.category_key().to_string(),
                right: right.name.clone(),
                right_category: right.category_key().to_string(),
            });
        }

        let position = left.category_key().to_string();
        let profile = self.profile_for(&position)?;
        let pair = [left.clone(), right.clone()];
        let report = score_group(&pair, profile, &position);

        let side = |entity: &Entity| ComparisonSide {
            name: entity.name.clone(),
            score: report.scores.get(&entity.name).unwrap_or(0.0),
            stats: key_stats(entity, profile, rules),
        };
        let left_side = side(left);
        let right_side = side(right);

        let outcome = if left_side.score > right_side.score {
            Outcome::Winner(left_side.name.clone())
        } else if right_side.score > left_side.score {
            Outcome::Winner(right_side.name.clone())
        } else {
            Outcome::Draw
        };

        let key_differences = rules
            .rules
            .iter()
            .filter(|rule| rule.applies_to(&position))
            .filter_map(|rule| {
                let a = left.metric(&rule.metric)?;
                let b = right.metric(&rule.metric)?;
                let margin = (a - b).abs();
                if margin < rule.threshold {
                    return None;
                }
                let left_leads = match rule.favors {
                    Polarity::HigherIsBetter => a > b,
                    Polarity::LowerIsBetter => a < b,
                };
                let leader = if left_leads { &left.name } else { &right.name };
                Some(KeyDifference {
                    metric: rule.metric.clone(),
                    leader: leader.clone(),
                    margin,
                    description: rule.describe(leader, margin),
                })
            })
            .collect();

        Ok(Comparison { position, left: left_side, right: right_side, outcome, key_differences })
    }
}

fn key_stats(entity: &Entity, profile: &CategoryProfile, rules: &ComparisonConfig) -> BTreeMap<String, f64> {
    rules
        .key_stats
        .iter()
        .map(String::as_str)
        .chain(profile.weights.metrics())
        .filter_map(|metric| entity.metric(metric).map(|v| (metric.to_string(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoringAnomaly;

    fn player(name: &str, position: &str, stats: &[(&str, f64)]) -> Entity {
        stats
            .iter()
            .fold(Entity::new(name).with_category(position), |e, (m, v)| e.with_metric(*m, *v))
    }

    fn squad() -> Vec<Entity> {
        vec![
            player("Mbappe", "Forward", &[("goals", 31.0), ("assists", 9.0), ("appearances", 36.0), ("market_value", 180e6), ("age", 26.0)]),
            player("Bellingham", "Midfielder", &[("goals", 19.0), ("assists", 8.0), ("appearances", 34.0), ("market_value", 180e6), ("age", 21.0)]),
            player("Vinicius Jr", "Forward", &[("goals", 21.0), ("assists", 12.0), ("appearances", 35.0), ("market_value", 200e6), ("age", 24.0)]),
            player("Modric", "Midfielder", &[("goals", 2.0), ("assists", 7.0), ("appearances", 30.0), ("market_value", 10e6), ("age", 39.0)]),
            player("Courtois", "Goalkeeper", &[("saves", 95.0), ("clean_sheets", 14.0), ("appearances", 35.0), ("market_value", 35e6), ("age", 32.0)]),
        ]
    }

    fn scorer() -> PositionScorer {
        PositionScorer::new(PositionProfiles::default())
    }

    #[test]
    fn test_normalization_is_position_local() {
        let report = scorer().score_category(&squad(), "Midfielder").unwrap();

        assert_eq!(report.scores.len(), 2);
        // Bellingham tops every midfield metric, so each normalizes to 100
        let bellingham = report.scores.get("Bellingham").unwrap();
        assert!((bellingham - 10_000.0).abs() < 1e-6);
        assert_eq!(report.scores.get("Modric"), Some(0.0));
        assert!(report.scores.get("Mbappe").is_none());
    }

    #[test]
    fn test_single_player_position_is_degenerate() {
        let report = scorer().score_category(&squad(), "Goalkeeper").unwrap();
        // every metric sits at the midpoint: 50 / 1.0 * 100
        let courtois = report.scores.get("Courtois").unwrap();
        assert!((courtois - 5_000.0).abs() < 1e-6);
        assert!(report
            .anomalies
            .iter()
            .all(|a| matches!(a, ScoringAnomaly::DegenerateGroup { .. })));
    }

    #[test]
    fn test_unknown_position_uses_fallback() {
        let players = vec![
            player("Winger One", "Winger", &[("goals", 10.0), ("assists", 2.0)]),
            player("Winger Two", "Winger", &[("goals", 2.0), ("assists", 10.0)]),
        ];
        let report = scorer().score_category(&players, "Winger").unwrap();

        // Forward weights: goals 0.40, assists 0.25; appearances and value skipped
        let one = report.scores.get("Winger One").unwrap();
        assert!((one - 0.40 * 100.0 / 0.65 * 100.0).abs() < 1e-6);
        let skips = report
            .anomalies
            .iter()
            .filter(|a| matches!(a, ScoringAnomaly::MissingMetricSkip { .. }))
            .count();
        assert_eq!(skips, 4);
    }

    #[test]
    fn test_score_all_keeps_first_appearance_order() {
        let all = scorer().score_all(&squad()).unwrap();
        let order: Vec<&str> = all.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, vec!["Forward", "Midfielder", "Goalkeeper"]);
        assert_eq!(all[0].report.scores.len(), 2);
    }

    #[test]
    fn test_top_by_category() {
        let top = scorer().top_by_category(&squad(), "Forward", 1).unwrap();
        assert_eq!(top.len(), 1);

        let all = scorer().top_by_category(&squad(), "Forward", 10).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].score >= all[1].score);
        assert_eq!(top[0].name, all[0].name);

        assert!(scorer().top_by_category(&squad(), "Defender", 5).unwrap().is_empty());
    }

    #[test]
    fn test_compare_requires_same_position() {
        let players = squad();
        let err = scorer()
            .compare(&players[0], &players[1], &ComparisonConfig::default())
            .unwrap_err();
        assert!(matches!(err, TierEngineError::CategoryMismatch { .. }));
    }

    #[test]
    fn test_compare_forwards() {
        let players = squad();
        let comparison = scorer()
            .compare(&players[0], &players[2], &ComparisonConfig::default())
            .unwrap();

        assert_eq!(comparison.position, "Forward");
        assert_eq!(comparison.left.stats.get("goals"), Some(&31.0));
        assert_eq!(comparison.left.stats.get("age"), Some(&26.0));

        let metrics: Vec<&str> = comparison.key_differences.iter().map(|d| d.metric.as_str()).collect();
        // market value gap is exactly 20M, goals gap 10, assists gap 3, age gap 2
        assert_eq!(metrics, vec!["market_value", "goals", "assists"]);
        let goals = &comparison.key_differences[1];
        assert_eq!(goals.leader, "Mbappe");
        assert_eq!(goals.margin, 10.0);
        assert_eq!(comparison.key_differences[0].leader, "Vinicius Jr");
        assert_eq!(
            comparison.key_differences[0].description,
            "Vinicius Jr has significantly higher market value (€20,000,000 difference)"
        );
        assert_eq!(goals.description, "Mbappe scored 10 more goals");
        assert_eq!(comparison.key_differences[2].description, "Vinicius Jr provided 3 more assists");
    }

    #[test]
    fn test_compare_identical_players_is_draw() {
        let a = player("Twin A", "Defender", &[("goals", 1.0), ("clean_sheets", 10.0)]);
        let b = player("Twin B", "Defender", &[("goals", 1.0), ("clean_sheets", 10.0)]);
        let comparison = scorer().compare(&a, &b, &ComparisonConfig::default()).unwrap();
        assert_eq!(comparison.outcome, Outcome::Draw);
    }

    #[test]
    fn test_age_rule_favors_younger() {
        let a = player("Veteran", "Midfielder", &[("goals", 2.0), ("age", 39.0)]);
        let b = player("Prospect", "Midfielder", &[("goals", 2.0), ("age", 21.0)]);
        let comparison = scorer().compare(&a, &b, &ComparisonConfig::default()).unwrap();

        let age = comparison.key_differences.iter().find(|d| d.metric == "age").unwrap();
        assert_eq!(age.leader, "Prospect");
        assert_eq!(age.margin, 18.0);
        assert_eq!(age.description, "Prospect is significantly younger (18 years difference)");
    }
}
