//! Tier summaries and squad profiles built on top of scores and tiers

use crate::config::{AnalysisConfig, SquadRules};
use crate::error::Result;
use crate::models::{Entity, ScoredEntity, TierAssignment};
use crate::position::PositionScorer;
use crate::tiers::TierLadder;
use serde::Serialize;
use std::collections::BTreeMap;

const AGE: &str = "age";
const MARKET_VALUE: &str = "market_value";
const GOALS: &str = "goals";
const ASSISTS: &str = "assists";

/// Members and averages for one tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier: String,
    pub members: Vec<String>,
    pub count: usize,
    /// Mean of each summary metric over the members that report it
    pub averages: BTreeMap<String, f64>,
    pub characteristics: Vec<String>,
}

/// Totals for one position within a squad
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionBreakdown {
    pub position: String,
    pub count: usize,
    pub average_age: Option<f64>,
    pub total_market_value: f64,
    pub total_goals: f64,
    pub total_assists: f64,
    pub top_performer: Option<ScoredEntity>,
}

/// Overview of one team's squad
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadProfile {
    pub team: String,
    pub squad_size: usize,
    pub average_age: Option<f64>,
    pub total_market_value: f64,
    pub average_market_value: Option<f64>,
    pub total_goals: f64,
    pub total_assists: f64,
    pub positions: Vec<PositionBreakdown>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

fn mean(entities: &[&Entity], metric: &str) -> Option<f64> {
    let values: Vec<f64> = entities.iter().filter_map(|e| e.metric(metric)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn total(entities: &[&Entity], metric: &str) -> f64 {
    entities.iter().filter_map(|e| e.metric(metric)).sum()
}

/// Summarize each non-empty tier, best tier first
pub fn summarize_tiers(
    entities: &[Entity],
    assignment: &TierAssignment,
    ladder: &TierLadder,
    config: &AnalysisConfig,
) -> Vec<TierSummary> {
    ladder
        .labels()
        .filter_map(|tier| {
            let members = assignment.members(tier);
            if members.is_empty() {
                return None;
            }
            let rows: Vec<&Entity> =
                entities.iter().filter(|e| members.contains(&e.name.as_str())).collect();
            let averages = config
                .summary_metrics
                .iter()
                .filter_map(|metric| mean(&rows, metric).map(|avg| (metric.clone(), avg)))
                .collect();

            Some(TierSummary {
                tier: tier.to_string(),
                count: members.len(),
                members: members.iter().map(|m| m.to_string()).collect(),
                averages,
                characteristics: config.characteristics_of(tier),
            })
        })
        .collect()
}

/// Profile a team's squad.
///
/// Returns `None` when the team has no players. Top performers are scored
/// within the squad's own position groups.
pub fn profile_squad(
    players: &[Entity],
    team: &str,
    scorer: &PositionScorer,
    rules: &SquadRules,
) -> Result<Option<SquadProfile>> {
    let squad: Vec<Entity> =
        players.iter().filter(|p| p.affiliation.as_deref() == Some(team)).cloned().collect();
    if squad.is_empty() {
        return Ok(None);
    }
    let rows: Vec<&Entity> = squad.iter().collect();

    let mut order: Vec<&str> = Vec::new();
    for player in &squad {
        if !order.contains(&player.category_key()) {
            order.push(player.category_key());
        }
    }

    let mut positions = Vec::with_capacity(order.len());
    for position in order {
        let members: Vec<&Entity> = rows.iter().copied().filter(|p| p.category_key() == position).collect();
        let report = scorer.score_category(&squad, position)?;
        let top_performer = report.scores.top(1).into_iter().next().cloned();

        positions.push(PositionBreakdown {
            position: position.to_string(),
            count: members.len(),
            average_age: mean(&members, AGE),
            total_market_value: total(&members, MARKET_VALUE),
            total_goals: total(&members, GOALS),
            total_assists: total(&members, ASSISTS),
            top_performer,
        });
    }

    let (strengths, weaknesses) = assess_squad(&rows, &positions, rules);

    Ok(Some(SquadProfile {
        team: team.to_string(),
        squad_size: squad.len(),
        average_age: mean(&rows, AGE),
        total_market_value: total(&rows, MARKET_VALUE),
        average_market_value: mean(&rows, MARKET_VALUE),
        total_goals: total(&rows, GOALS),
        total_assists: total(&rows, ASSISTS),
        positions,
        strengths,
        weaknesses,
    }))
}

fn assess_squad(
    rows: &[&Entity],
    positions: &[PositionBreakdown],
    rules: &SquadRules,
) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();

    if let Some(age) = mean(rows, AGE) {
        if age < rules.young_age {
            strengths.push("Young squad with potential for growth".to_string());
        } else if age > rules.aging_age {
            weaknesses.push("Aging squad may need rejuvenation".to_string());
        } else {
            strengths.push("Good age balance in squad".to_string());
        }
    }

    if let Some(value) = mean(rows, MARKET_VALUE) {
        if value > rules.high_market_value {
            strengths.push("High-value players indicating quality".to_string());
        } else if value < rules.low_market_value {
            weaknesses.push("Limited market value may indicate quality concerns".to_string());
        }
    }

    let total_goals = total(rows, GOALS);
    if let Some(forwards) = positions.iter().find(|p| p.position == rules.forward_position) {
        if total_goals > 0.0 {
            let share = forwards.total_goals / total_goals;
            if share > rules.forward_share_high {
                weaknesses.push("Over-reliance on forwards for goals".to_string());
            } else if share < rules.forward_share_low {
                strengths.push("Goals spread across different positions".to_string());
            }
        }
    }

    for depth in &rules.depth {
        let count = positions
            .iter()
            .find(|p| p.position == depth.position)
            .map_or(0, |p| p.count);
        if count < depth.minimum {
            weaknesses.push(depth.weakness.clone());
        }
    }

    (strengths, weaknesses)
}
