//! Tier assignment.
//!
//! Two passes over the scores sorted best first:
//!
//! 1. a percentile pass that labels each entity from where its score falls in
//!    the distribution, and
//! 2. a greedy rebalance that fills tiers best to worst up to their target
//!    counts.
//!
//! The rebalance is authoritative. The percentile labels are kept in the
//! report so callers can see where the target distribution overrode the
//! raw score spread.

use crate::config::TierLadderConfig;
use crate::error::{Result, TierEngineError};
use crate::models::{ScoreMap, ScoredEntity, TierAssignment, TierReport};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// How entities with equal scores are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the order in which entities were scored
    #[default]
    InputOrder,
    /// Alphabetical by name
    Name,
}

/// A validated tier with its target count
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub label: String,
    pub target: usize,
}

/// Validated, ordered tiers (best first) with percentile breakpoints
#[derive(Debug, Clone, PartialEq)]
pub struct TierLadder {
    tiers: Vec<Tier>,
    breakpoints: Vec<f64>,
    tie_break: TieBreak,
}

impl TierLadder {
    /// Validate a configured ladder.
    ///
    /// Fails on an empty ladder, duplicate labels, negative targets, or
    /// breakpoints that are not one fewer than the tiers, descending, and
    /// within [0, 100].
    pub fn from_config(config: &TierLadderConfig) -> Result<Self> {
        if config.tiers.is_empty() {
            return Err(TierEngineError::EmptyTierLadder);
        }

        let mut seen = HashSet::new();
        let mut tiers = Vec::with_capacity(config.tiers.len());
        for spec in &config.tiers {
            if !seen.insert(spec.label.as_str()) {
                return Err(TierEngineError::DuplicateTier(spec.label.clone()));
            }
            let target = usize::try_from(spec.target).map_err(|_| TierEngineError::NegativeTarget {
                tier: spec.label.clone(),
                target: spec.target,
            })?;
            tiers.push(Tier { label: spec.label.clone(), target });
        }

        let expected = tiers.len() - 1;
        if config.breakpoints.len() != expected {
            return Err(TierEngineError::BreakpointMismatch {
                expected,
                found: config.breakpoints.len(),
            });
        }
        for (i, &p) in config.breakpoints.iter().enumerate() {
            let in_range = (0.0..=100.0).contains(&p);
            let descending = i == 0 || p < config.breakpoints[i - 1];
            if !in_range || !descending {
                return Err(TierEngineError::InvalidBreakpoint(p));
            }
        }

        Ok(Self { tiers, breakpoints: config.breakpoints.clone(), tie_break: config.tie_break })
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|t| t.label.as_str())
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Sum of all target counts
    pub fn capacity(&self) -> usize {
        self.tiers.iter().map(|t| t.target).sum()
    }
}

/// Linear-interpolated percentile of ascending-sorted values
pub fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = pct.clamp(0.0, 100.0) / 100.0 * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Converts a score map into tier labels
#[derive(Debug, Clone)]
pub struct TierAssigner {
    ladder: TierLadder,
}

impl TierAssigner {
    pub fn new(ladder: TierLadder) -> Self {
        Self { ladder }
    }

    pub fn ladder(&self) -> &TierLadder {
        &self.ladder
    }

    /// Entities best first; equal scores follow the ladder's tie-break
    pub fn rank<'a>(&self, scores: &'a ScoreMap) -> Vec<&'a ScoredEntity> {
        let mut ranked: Vec<&ScoredEntity> = scores.iter().collect();
        ranked.sort_by(|a, b| {
            let by_score = b.score.total_cmp(&a.score);
            match self.ladder.tie_break {
                TieBreak::InputOrder => by_score,
                TieBreak::Name => by_score.then_with(|| a.name.cmp(&b.name)),
            }
        });
        ranked
    }

    /// Percentile thresholds, one per breakpoint
    pub fn thresholds(&self, scores: &ScoreMap) -> Vec<f64> {
        let mut values: Vec<f64> = scores.iter().map(|s| s.score).collect();
        values.sort_by(f64::total_cmp);
        self.ladder.breakpoints.iter().filter_map(|&p| percentile(&values, p)).collect()
    }

    /// Label each entity from its score alone: the first tier whose threshold
    /// the score reaches, otherwise the worst tier
    pub fn first_pass(&self, scores: &ScoreMap) -> TierAssignment {
        let thresholds = self.thresholds(scores);
        let worst = self.ladder.tiers.len() - 1;

        let mut assignment = TierAssignment::new();
        for entity in self.rank(scores) {
            let slot = thresholds
                .iter()
                .position(|&t| entity.score >= t)
                .unwrap_or(worst);
            assignment.assign(entity.name.clone(), self.ladder.tiers[slot].label.clone());
        }
        assignment
    }

    /// Fill tiers best to worst up to their targets.
    ///
    /// Each entity, in rank order, takes the best tier with room. Once every
    /// tier is full the remaining entities land in the worst tier, so nobody
    /// is dropped.
    pub fn rebalance(&self, scores: &ScoreMap) -> TierAssignment {
        let tiers = &self.ladder.tiers;
        let worst = tiers.len() - 1;
        let mut counts = vec![0usize; tiers.len()];

        let mut assignment = TierAssignment::new();
        for entity in self.rank(scores) {
            let slot = (0..tiers.len())
                .find(|&i| counts[i] < tiers[i].target)
                .unwrap_or(worst);
            counts[slot] += 1;
            assignment.assign(entity.name.clone(), tiers[slot].label.clone());
        }

        if scores.len() != self.ladder.capacity() {
            debug!(
                "{} entities against a target total of {}; difference absorbed at the edges",
                scores.len(),
                self.ladder.capacity()
            );
        }
        assignment
    }

    /// Run both passes
    pub fn assign(&self, scores: &ScoreMap) -> TierReport {
        if scores.is_empty() {
            return TierReport::default();
        }

        let first_pass = self.first_pass(scores);
        let assignment = self.rebalance(scores);
        let overrides = assignment
            .iter()
            .filter(|(name, tier)| first_pass.tier_of(name) != Some(*tier))
            .count();

        info!(
            "🏆 Assigned {} entities to {} tiers ({} overridden by targets)",
            assignment.len(),
            self.ladder.tiers.len(),
            overrides
        );
        TierReport { assignment, first_pass, overrides }
    }
}
