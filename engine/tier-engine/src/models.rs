use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category key used for entities that declare no category
pub const UNCATEGORIZED: &str = "uncategorized";

/// Whether a higher or lower raw value is favorable for a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    HigherIsBetter,
    LowerIsBetter,
}

/// A named numeric attribute with a declared polarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub polarity: Polarity,
}

impl MetricSpec {
    pub fn new(name: impl Into<String>, polarity: Polarity) -> Self {
        Self { name: name.into(), polarity }
    }

    pub fn higher(name: impl Into<String>) -> Self {
        Self::new(name, Polarity::HigherIsBetter)
    }

    pub fn lower(name: impl Into<String>) -> Self {
        Self::new(name, Polarity::LowerIsBetter)
    }
}

/// A team or player record being scored.
///
/// Entities are read-only inputs: every stage produces new output mappings
/// and never writes derived values back onto the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique name within a scoring group (e.g., "Barcelona", "Pedri")
    pub name: String,
    /// Role category (player position); `None` for teams
    #[serde(default)]
    pub category: Option<String>,
    /// Owning team for players
    #[serde(default)]
    pub affiliation: Option<String>,
    /// Raw metric values keyed by metric name
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), category: None, affiliation: None, metrics: HashMap::new() }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_metric(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(metric.into(), value);
        self
    }

    /// Raw value of a metric; NaN counts as undefined
    pub fn metric(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).copied().filter(|v| !v.is_nan())
    }

    /// Category key used for grouping
    pub fn category_key(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// One scored entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntity {
    pub name: String,
    pub score: f64,
}

/// Entity name → score, in first-insertion order.
///
/// Inserting a name that is already present overwrites its score and keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreMap {
    entries: Vec<ScoredEntity>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, score: f64) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].score = score,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(ScoredEntity { name, score });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&slot| self.entries[slot].score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredEntity> {
        self.entries.iter()
    }

    /// Best `limit` entries, best first; equal scores keep insertion order
    pub fn top(&self, limit: usize) -> Vec<&ScoredEntity> {
        let mut ranked: Vec<&ScoredEntity> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit);
        ranked
    }
}

impl FromIterator<(String, f64)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut map = ScoreMap::new();
        for (name, score) in iter {
            map.insert(name, score);
        }
        map
    }
}

/// Entity name → tier label, in assignment order (best score first)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierAssignment {
    entries: Vec<(String, String)>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TierAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, name: impl Into<String>, tier: impl Into<String>) {
        let name = name.into();
        let tier = tier.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = tier,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, tier));
            }
        }
    }

    pub fn tier_of(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&slot| self.entries[slot].1.as_str())
    }

    /// Members of a tier in assignment order
    pub fn members(&self, tier: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, t)| t == tier)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn count(&self, tier: &str) -> usize {
        self.entries.iter().filter(|(_, t)| t == tier).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, tier)| (name.as_str(), tier.as_str()))
    }
}

/// Non-fatal anomalies absorbed during scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoringAnomaly {
    /// Every entity shares the same value; all normalize to the midpoint
    DegenerateGroup { metric: String, value: f64 },
    /// A weighted metric is absent for one entity and left out of its score
    MissingMetricSkip { entity: String, metric: String },
    /// No weighted metric applied to the entity; its score defaults to 0
    NoOverlap { entity: String },
    /// Nothing to score in this scope
    EmptyGroup { scope: String },
}

/// Scores for one group plus everything absorbed along the way
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreReport {
    pub scores: ScoreMap,
    pub anomalies: Vec<ScoringAnomaly>,
}

impl ScoreReport {
    pub fn empty(scope: impl Into<String>) -> Self {
        Self {
            scores: ScoreMap::new(),
            anomalies: vec![ScoringAnomaly::EmptyGroup { scope: scope.into() }],
        }
    }
}

/// Outcome of tier assignment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierReport {
    /// Authoritative, rebalanced assignment
    pub assignment: TierAssignment,
    /// Percentile-threshold labels before rebalancing
    pub first_pass: TierAssignment,
    /// Entities whose rebalanced tier differs from the first pass
    pub overrides: usize,
}

/// Events emitted by the Tier Engine
#[derive(Debug, Clone, Serialize)]
pub enum TierEvent {
    /// A group finished scoring
    ScoringCompleted {
        scope: String,
        scored_count: usize,
        anomaly_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Tiers were assigned for a scored group
    TiersAssigned {
        scope: String,
        entity_count: usize,
        overrides: usize,
        timestamp: DateTime<Utc>,
    },
}
