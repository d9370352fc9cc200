//! # Configuration Management
//!
//! Weight maps, metric polarities, the tier ladder and analysis rules. All of
//! it is plain data handed to the scorers at call time.

use crate::error::{Result, TierEngineError};
use crate::models::{MetricSpec, Polarity};
use crate::scorer::{ScoreScale, WeightMap};
use crate::tiers::{TieBreak, TierLadder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Prefix for environment overrides, e.g. `TIER_ENGINE_TIERS__TIE_BREAK=name`
pub const ENV_PREFIX: &str = "TIER_ENGINE";

/// Configuration for the Tier Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierEngineConfig {
    /// Team scoring profile
    pub teams: CategoryProfile,

    /// Per-position player scoring profiles
    pub players: PositionProfiles,

    /// Tier ladder and target distribution
    pub tiers: TierLadderConfig,

    /// Tier summaries, comparisons and squad rules
    pub analysis: AnalysisConfig,
}

/// Weights, polarities and scaling for one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryProfile {
    /// Metric weights; the weighted metrics are the ones normalized
    pub weights: WeightMap,

    /// Polarity overrides; unlisted metrics are higher-is-better
    pub polarity: BTreeMap<String, Polarity>,

    /// Final score scaling
    pub scale: ScoreScale,
}

impl CategoryProfile {
    pub fn new(weights: WeightMap, scale: ScoreScale) -> Self {
        Self { weights, polarity: BTreeMap::new(), scale }
    }

    pub fn with_polarity(mut self, metric: impl Into<String>, polarity: Polarity) -> Self {
        self.polarity.insert(metric.into(), polarity);
        self
    }

    pub fn polarity_of(&self, metric: &str) -> Polarity {
        self.polarity.get(metric).copied().unwrap_or_default()
    }

    /// Metrics to normalize, one per weighted metric
    pub fn metric_specs(&self) -> Vec<MetricSpec> {
        self.weights.metrics().map(|m| MetricSpec::new(m, self.polarity_of(m))).collect()
    }
}

/// Scoring profile for one player position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionProfile {
    pub position: String,
    #[serde(flatten)]
    pub profile: CategoryProfile,
}

/// Ordered position profiles; the first entry is the fallback for positions
/// without a profile of their own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionProfiles {
    pub positions: Vec<PositionProfile>,
}

impl PositionProfiles {
    pub fn get(&self, position: &str) -> Option<&CategoryProfile> {
        self.positions.iter().find(|p| p.position == position).map(|p| &p.profile)
    }

    pub fn fallback(&self) -> Option<&PositionProfile> {
        self.positions.first()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.iter().map(|p| p.position.as_str())
    }
}

/// One tier and how many entities it should hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSpec {
    pub label: String,
    /// Signed so that a bad count can be reported instead of failing to parse
    pub target: i64,
}

impl TierSpec {
    pub fn new(label: impl Into<String>, target: i64) -> Self {
        Self { label: label.into(), target }
    }
}

/// Tier ladder as configured, best tier first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierLadderConfig {
    pub tiers: Vec<TierSpec>,

    /// Percentile cut points for the first pass, one fewer than tiers,
    /// descending
    pub breakpoints: Vec<f64>,

    /// How equal scores are ordered
    pub tie_break: TieBreak,
}

/// Descriptive traits listed for a tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCharacteristics {
    pub tier: String,
    pub traits: Vec<String>,
}

/// A difference worth calling out in a head-to-head comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceRule {
    pub metric: String,
    /// Smallest absolute gap that counts
    pub threshold: f64,
    /// Which side leads: the higher value, or the lower one (e.g. age)
    #[serde(default)]
    pub favors: Polarity,
    /// Positions the rule applies to; empty means every position
    #[serde(default)]
    pub positions: Vec<String>,
    /// Description template; `{leader}` and `{margin}` are substituted.
    /// Empty falls back to a generic description.
    #[serde(default)]
    pub message: String,
}

impl DifferenceRule {
    pub fn applies_to(&self, position: &str) -> bool {
        self.positions.is_empty() || self.positions.iter().any(|p| p == position)
    }

    /// Render the description for a difference led by `leader`
    pub fn describe(&self, leader: &str, margin: f64) -> String {
        if self.message.is_empty() {
            let direction = match self.favors {
                Polarity::HigherIsBetter => "higher",
                Polarity::LowerIsBetter => "lower",
            };
            return format!("{} has {} {} (difference {})", leader, direction, self.metric, format_margin(margin));
        }
        self.message.replace("{leader}", leader).replace("{margin}", &format_margin(margin))
    }
}

/// Whole numbers with thousands separators, anything else to one decimal
fn format_margin(margin: f64) -> String {
    if margin.fract() != 0.0 || margin.abs() >= 1e15 {
        return format!("{:.1}", margin);
    }
    let digits = format!("{:.0}", margin.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if margin < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Head-to-head comparison settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Stats reported for every player on top of the weighted metrics
    pub key_stats: Vec<String>,
    pub rules: Vec<DifferenceRule>,
}

/// Minimum players expected at a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthRule {
    pub position: String,
    pub minimum: usize,
    pub weakness: String,
}

/// Thresholds used to describe a squad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadRules {
    /// Average age below this reads as a young squad
    pub young_age: f64,
    /// Average age above this reads as an aging squad
    pub aging_age: f64,
    pub high_market_value: f64,
    pub low_market_value: f64,
    /// Position whose goal share is checked
    pub forward_position: String,
    /// Forward goal share above this is over-reliance
    pub forward_share_high: f64,
    /// Forward goal share below this means goals are spread out
    pub forward_share_low: f64,
    pub depth: Vec<DepthRule>,
}

/// Tier summary, comparison and squad settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Metrics averaged per tier in summaries
    pub summary_metrics: Vec<String>,
    pub characteristics: Vec<TierCharacteristics>,
    pub comparison: ComparisonConfig,
    pub squad: SquadRules,
}

impl AnalysisConfig {
    pub fn characteristics_of(&self, tier: &str) -> Vec<String> {
        self.characteristics
            .iter()
            .find(|c| c.tier == tier)
            .map(|c| c.traits.clone())
            .unwrap_or_default()
    }
}

impl Default for TierEngineConfig {
    fn default() -> Self {
        Self {
            teams: default_team_profile(),
            players: PositionProfiles::default(),
            tiers: TierLadderConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

fn default_team_profile() -> CategoryProfile {
    let weights = WeightMap::new()
        .with("position", 0.35)
        .with("goals_for", 0.15)
        .with("goals_against", 0.15)
        .with("possession_avg", 0.10)
        .with("pass_accuracy", 0.10)
        .with("shots_per_game", 0.08)
        .with("clean_sheets", 0.07);

    CategoryProfile::new(weights, ScoreScale::WeightedMean)
        .with_polarity("position", Polarity::LowerIsBetter)
        .with_polarity("goals_against", Polarity::LowerIsBetter)
}

fn position(name: &str, weights: WeightMap) -> PositionProfile {
    PositionProfile { position: name.to_string(), profile: CategoryProfile::new(weights, ScoreScale::Legacy) }
}

impl Default for PositionProfiles {
    fn default() -> Self {
        Self {
            positions: vec![
                position(
                    "Forward",
                    WeightMap::new()
                        .with("goals", 0.40)
                        .with("assists", 0.25)
                        .with("appearances", 0.15)
                        .with("market_value", 0.20),
                ),
                position(
                    "Midfielder",
                    WeightMap::new()
                        .with("goals", 0.20)
                        .with("assists", 0.35)
                        .with("appearances", 0.20)
                        .with("market_value", 0.25),
                ),
                position(
                    "Defender",
                    WeightMap::new()
                        .with("goals", 0.10)
                        .with("assists", 0.15)
                        .with("clean_sheets", 0.35)
                        .with("appearances", 0.20)
                        .with("market_value", 0.20),
                ),
                position(
                    "Goalkeeper",
                    WeightMap::new()
                        .with("saves", 0.40)
                        .with("clean_sheets", 0.35)
                        .with("appearances", 0.15)
                        .with("market_value", 0.10),
                ),
            ],
        }
    }
}

impl Default for TierLadderConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierSpec::new("S", 3),
                TierSpec::new("A", 4),
                TierSpec::new("B", 5),
                TierSpec::new("C", 5),
                TierSpec::new("D", 3),
            ],
            breakpoints: vec![85.0, 65.0, 40.0, 20.0],
            tie_break: TieBreak::InputOrder,
        }
    }
}

fn traits(tier: &str, lines: &[&str]) -> TierCharacteristics {
    TierCharacteristics { tier: tier.to_string(), traits: lines.iter().map(|l| l.to_string()).collect() }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            summary_metrics: ["points", "goals_for", "goals_against", "possession_avg"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            characteristics: vec![
                traits(
                    "S",
                    &[
                        "Elite teams competing for titles",
                        "Exceptional attacking and defensive balance",
                        "High possession and pass accuracy",
                        "World-class players in key positions",
                        "Consistent performance throughout season",
                    ],
                ),
                traits(
                    "A",
                    &[
                        "Strong teams competing for European qualification",
                        "Good balance between attack and defense",
                        "Solid tactical organization",
                        "Quality squad depth",
                        "Capable of beating top teams on their day",
                    ],
                ),
                traits(
                    "B",
                    &[
                        "Mid-table teams with clear strengths",
                        "May excel in specific areas (attack/defense)",
                        "Inconsistent performance levels",
                        "Limited squad depth",
                        "Fighting for European spots or avoiding relegation",
                    ],
                ),
                traits(
                    "C",
                    &[
                        "Teams struggling for consistency",
                        "Defensive or attacking weaknesses",
                        "Reliant on key players",
                        "Limited financial resources",
                        "Fighting to avoid relegation",
                    ],
                ),
                traits(
                    "D",
                    &[
                        "Teams with significant weaknesses",
                        "Poor defensive organization",
                        "Limited attacking threat",
                        "Squad quality concerns",
                        "High risk of relegation",
                    ],
                ),
            ],
            comparison: ComparisonConfig::default(),
            squad: SquadRules::default(),
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        let attacking = vec!["Forward".to_string(), "Midfielder".to_string()];
        Self {
            key_stats: vec!["age".to_string(), "market_value".to_string(), "appearances".to_string()],
            rules: vec![
                DifferenceRule {
                    metric: "age".to_string(),
                    threshold: 5.0,
                    favors: Polarity::LowerIsBetter,
                    positions: Vec::new(),
                    message: "{leader} is significantly younger ({margin} years difference)".to_string(),
                },
                DifferenceRule {
                    metric: "market_value".to_string(),
                    threshold: 20_000_000.0,
                    favors: Polarity::HigherIsBetter,
                    positions: Vec::new(),
                    message: "{leader} has significantly higher market value (€{margin} difference)".to_string(),
                },
                DifferenceRule {
                    metric: "goals".to_string(),
                    threshold: 5.0,
                    favors: Polarity::HigherIsBetter,
                    positions: attacking.clone(),
                    message: "{leader} scored {margin} more goals".to_string(),
                },
                DifferenceRule {
                    metric: "assists".to_string(),
                    threshold: 3.0,
                    favors: Polarity::HigherIsBetter,
                    positions: attacking,
                    message: "{leader} provided {margin} more assists".to_string(),
                },
            ],
        }
    }
}

impl Default for SquadRules {
    fn default() -> Self {
        let depth = |position: &str, minimum: usize, weakness: &str| DepthRule {
            position: position.to_string(),
            minimum,
            weakness: weakness.to_string(),
        };

        Self {
            young_age: 25.0,
            aging_age: 30.0,
            high_market_value: 30_000_000.0,
            low_market_value: 10_000_000.0,
            forward_position: "Forward".to_string(),
            forward_share_high: 0.7,
            forward_share_low: 0.5,
            depth: vec![
                depth("Goalkeeper", 2, "Limited goalkeeper options"),
                depth("Defender", 6, "Thin defensive options"),
                depth("Midfielder", 6, "Limited midfield depth"),
                depth("Forward", 4, "Few attacking options"),
            ],
        }
    }
}

impl TierEngineConfig {
    /// Load configuration from a file (TOML or JSON, by extension), with
    /// environment overrides on top
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
            .build()?;

        let config: TierEngineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
            .build()?;

        let config: TierEngineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check weights, positions and the tier ladder
    pub fn validate(&self) -> Result<()> {
        self.teams.weights.validate()?;

        if self.players.positions.is_empty() {
            return Err(TierEngineError::Configuration(
                "at least one player position profile is required".to_string(),
            ));
        }
        for position in &self.players.positions {
            position.profile.weights.validate()?;
        }

        TierLadder::from_config(&self.tiers)?;
        Ok(())
    }
}
