//! Tier Engine
//!
//! Ranks teams and players into discrete performance tiers from season
//! statistics. Raw metrics are min-max normalized within comparable groups,
//! combined into one weighted score per entity, and the scored entities are
//! split into ordered tiers that honor a target distribution.
//!
//! Every stage is a pure function of the snapshot it is given; weights and
//! tier targets arrive as explicit configuration.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalizer;
pub mod position;
pub mod scorer;
pub mod tiers;

pub use config::TierEngineConfig;
pub use engine::{TeamRanking, TierEngine};
pub use error::{Result, TierEngineError};
pub use loader::Snapshot;
pub use models::*;
pub use normalizer::{normalize_group, normalize_metric};
pub use position::PositionScorer;
pub use scorer::{score_group, ScoreScale, WeightMap, WeightedScorer};
pub use tiers::{TieBreak, TierAssigner, TierLadder};
