use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{
    analysis::{profile_squad, summarize_tiers, SquadProfile, TierSummary},
    config::TierEngineConfig,
    error::{Result, TierEngineError},
    models::{Entity, ScoreReport, TierEvent, TierReport},
    position::{CategoryScores, Comparison, PositionScorer},
    scorer::score_group,
    tiers::{TierAssigner, TierLadder},
};

/// Full team ranking: scores, tiers and per-tier summaries
#[derive(Debug, Clone, Serialize)]
pub struct TeamRanking {
    pub scores: ScoreReport,
    pub tiers: TierReport,
    pub summaries: Vec<TierSummary>,
    pub events: Vec<TierEvent>,
}

/// Entry point tying the scorers and the tier assigner to one configuration.
///
/// Holds no per-call state: every method reads the snapshot it is given and
/// returns fresh results.
pub struct TierEngine {
    config: TierEngineConfig,
    assigner: TierAssigner,
    positions: PositionScorer,
}

impl TierEngine {
    pub fn new(config: TierEngineConfig) -> Result<Self> {
        config.validate()?;

        let ladder = TierLadder::from_config(&config.tiers)?;
        let assigner = TierAssigner::new(ladder);
        let positions = PositionScorer::new(config.players.clone());

        info!(
            "🔧 Tier Engine ready: {} tiers, {} position profiles",
            assigner.ladder().tiers().len(),
            positions.profiles().positions.len()
        );

        Ok(Self { config, assigner, positions })
    }

    pub fn config(&self) -> &TierEngineConfig {
        &self.config
    }

    pub fn assigner(&self) -> &TierAssigner {
        &self.assigner
    }

    pub fn positions(&self) -> &PositionScorer {
        &self.positions
    }

    /// Score every team, assign tiers and summarize each tier
    pub fn rank_teams(&self, teams: &[Entity]) -> TeamRanking {
        let scores = score_group(teams, &self.config.teams, "teams");
        let tiers = self.assigner.assign(&scores.scores);
        let summaries =
            summarize_tiers(teams, &tiers.assignment, self.assigner.ladder(), &self.config.analysis);

        let events = vec![
            TierEvent::ScoringCompleted {
                scope: "teams".to_string(),
                scored_count: scores.scores.len(),
                anomaly_count: scores.anomalies.len(),
                timestamp: Utc::now(),
            },
            TierEvent::TiersAssigned {
                scope: "teams".to_string(),
                entity_count: tiers.assignment.len(),
                overrides: tiers.overrides,
                timestamp: Utc::now(),
            },
        ];

        TeamRanking { scores, tiers, summaries, events }
    }

    /// Score players per position; `Some(position)` restricts to one
    pub fn rank_players(&self, players: &[Entity], position: Option<&str>) -> Result<Vec<CategoryScores>> {
        match position {
            Some(position) => {
                let report = self.positions.score_category(players, position)?;
                Ok(vec![CategoryScores { category: position.to_string(), report }])
            }
            None => self.positions.score_all(players),
        }
    }

    /// Compare two players by name
    pub fn compare_players(&self, players: &[Entity], left: &str, right: &str) -> Result<Comparison> {
        let find = |name: &str| {
            players
                .iter()
                .find(|p| p.name == name)
                .ok_or_else(|| TierEngineError::UnknownEntity(name.to_string()))
        };
        self.positions.compare(find(left)?, find(right)?, &self.config.analysis.comparison)
    }

    /// Profile one team's squad
    pub fn squad_profile(&self, players: &[Entity], team: &str) -> Result<Option<SquadProfile>> {
        profile_squad(players, team, &self.positions, &self.config.analysis.squad)
    }
}
