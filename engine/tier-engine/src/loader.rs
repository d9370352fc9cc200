//! Snapshot loading.
//!
//! Reads season statistics from JSON into entity records. Records are flat:
//! identifying fields plus any number of numeric stat columns.
//!
//! ```json
//! {
//!   "season": "2024-25",
//!   "teams": [{ "team": "Barcelona", "position": 1, "goals_for": 102 }],
//!   "players": [{ "name": "Pedri", "team": "Barcelona", "position": "Midfielder", "goals": 8 }]
//! }
//! ```

use crate::error::Result;
use crate::models::Entity;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct TeamRecord {
    team: String,
    #[serde(flatten)]
    stats: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PlayerRecord {
    name: String,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(flatten)]
    stats: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    season: Option<String>,
    #[serde(default)]
    teams: Vec<TeamRecord>,
    #[serde(default)]
    players: Vec<PlayerRecord>,
}

/// Teams and players for one season, fixed for the duration of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub season: Option<String>,
    pub teams: Vec<Entity>,
    pub players: Vec<Entity>,
}

/// Keep numeric columns; strings, booleans and nulls are not metrics
fn numeric_stats(stats: HashMap<String, Value>) -> HashMap<String, f64> {
    stats
        .into_iter()
        .filter_map(|(key, value)| value.as_f64().map(|v| (key, v)))
        .collect()
}

impl Snapshot {
    /// Parse a snapshot from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: SnapshotFile = serde_json::from_str(content)?;

        let teams = file
            .teams
            .into_iter()
            .map(|record| Entity {
                name: record.team,
                category: None,
                affiliation: None,
                metrics: numeric_stats(record.stats),
            })
            .collect();

        let players = file
            .players
            .into_iter()
            .map(|record| Entity {
                name: record.name,
                category: record.position,
                affiliation: record.team,
                metrics: numeric_stats(record.stats),
            })
            .collect();

        Ok(Self { season: file.season, teams, players })
    }

    /// Load a snapshot from a JSON file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("📂 Loading season snapshot from: {:?}", path.as_ref());

        let content = tokio::fs::read_to_string(&path).await?;
        let snapshot = Self::from_json_str(&content)?;

        info!("📊 Loaded {} teams and {} players", snapshot.teams.len(), snapshot.players.len());
        Ok(snapshot)
    }
}
