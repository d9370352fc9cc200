//! # Command Line Interface
//!
//! CLI for ranking teams and players from a season snapshot.

use crate::analysis::SquadProfile;
use crate::engine::{TeamRanking, TierEngine};
use crate::loader::Snapshot;
use crate::position::{CategoryScores, Comparison, Outcome};
use crate::tiers::TieBreak;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Tier CLI for team and player rankings
#[derive(Parser)]
#[command(name = "tier-cli")]
#[command(about = "Rank teams and players into performance tiers from season statistics")]
pub struct Cli {
    /// Path to the season snapshot (JSON)
    #[arg(short, long, default_value = "./data/laliga_2024_25.json")]
    pub data_path: PathBuf,

    /// Optional configuration file (TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score all teams and assign tiers
    Teams,
    /// Score players within their positions
    Players {
        /// Only this position
        #[arg(long)]
        position: Option<String>,
        /// Players shown per position
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Compare two players of the same position
    Compare {
        /// First player name
        first: String,
        /// Second player name
        second: String,
    },
    /// Profile a team's squad
    Squad {
        /// Team name
        team: String,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

/// CLI handler
pub struct CliHandler {
    engine: TierEngine,
    data_path: PathBuf,
    json: bool,
}

impl CliHandler {
    /// Create new CLI handler
    pub fn new(engine: TierEngine, data_path: PathBuf, json: bool) -> Self {
        Self { engine, data_path, json }
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Teams => {
                let snapshot = self.snapshot().await?;
                let ranking = self.engine.rank_teams(&snapshot.teams);
                self.emit(&ranking, |r| self.show_teams(r))?;
            }
            Commands::Players { position, top } => {
                let snapshot = self.snapshot().await?;
                let ranked = self.engine.rank_players(&snapshot.players, position.as_deref())?;
                self.emit(&ranked, |r| self.show_players(r, top))?;
            }
            Commands::Compare { first, second } => {
                let snapshot = self.snapshot().await?;
                let comparison = self.engine.compare_players(&snapshot.players, &first, &second)?;
                self.emit(&comparison, |c| self.show_comparison(c))?;
            }
            Commands::Squad { team } => {
                let snapshot = self.snapshot().await?;
                match self.engine.squad_profile(&snapshot.players, &team)? {
                    Some(profile) => self.emit(&profile, |p| self.show_squad(p))?,
                    None => println!("No players found for {}", team),
                }
            }
            Commands::InitConfig { path } => {
                self.engine.config().save_to_file(&path)?;
                println!("Wrote configuration to {}", path.display());
            }
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let snapshot = Snapshot::load_from_file(&self.data_path)
            .await
            .with_context(|| format!("Failed to load snapshot from {}", self.data_path.display()))?;
        info!("Season: {}", snapshot.season.as_deref().unwrap_or("unknown"));
        Ok(snapshot)
    }

    fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            table(value);
        }
        Ok(())
    }

    fn show_teams(&self, ranking: &TeamRanking) {
        let ladder = self.engine.assigner().ladder();
        let breakpoints: Vec<String> = ladder.breakpoints().iter().map(|p| format!("{:.0}", p)).collect();
        let ties = match ladder.tie_break() {
            TieBreak::InputOrder => "input order",
            TieBreak::Name => "name",
        };

        println!("🏆 Team Tier Rankings");
        println!("{}", "=".repeat(50));
        println!("Percentile breakpoints: {} (ties by {})", breakpoints.join(" / "), ties);

        for summary in &ranking.summaries {
            println!("\n{} ({} teams)", paint_tier(&summary.tier), summary.count);
            for team in &summary.members {
                let score = ranking.scores.scores.get(team).unwrap_or(0.0);
                println!("  {:<24} {:>6.1}", team, score);
            }
            for (metric, avg) in &summary.averages {
                println!("  avg {:<20} {:>6.1}", metric, avg);
            }
            for line in &summary.characteristics {
                println!("  • {}", line.dimmed());
            }
        }

        if ranking.tiers.overrides > 0 {
            println!(
                "\n{} entities moved from their percentile tier to meet target counts",
                ranking.tiers.overrides
            );
        }
    }

    fn show_players(&self, ranked: &[CategoryScores], top: usize) {
        for category in ranked {
            println!("\n⚽ {}", category.category.bold());
            println!("{}", "-".repeat(40));

            let players = category.report.scores.top(top);
            if players.is_empty() {
                println!("  No players found");
            }
            for (rank, player) in players.iter().enumerate() {
                println!("  {:>2}. {:<28} {:>8.1}", rank + 1, player.name, player.score);
            }
        }
    }

    fn show_comparison(&self, comparison: &Comparison) {
        println!("🔍 {} vs {} ({})", comparison.left.name, comparison.right.name, comparison.position);
        println!("{}", "=".repeat(50));
        println!("  {:<28} {:>8.1}", comparison.left.name, comparison.left.score);
        println!("  {:<28} {:>8.1}", comparison.right.name, comparison.right.score);

        match &comparison.outcome {
            Outcome::Winner(name) => println!("\nWinner: {}", name.green().bold()),
            Outcome::Draw => println!("\nDraw"),
        }
        for difference in &comparison.key_differences {
            println!("  • {}", difference.description);
        }
    }

    fn show_squad(&self, profile: &SquadProfile) {
        println!("📋 {} squad ({} players)", profile.team.bold(), profile.squad_size);
        println!("{}", "=".repeat(50));
        if let Some(age) = profile.average_age {
            println!("  Average age:        {:.1}", age);
        }
        println!("  Total market value: €{:.0}", profile.total_market_value);
        println!("  Goals / assists:    {:.0} / {:.0}", profile.total_goals, profile.total_assists);

        for position in &profile.positions {
            let top = position
                .top_performer
                .as_ref()
                .map(|p| format!("{} ({:.1})", p.name, p.score))
                .unwrap_or_else(|| "-".to_string());
            println!("  {:<12} {:>2} players, top: {}", position.position, position.count, top);
        }
        for strength in &profile.strengths {
            println!("  {} {}", "+".green(), strength);
        }
        for weakness in &profile.weaknesses {
            println!("  {} {}", "-".red(), weakness);
        }
    }
}

fn paint_tier(tier: &str) -> ColoredString {
    let label = format!("Tier {}", tier);
    match tier {
        "S" => label.yellow().bold(),
        "A" => label.white().bold(),
        "B" => label.truecolor(205, 127, 50).bold(),
        "C" => label.green().bold(),
        "D" => label.red().bold(),
        _ => label.normal(),
    }
}
