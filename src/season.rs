//! Season input file: team metadata, recorded wins and remaining games.
//!
//! ```json
//! {
//!   "season_games": 162,
//!   "teams": [
//!     { "id": 147, "abbreviation": "NYY", "division": "American League East",
//!       "league": "American League", "wins": 89 }
//!   ],
//!   "remaining": [ { "teams": [147, 111], "games": 3 } ]
//! }
//! ```
//!
//! `games` defaults to 1, so a schedule can also list one entry per
//! unplayed game.

use std::path::Path;

use serde::Deserialize;

use crate::error::{InputError, Result};
use crate::matchups::MatchupCounts;
use crate::registry::{LeagueLayout, Registry, RegistryBuilder};
use crate::wins::RecordedWins;

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonFile {
    pub teams: Vec<TeamRecord>,
    #[serde(default)]
    pub remaining: Vec<RemainingGames>,
    #[serde(default)]
    pub season_games: Option<u32>,
    #[serde(default)]
    pub layout: Option<LayoutRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamRecord {
    pub id: u32,
    pub abbreviation: String,
    pub division: String,
    #[serde(default)]
    pub league: Option<String>,
    pub wins: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemainingGames {
    pub teams: [u32; 2],
    #[serde(default = "one_game")]
    pub games: i64,
}

fn one_game() -> i64 {
    1
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LayoutRecord {
    pub teams_per_division: usize,
    pub divisions_per_league: usize,
}

/// Everything the solver consumes, with external ids resolved.
#[derive(Debug, Clone)]
pub struct Season {
    pub registry: Registry,
    pub counts: MatchupCounts,
    pub recorded: RecordedWins,
    pub season_games: Option<u32>,
}

impl Season {
    pub fn load(path: impl AsRef<Path>) -> Result<Season> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Season::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Season> {
        let file: SeasonFile = serde_json::from_str(raw)?;
        Season::from_file(file)
    }

    pub fn from_file(file: SeasonFile) -> Result<Season> {
        let layout = file
            .layout
            .map(|l| LeagueLayout {
                teams_per_division: l.teams_per_division,
                divisions_per_league: l.divisions_per_league,
            })
            .unwrap_or_default();

        let mut builder = RegistryBuilder::new(layout);
        for team in &file.teams {
            builder.team(team.id, team.abbreviation.clone(), team.division.clone(), team.league.clone());
        }
        let registry = builder.build()?;

        let resolve = |external: u32| {
            registry
                .by_external_id(external)
                .ok_or_else(|| InputError::UnknownTeam(format!("external id {}", external)))
        };

        let mut recorded = RecordedWins::new();
        for team in &file.teams {
            recorded.set(resolve(team.id)?, team.wins);
        }

        let mut counts = MatchupCounts::new();
        for entry in &file.remaining {
            let [a, b] = entry.teams;
            counts.add_games(resolve(a)?, resolve(b)?, entry.games);
        }

        log::info!(
            "loaded season: {} teams, {} matchups with games left",
            registry.len(),
            counts.len()
        );

        Ok(Season {
            registry,
            counts,
            recorded,
            season_games: file.season_games,
        })
    }
}
