use std::time::Duration;

use thiserror::Error;

use crate::registry::TeamId;

/// Caller errors detected before any constraint is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("team {team} is listed as playing itself")]
    SelfMatchup { team: TeamId },

    #[error("negative remaining-game count {count} between {a} and {b}")]
    NegativeCount { a: TeamId, b: TeamId, count: i64 },

    #[error("team {team} has negative recorded wins ({wins})")]
    NegativeWins { team: TeamId, wins: i64 },

    #[error("team reference {0} is not in the registry")]
    UnknownTeam(String),

    #[error("no recorded wins for team {team}")]
    MissingRecordedWins { team: TeamId },

    #[error("division '{name}' has {found} teams, expected {expected}")]
    DivisionSize {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{divisions} divisions cannot be split into leagues of {per_league}")]
    IncompleteLeague { divisions: usize, per_league: usize },

    #[error("division '{division}' belongs to league '{found}' but is grouped with '{expected}'")]
    MixedLeague {
        division: String,
        expected: String,
        found: String,
    },

    #[error("external team id {0} appears more than once")]
    DuplicateExternalId(u32),

    #[error("registry has no teams")]
    EmptyRegistry,

    #[error("layout needs at least one team per division and one division per league (got {teams_per_division} and {divisions_per_league})")]
    InvalidLayout {
        teams_per_division: usize,
        divisions_per_league: usize,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// The base constraints alone are contradictory.
    #[error("no valid season completion exists for the recorded wins and remaining games")]
    NoValidCompletion,

    #[error("solve call for {query} exceeded the {limit:?} time budget")]
    Timeout { query: String, limit: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("season file could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Solver(#[from] anyhow::Error),
}

impl Error {
    /// Caller errors are never worth retrying; everything else might be.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::Input(_) | Error::Parse(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
