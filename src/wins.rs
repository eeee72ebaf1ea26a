//! Total wins per team as unary numbers over the decision variables.

use std::collections::BTreeMap;

use rustsat::types::Lit;

use crate::encoding::{Encoder, Formula};
use crate::error::InputError;
use crate::matchups::MatchupSpace;
use crate::registry::{Registry, TeamId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedWins {
    wins: BTreeMap<TeamId, i64>,
}

impl RecordedWins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, team: TeamId, wins: i64) -> &mut Self {
        self.wins.insert(team, wins);
        self
    }

    pub fn get(&self, team: TeamId) -> Option<i64> {
        self.wins.get(&team).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TeamId, i64)> + '_ {
        self.wins.iter().map(|(&t, &w)| (t, w))
    }

    pub fn validate(&self, registry: &Registry) -> Result<(), InputError> {
        for (team, wins) in self.iter() {
            if !registry.contains(team) {
                return Err(InputError::UnknownTeam(team.to_string()));
            }
            if wins < 0 {
                return Err(InputError::NegativeWins { team, wins });
            }
        }
        for team in registry.teams() {
            if self.get(team.id).is_none() {
                return Err(InputError::MissingRecordedWins { team: team.id });
            }
        }
        Ok(())
    }
}

/// `recorded + (number of true winner-side literals)`, with `ge[k]` true
/// exactly when at least `k + 1` of those literals are true.
#[derive(Debug, Clone)]
pub struct TotalWins {
    pub recorded: i64,
    pub ge: Vec<Lit>,
}

impl TotalWins {
    pub fn min(&self) -> i64 {
        self.recorded
    }

    pub fn max(&self) -> i64 {
        self.recorded + self.ge.len() as i64
    }

    /// `TotalWins >= value`
    pub fn at_least(&self, value: i64) -> Formula {
        if value <= self.min() {
            Formula::True
        } else if value > self.max() {
            Formula::False
        } else {
            Formula::lit(self.ge[(value - self.recorded - 1) as usize])
        }
    }

    /// `TotalWins == value`
    pub fn exactly(&self, value: i64) -> Formula {
        Formula::and([self.at_least(value), Formula::not(self.at_least(value + 1))])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `>`
    Greater,
    /// `>=`
    AtLeast,
}

impl Comparison {
    fn margin(self) -> i64 {
        match self {
            Comparison::Greater => 1,
            Comparison::AtLeast => 0,
        }
    }
}

/// One `TotalWins` per registered team. Built once per run and shared
/// read-only by every predicate.
#[derive(Debug, Clone)]
pub struct SeasonTotals {
    totals: Vec<TotalWins>,
}

impl SeasonTotals {
    pub fn build(
        registry: &Registry,
        space: &MatchupSpace,
        recorded: &RecordedWins,
        enc: &mut Encoder,
    ) -> Result<Self, InputError> {
        recorded.validate(registry)?;

        let mut totals = Vec::with_capacity(registry.len());
        for team in registry.teams() {
            let lits = space.winner_lits(team.id);
            let ge = enc.unary_count(&lits, lits.len());
            totals.push(TotalWins {
                recorded: recorded.get(team.id).unwrap_or(0),
                ge,
            });
        }
        Ok(SeasonTotals { totals })
    }

    pub fn get(&self, team: TeamId) -> &TotalWins {
        &self.totals[team.0]
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// `TotalWins(a) > TotalWins(b)` or `>=`, as the conjunction over every
    /// value `v` that `b` can reach of `b >= v -> a >= v + margin`.
    pub fn compare(&self, a: TeamId, b: TeamId, cmp: Comparison) -> Formula {
        let (ta, tb) = (self.get(a), self.get(b));
        let margin = cmp.margin();
        Formula::and(
            (tb.min()..=tb.max())
                .map(|v| Formula::implies(tb.at_least(v), ta.at_least(v + margin))),
        )
    }

    /// Caps every team's total at `games`.
    pub fn cap(&self, games: u32, enc: &mut Encoder) {
        for total in &self.totals {
            enc.assert(&Formula::not(total.at_least(games as i64 + 1)));
        }
    }
}
