//! Remaining head-to-head games and the decision variables that split them.

use std::collections::BTreeMap;
use std::fmt;

use rustsat::types::Lit;

use crate::encoding::Encoder;
use crate::error::InputError;
use crate::registry::{Registry, TeamId};

/// Unordered team pair, stored low id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Matchup {
    low: TeamId,
    high: TeamId,
}

impl Matchup {
    pub fn new(a: TeamId, b: TeamId) -> Self {
        if a <= b {
            Matchup { low: a, high: b }
        } else {
            Matchup { low: b, high: a }
        }
    }

    pub fn teams(&self) -> (TeamId, TeamId) {
        (self.low, self.high)
    }

    pub fn is_self_pair(&self) -> bool {
        self.low == self.high
    }
}

impl fmt::Display for Matchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.low, self.high)
    }
}

/// Remaining games per unordered pair. Counts are signed so a bad feed can
/// be reported instead of silently wrapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchupCounts {
    counts: BTreeMap<Matchup, i64>,
}

impl MatchupCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `games` to the pair's count; `(a, b)` and `(b, a)` are the same pair.
    pub fn add_games(&mut self, a: TeamId, b: TeamId, games: i64) -> &mut Self {
        *self.counts.entry(Matchup::new(a, b)).or_insert(0) += games;
        self
    }

    pub fn get(&self, a: TeamId, b: TeamId) -> i64 {
        self.counts.get(&Matchup::new(a, b)).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Matchup, i64)> + '_ {
        self.counts.iter().map(|(&m, &n)| (m, n))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn validate(&self, registry: &Registry) -> Result<(), InputError> {
        for (m, n) in self.iter() {
            for team in [m.low, m.high] {
                if !registry.contains(team) {
                    return Err(InputError::UnknownTeam(team.to_string()));
                }
            }
            if m.is_self_pair() {
                return Err(InputError::SelfMatchup { team: m.low });
            }
            if n < 0 {
                return Err(InputError::NegativeCount {
                    a: m.low,
                    b: m.high,
                    count: n,
                });
            }
        }
        Ok(())
    }
}

/// Wins of `winner` over `loser` in their remaining games, as the number of
/// true literals in `lits`.
#[derive(Debug, Clone)]
pub struct DecisionVar {
    pub name: String,
    pub winner: TeamId,
    pub loser: TeamId,
    pub lits: Vec<Lit>,
}

/// One decision variable per ordered pair with games left.
///
/// A pair with `n` games owns literals `g_1..g_n` meaning "the low id takes
/// game i", ordered so `g_{i+1} -> g_i`. The low team's wins are the true
/// `g_i`, the high team's wins are the true `!g_i`; both are in `0..=n` and
/// always sum to `n`, and each split has exactly one model.
#[derive(Debug, Clone, Default)]
pub struct MatchupSpace {
    vars: BTreeMap<(TeamId, TeamId), DecisionVar>,
}

impl MatchupSpace {
    pub fn build(
        registry: &Registry,
        counts: &MatchupCounts,
        enc: &mut Encoder,
    ) -> Result<Self, InputError> {
        counts.validate(registry)?;

        // Codes are only unique names if no two teams share one
        let by_code = registry.codes_unique();
        let label = |team: TeamId| match registry.team(team) {
            Some(t) if by_code => t.code.clone(),
            _ => team.to_string(),
        };
        let name = |winner: TeamId, loser: TeamId| format!("{} beats {}", label(winner), label(loser));

        let mut vars = BTreeMap::new();
        for (m, n) in counts.iter() {
            if n == 0 {
                continue;
            }
            let (low, high) = m.teams();
            let games: Vec<Lit> = (0..n).map(|_| enc.new_lit()).collect();
            for pair in games.windows(2) {
                enc.add_binary(!pair[1], pair[0]);
            }

            vars.insert(
                (low, high),
                DecisionVar {
                    name: name(low, high),
                    winner: low,
                    loser: high,
                    lits: games.clone(),
                },
            );
            vars.insert(
                (high, low),
                DecisionVar {
                    name: name(high, low),
                    winner: high,
                    loser: low,
                    lits: games.iter().map(|&g| !g).collect(),
                },
            );
        }

        log::debug!("matchup space: {} decision variables", vars.len());
        Ok(MatchupSpace { vars })
    }

    pub fn get(&self, winner: TeamId, loser: TeamId) -> Option<&DecisionVar> {
        self.vars.get(&(winner, loser))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionVar> {
        self.vars.values()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Every winner-side literal of `team`, opponents in id order.
    pub fn winner_lits(&self, team: TeamId) -> Vec<Lit> {
        self.vars
            .range((team, TeamId(0))..=(team, TeamId(usize::MAX)))
            .flat_map(|(_, v)| v.lits.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::registry;
    use crate::registry::LeagueLayout;

    fn small() -> Registry {
        registry(
            LeagueLayout {
                teams_per_division: 3,
                divisions_per_league: 1,
            },
            1,
        )
    }

    #[test]
    fn test_pairs_are_unordered_and_accumulate() {
        let mut counts = MatchupCounts::new();
        counts
            .add_games(TeamId(2), TeamId(0), 1)
            .add_games(TeamId(0), TeamId(2), 1)
            .add_games(TeamId(1), TeamId(0), 3);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.get(TeamId(0), TeamId(2)), 2);
        assert_eq!(counts.get(TeamId(1), TeamId(0)), 3);
    }

    #[test]
    fn test_self_pair_is_rejected() {
        let mut counts = MatchupCounts::new();
        counts.add_games(TeamId(1), TeamId(1), 2);
        let mut enc = Encoder::new();
        assert_eq!(
            MatchupSpace::build(&small(), &counts, &mut enc).unwrap_err(),
            InputError::SelfMatchup { team: TeamId(1) }
        );
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let mut counts = MatchupCounts::new();
        counts.add_games(TeamId(0), TeamId(1), -1);
        let mut enc = Encoder::new();
        assert!(matches!(
            MatchupSpace::build(&small(), &counts, &mut enc),
            Err(InputError::NegativeCount { count: -1, .. })
        ));
    }

    #[test]
    fn test_unknown_team_is_rejected() {
        let mut counts = MatchupCounts::new();
        counts.add_games(TeamId(0), TeamId(9), 1);
        let mut enc = Encoder::new();
        assert!(matches!(
            MatchupSpace::build(&small(), &counts, &mut enc),
            Err(InputError::UnknownTeam(_))
        ));
    }

    #[test]
    fn test_both_directions_get_named_variables() {
        let mut counts = MatchupCounts::new();
        counts
            .add_games(TeamId(0), TeamId(1), 3)
            .add_games(TeamId(1), TeamId(2), 0);
        let mut enc = Encoder::new();
        let space = MatchupSpace::build(&small(), &counts, &mut enc).unwrap();

        assert_eq!(space.len(), 2);
        let forward = space.get(TeamId(0), TeamId(1)).unwrap();
        let backward = space.get(TeamId(1), TeamId(0)).unwrap();
        assert_eq!(forward.name, "T0 beats T1");
        assert_eq!(backward.name, "T1 beats T0");
        assert_eq!(forward.lits.len(), 3);
        for (f, b) in forward.lits.iter().zip(&backward.lits) {
            assert_eq!(*f, !*b);
        }
        assert!(space.get(TeamId(1), TeamId(2)).is_none());
        assert_eq!(space.winner_lits(TeamId(1)).len(), 3);
        assert!(space.winner_lits(TeamId(2)).is_empty());
    }

    #[test]
    fn test_colliding_codes_fall_back_to_ids() {
        let mut builder = crate::registry::RegistryBuilder::new(LeagueLayout {
            teams_per_division: 2,
            divisions_per_league: 1,
        });
        builder.team(1, "NY", "East", None).team(2, "NY", "East", None);
        let reg = builder.build().unwrap();

        let mut counts = MatchupCounts::new();
        counts.add_games(TeamId(0), TeamId(1), 1);
        let mut enc = Encoder::new();
        let space = MatchupSpace::build(&reg, &counts, &mut enc).unwrap();
        assert_eq!(space.get(TeamId(1), TeamId(0)).unwrap().name, "#1 beats #0");
    }
}
