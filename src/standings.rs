//! Division and wildcard placement predicates.
//!
//! Every predicate is instantiated for a concrete `(group, team)` and
//! defined once as a single literal; later queries reuse the literal from
//! the cache. Cache keys are `(group, team, kind)` identity, never formula
//! structure.

use std::collections::HashMap;
use std::fmt;

use rustsat::types::Lit;

use crate::encoding::{Encoder, Formula};
use crate::registry::{Registry, TeamId};
use crate::wins::{Comparison, SeasonTotals};

/// Second-wildcard contenders may have at most this many league teams
/// strictly ahead of them.
pub const MAX_TEAMS_AHEAD_FOR_SECOND_WILDCARD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupRef {
    Division(usize),
    League(usize),
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupRef::Division(i) => write!(f, "division {}", i),
            GroupRef::League(i) => write!(f, "league {}", i),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PredicateKind {
    WinDivision,
    WinOrTieDivision,
    TieDivision,
    WinFirstWildcard,
    WinOrTieFirstWildcard,
    TieFirstWildcard,
    WinSecondWildcard,
    WinOrTieSecondWildcard,
    TieSecondWildcard,
}

impl PredicateKind {
    pub const DIVISION: [PredicateKind; 2] = [PredicateKind::WinDivision, PredicateKind::TieDivision];

    pub const LEAGUE: [PredicateKind; 4] = [
        PredicateKind::WinFirstWildcard,
        PredicateKind::TieFirstWildcard,
        PredicateKind::WinSecondWildcard,
        PredicateKind::TieSecondWildcard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PredicateKind::WinDivision => "win_division",
            PredicateKind::WinOrTieDivision => "win_or_tie_division",
            PredicateKind::TieDivision => "tie_division",
            PredicateKind::WinFirstWildcard => "win_first_wildcard",
            PredicateKind::WinOrTieFirstWildcard => "win_or_tie_first_wildcard",
            PredicateKind::TieFirstWildcard => "tie_first_wildcard",
            PredicateKind::WinSecondWildcard => "win_second_wildcard",
            PredicateKind::WinOrTieSecondWildcard => "win_or_tie_second_wildcard",
            PredicateKind::TieSecondWildcard => "tie_second_wildcard",
        }
    }

    pub fn is_division(self) -> bool {
        matches!(
            self,
            PredicateKind::WinDivision | PredicateKind::WinOrTieDivision | PredicateKind::TieDivision
        )
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PredicateKey {
    pub group: GroupRef,
    pub team: TeamId,
    pub kind: PredicateKind,
}

pub struct StandingsBuilder<'a> {
    registry: &'a Registry,
    totals: SeasonTotals,
    predicates: HashMap<PredicateKey, Lit>,
    comparisons: HashMap<(TeamId, TeamId, Comparison), Lit>,
}

impl<'a> StandingsBuilder<'a> {
    pub fn new(registry: &'a Registry, totals: SeasonTotals) -> Self {
        StandingsBuilder {
            registry,
            totals,
            predicates: HashMap::new(),
            comparisons: HashMap::new(),
        }
    }

    pub fn totals(&self) -> &SeasonTotals {
        &self.totals
    }

    pub fn cached(&self, key: &PredicateKey) -> Option<Lit> {
        self.predicates.get(key).copied()
    }

    pub fn cache_len(&self) -> usize {
        self.predicates.len()
    }

    /// Literal equivalent to `kind(group, team)`. Panics if a division kind
    /// is paired with a league group or the other way round.
    pub fn predicate(
        &mut self,
        enc: &mut Encoder,
        group: GroupRef,
        team: TeamId,
        kind: PredicateKind,
    ) -> Lit {
        let key = PredicateKey { group, team, kind };
        if let Some(lit) = self.predicates.get(&key) {
            return *lit;
        }
        assert_eq!(
            kind.is_division(),
            matches!(group, GroupRef::Division(_)),
            "predicate {} does not apply to {}",
            kind,
            group
        );

        let formula = match (group, kind) {
            (GroupRef::Division(d), PredicateKind::WinDivision) => {
                self.lead_division(enc, d, team, Comparison::Greater)
            }
            (GroupRef::Division(d), PredicateKind::WinOrTieDivision) => {
                self.lead_division(enc, d, team, Comparison::AtLeast)
            }
            (GroupRef::Division(d), PredicateKind::TieDivision) => self.at_least_not_strict(
                enc,
                GroupRef::Division(d),
                team,
                PredicateKind::WinOrTieDivision,
                PredicateKind::WinDivision,
            ),
            (GroupRef::League(l), PredicateKind::WinFirstWildcard) => {
                self.place_first_wildcard(enc, l, team, Comparison::Greater)
            }
            (GroupRef::League(l), PredicateKind::WinOrTieFirstWildcard) => {
                self.place_first_wildcard(enc, l, team, Comparison::AtLeast)
            }
            (GroupRef::League(l), PredicateKind::TieFirstWildcard) => self.at_least_not_strict(
                enc,
                GroupRef::League(l),
                team,
                PredicateKind::WinOrTieFirstWildcard,
                PredicateKind::WinFirstWildcard,
            ),
            (GroupRef::League(l), PredicateKind::WinSecondWildcard) => {
                self.place_second_wildcard(enc, l, team, Comparison::Greater)
            }
            (GroupRef::League(l), PredicateKind::WinOrTieSecondWildcard) => {
                self.place_second_wildcard(enc, l, team, Comparison::AtLeast)
            }
            (GroupRef::League(l), PredicateKind::TieSecondWildcard) => self.at_least_not_strict(
                enc,
                GroupRef::League(l),
                team,
                PredicateKind::WinOrTieSecondWildcard,
                PredicateKind::WinSecondWildcard,
            ),
            _ => unreachable!(),
        };

        let lit = enc.define(&formula);
        self.predicates.insert(key, lit);
        lit
    }

    fn compare(&mut self, enc: &mut Encoder, a: TeamId, b: TeamId, cmp: Comparison) -> Formula {
        let totals = &self.totals;
        let lit = *self
            .comparisons
            .entry((a, b, cmp))
            .or_insert_with(|| enc.define(&totals.compare(a, b, cmp)));
        Formula::lit(lit)
    }

    fn pred(&mut self, enc: &mut Encoder, group: GroupRef, team: TeamId, kind: PredicateKind) -> Formula {
        Formula::lit(self.predicate(enc, group, team, kind))
    }

    // `wide AND NOT strict`: at least level with the field, but not alone
    fn at_least_not_strict(
        &mut self,
        enc: &mut Encoder,
        group: GroupRef,
        team: TeamId,
        wide: PredicateKind,
        strict: PredicateKind,
    ) -> Formula {
        let wide = self.pred(enc, group, team, wide);
        let strict = self.pred(enc, group, team, strict);
        Formula::and([wide, Formula::not(strict)])
    }

    // For every other member `o` of the division: TotalWins(team) op TotalWins(o).
    // `team` need not belong to the division; the wildcard rules evaluate it
    // against every division of the league.
    fn lead_division(&mut self, enc: &mut Encoder, division: usize, team: TeamId, op: Comparison) -> Formula {
        let members: Vec<TeamId> = self.registry.divisions()[division].teams().collect();
        let mut rules = Vec::new();
        for other in members {
            if other == team {
                continue;
            }
            rules.push(self.compare(enc, team, other, op));
        }
        Formula::and(rules)
    }

    /// Escape clause shared by both wildcard rules: the division of `other`
    /// is the candidate's own division and the candidate is tied for that
    /// division's lead. It tests the candidate, not `other`.
    pub fn candidate_tied_in_division_of(&mut self, enc: &mut Encoder, team: TeamId, other: TeamId) -> Formula {
        let division = self.registry.division_of(other);
        if !division.contains(team) {
            return Formula::False;
        }
        let index = division.index;
        self.pred(enc, GroupRef::Division(index), team, PredicateKind::TieDivision)
    }

    fn not_any_division_winner(&mut self, enc: &mut Encoder, league: usize, team: TeamId) -> Vec<Formula> {
        let divisions = self.registry.leagues()[league].division_indices();
        divisions
            .map(|d| {
                let win = self.pred(enc, GroupRef::Division(d), team, PredicateKind::WinDivision);
                Formula::not(win)
            })
            .collect()
    }

    // Clauses common to both wildcard rules for one rival: the rival is the
    // candidate, wins its own division, trails the candidate, or the
    // candidate is tied in the rival's division.
    fn wildcard_escapes(&mut self, enc: &mut Encoder, team: TeamId, other: TeamId, op: Comparison) -> Vec<Formula> {
        let other_division = self.registry.division_of(other).index;
        vec![
            Formula::constant(other == team),
            self.pred(enc, GroupRef::Division(other_division), other, PredicateKind::WinDivision),
            self.compare(enc, team, other, op),
            self.candidate_tied_in_division_of(enc, team, other),
        ]
    }

    fn place_first_wildcard(&mut self, enc: &mut Encoder, league: usize, team: TeamId, op: Comparison) -> Formula {
        let mut rules = self.not_any_division_winner(enc, league, team);
        let rivals: Vec<TeamId> = self.registry.leagues()[league].teams().collect();
        for other in rivals {
            let escapes = self.wildcard_escapes(enc, team, other, op);
            rules.push(Formula::or(escapes));
        }
        Formula::and(rules)
    }

    fn place_second_wildcard(&mut self, enc: &mut Encoder, league: usize, team: TeamId, op: Comparison) -> Formula {
        let group = GroupRef::League(league);
        let mut rules = self.not_any_division_winner(enc, league, team);

        let first = self.pred(enc, group, team, PredicateKind::WinOrTieFirstWildcard);
        rules.push(Formula::not(first));

        let rivals: Vec<TeamId> = self.registry.leagues()[league].teams().collect();

        // At most four league teams strictly ahead
        let mut ahead = Vec::new();
        for &other in &rivals {
            if other != team {
                ahead.push(self.compare(enc, other, team, Comparison::Greater));
            }
        }
        let ahead: Vec<Lit> = ahead.iter().map(|f| enc.define(f)).collect();
        rules.push(Formula::lit(enc.at_most(&ahead, MAX_TEAMS_AHEAD_FOR_SECOND_WILDCARD)));

        for other in rivals {
            let mut escapes = self.wildcard_escapes(enc, team, other, op);
            escapes.push(self.pred(enc, group, other, PredicateKind::WinFirstWildcard));
            rules.push(Formula::or(escapes));
        }
        Formula::and(rules)
    }
}
