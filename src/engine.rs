//! Season-wide driver: builds the base constraints once, checks them, then
//! enumerates every (group, predicate) pair into category results.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use rustsat::types::Lit;

use crate::encoding::Encoder;
use crate::enumerate::{SolveOutcome, SolverContext};
use crate::error::{Error, Result};
use crate::matchups::{MatchupCounts, MatchupSpace};
use crate::registry::{Registry, TeamId};
use crate::results::CategoryResults;
use crate::standings::{GroupRef, PredicateKind, StandingsBuilder};
use crate::wins::{RecordedWins, SeasonTotals};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveConfig {
    /// Budget per solve call; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Upper bound on any team's final win total. Without it every split
    /// of the remaining games is a valid completion, so
    /// `Error::NoValidCompletion` can only be raised when this is set.
    pub season_games: Option<u32>,
}

impl Default for SolveConfig {
    fn default() -> Self {
        SolveConfig {
            timeout: Some(DEFAULT_TIMEOUT),
            season_games: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingStats {
    pub variables: u32,
    pub clauses: usize,
    pub decision_variables: usize,
    pub predicates: usize,
    pub queries: u64,
    pub solve_calls: u64,
}

/// One satisfying completion of the season.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonCompletion {
    /// `(winner, loser)` to games won in the remaining schedule.
    pub wins: BTreeMap<(TeamId, TeamId), i64>,
    pub totals: BTreeMap<TeamId, i64>,
}

pub struct SeasonSolver<'r> {
    registry: &'r Registry,
    enc: Encoder,
    space: MatchupSpace,
    standings: StandingsBuilder<'r>,
    win_values: HashMap<(TeamId, i64), Lit>,
    ctx: SolverContext,
}

impl<'r> SeasonSolver<'r> {
    /// Validates the inputs, builds the shared constraints and checks that
    /// at least one season completion exists.
    pub fn new(
        registry: &'r Registry,
        counts: &MatchupCounts,
        recorded: &RecordedWins,
        config: &SolveConfig,
    ) -> Result<Self> {
        counts.validate(registry)?;
        recorded.validate(registry)?;

        let mut enc = Encoder::new();
        let space = MatchupSpace::build(registry, counts, &mut enc)?;
        let totals = SeasonTotals::build(registry, &space, recorded, &mut enc)?;
        if let Some(games) = config.season_games {
            totals.cap(games, &mut enc);
        }

        let mut ctx = SolverContext::new(config.timeout);
        if ctx.check_base(&mut enc)? == SolveOutcome::Unsat {
            log::warn!("base constraints are unsatisfiable");
            return Err(Error::NoValidCompletion);
        }
        log::info!(
            "base constraints satisfiable: {} teams, {} decision variables, {} vars, {} clauses",
            registry.len(),
            space.len(),
            enc.n_vars(),
            enc.n_clauses()
        );

        Ok(SeasonSolver {
            registry,
            enc,
            space,
            standings: StandingsBuilder::new(registry, totals),
            win_values: HashMap::new(),
            ctx,
        })
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    fn group_teams(&self, group: GroupRef) -> (String, Vec<TeamId>) {
        match group {
            GroupRef::Division(d) => {
                let division = &self.registry.divisions()[d];
                (division.name.clone(), division.teams().collect())
            }
            GroupRef::League(l) => {
                let league = &self.registry.leagues()[l];
                (league.name.clone(), league.teams().collect())
            }
        }
    }

    /// Every team of `group` for which `kind` holds in some completion.
    pub fn enumerate(&mut self, group: GroupRef, kind: PredicateKind) -> Result<BTreeSet<TeamId>> {
        let (name, teams) = self.group_teams(group);
        let candidates: Vec<(TeamId, Lit)> = teams
            .into_iter()
            .map(|t| (t, self.standings.predicate(&mut self.enc, group, t, kind)))
            .collect();
        let label = format!("{} {}", name, kind);
        self.ctx.enumerate(&mut self.enc, &label, &candidates)
    }

    /// Runs every division and wildcard query and merges the results.
    pub fn run(&mut self) -> Result<CategoryResults> {
        let mut results = CategoryResults::new();

        for d in 0..self.registry.divisions().len() {
            for kind in PredicateKind::DIVISION {
                let group = GroupRef::Division(d);
                let teams = self.enumerate(group, kind)?;
                results.record(group, kind, teams);
            }
        }
        for l in 0..self.registry.leagues().len() {
            for kind in PredicateKind::LEAGUE {
                let group = GroupRef::League(l);
                let teams = self.enumerate(group, kind)?;
                results.record(group, kind, teams);
            }
        }
        results.finish();

        let stats = self.stats();
        log::info!(
            "enumeration finished: {} queries, {} solve calls, {} teams can make the postseason",
            stats.queries,
            stats.solve_calls,
            results.make_postseason().map_or(0, |s| s.len())
        );
        Ok(results)
    }

    /// Every final win total `team` can reach.
    pub fn feasible_wins(&mut self, team: TeamId) -> Result<BTreeSet<i64>> {
        let total = self.standings.totals().get(team);
        let mut candidates = Vec::new();
        for v in total.min()..=total.max() {
            let lit = *self
                .win_values
                .entry((team, v))
                .or_insert_with(|| self.enc.define(&total.exactly(v)));
            candidates.push((v, lit));
        }
        let label = format!("{} final wins", self.registry.label(team));
        self.ctx.enumerate(&mut self.enc, &label, &candidates)
    }

    /// Decodes one model of the base constraints.
    pub fn witness(&mut self) -> Result<SeasonCompletion> {
        if self.ctx.check_base(&mut self.enc)? == SolveOutcome::Unsat {
            return Err(Error::NoValidCompletion);
        }

        let mut completion = SeasonCompletion::default();
        for var in self.space.iter() {
            let mut won = 0;
            for &lit in &var.lits {
                if self.ctx.lit_is_true(lit)? {
                    won += 1;
                }
            }
            completion.wins.insert((var.winner, var.loser), won);
        }
        for team in self.registry.teams() {
            let total = self.standings.totals().get(team.id);
            let mut value = total.recorded;
            for &lit in &total.ge {
                if self.ctx.lit_is_true(lit)? {
                    value += 1;
                }
            }
            completion.totals.insert(team.id, value);
        }
        Ok(completion)
    }

    pub fn stats(&self) -> EncodingStats {
        let solve = self.ctx.stats();
        EncodingStats {
            variables: self.enc.n_vars(),
            clauses: self.enc.n_clauses(),
            decision_variables: self.space.len(),
            predicates: self.standings.cache_len(),
            queries: solve.queries,
            solve_calls: solve.solve_calls,
        }
    }
}
