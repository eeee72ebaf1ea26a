//! Existential enumeration with blocking over one incremental solver.
//!
//! A query opens a scope (an activation literal), asserts "the query value
//! is one of these candidates and its predicate holds", and then alternates
//! solve / read value / block value until the solver reports UNSAT. The
//! scope guard retracts every query clause on drop, so nothing leaks into
//! the next query even when a solve call errors or times out.

use std::collections::BTreeSet;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rustsat::solvers::{Interrupt, InterruptSolver, Solve, SolveIncremental, SolverResult};
use rustsat::types::{Lit, TernaryVal};
use rustsat_minisat::core::Minisat;

use crate::encoding::Encoder;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    Sat,
    Unsat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    pub solve_calls: u64,
    pub queries: u64,
}

/// The shared solver. Base constraints are flushed into it from the
/// encoder and never retracted; query constraints live in scopes.
pub struct SolverContext {
    solver: Minisat,
    timeout: Option<Duration>,
    stats: SolveStats,
}

impl SolverContext {
    pub fn new(timeout: Option<Duration>) -> Self {
        SolverContext {
            solver: Minisat::default(),
            timeout,
            stats: SolveStats::default(),
        }
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// Moves every clause the encoder has buffered into the solver.
    pub fn flush(&mut self, enc: &mut Encoder) -> Result<()> {
        self.solver.add_cnf(enc.take_pending())?;
        Ok(())
    }

    /// Solve the base constraints alone.
    pub fn check_base(&mut self, enc: &mut Encoder) -> Result<SolveOutcome> {
        self.flush(enc)?;
        let (solver, timeout) = (&mut self.solver, self.timeout);
        self.stats.solve_calls += 1;
        solve_with_budget(solver, &[], timeout, "base constraints")
    }

    pub fn lit_is_true(&self, lit: Lit) -> Result<bool> {
        Ok(self.solver.lit_val(lit)? == TernaryVal::True)
    }

    /// Every candidate value whose literal can be true together with the
    /// base constraints. Candidate literals must already be defined in
    /// `enc`.
    pub fn enumerate<T: Copy + Ord>(
        &mut self,
        enc: &mut Encoder,
        label: &str,
        candidates: &[(T, Lit)],
    ) -> Result<BTreeSet<T>> {
        let act = enc.new_lit();
        let selectors: Vec<Lit> = candidates.iter().map(|_| enc.new_lit()).collect();
        self.flush(enc)?;
        self.stats.queries += 1;

        let timeout = self.timeout;
        let mut found = BTreeSet::new();
        let mut calls = 0u64;
        {
            let mut scope = Scope::open(&mut self.solver, act);

            // The query value is exactly one candidate, and its predicate holds
            scope.exactly_one(&selectors)?;
            for (&sel, &(_, pred)) in selectors.iter().zip(candidates) {
                scope.add(&[!sel, pred])?;
            }

            loop {
                calls += 1;
                match scope.solve(timeout, label)? {
                    SolveOutcome::Unsat => break,
                    SolveOutcome::Sat => {
                        let Some(index) = scope.first_true(&selectors)? else {
                            return Err(Error::Solver(anyhow::anyhow!(
                                "model for {} selects no candidate",
                                label
                            )));
                        };
                        found.insert(candidates[index].0);
                        log::trace!("{}: candidate {} admissible", label, index);
                        scope.add(&[!selectors[index]])?;
                    }
                }
            }
        }
        self.stats.solve_calls += calls;
        log::debug!("{}: {} admissible after {} solve calls", label, found.len(), calls);
        Ok(found)
    }
}

/// Query scope. Clauses added through it are guarded by `!act`; dropping it
/// adds the unit `!act`, which satisfies all of them for good.
pub struct Scope<'s> {
    solver: &'s mut Minisat,
    act: Lit,
}

impl<'s> Scope<'s> {
    pub fn open(solver: &'s mut Minisat, act: Lit) -> Self {
        Scope { solver, act }
    }

    pub fn add(&mut self, lits: &[Lit]) -> Result<()> {
        let clause: rustsat::types::Clause = std::iter::once(!self.act).chain(lits.iter().copied()).collect();
        self.solver.add_clause(clause)?;
        Ok(())
    }

    pub fn exactly_one(&mut self, lits: &[Lit]) -> Result<()> {
        self.add(lits)?;
        for i in 0..lits.len() {
            for j in i + 1..lits.len() {
                self.add(&[!lits[i], !lits[j]])?;
            }
        }
        Ok(())
    }

    pub fn solve(&mut self, timeout: Option<Duration>, label: &str) -> Result<SolveOutcome> {
        let act = self.act;
        solve_with_budget(self.solver, &[act], timeout, label)
    }

    fn first_true(&self, lits: &[Lit]) -> Result<Option<usize>> {
        for (i, &lit) in lits.iter().enumerate() {
            if self.solver.lit_val(lit)? == TernaryVal::True {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.solver.add_unit(!self.act) {
            log::warn!("failed to retract query scope: {}", e);
        }
    }
}

// A watchdog thread interrupts the solver once the budget runs out. If it
// fired at all the call counts as timed out, even when the solver managed
// to answer first.
fn solve_with_budget(
    solver: &mut Minisat,
    assumps: &[Lit],
    timeout: Option<Duration>,
    label: &str,
) -> Result<SolveOutcome> {
    let result = match timeout {
        None => solver.solve_assumps(assumps)?,
        Some(limit) => {
            let mut interrupter = solver.interrupter();
            let (done_tx, done_rx) = mpsc::channel::<()>();
            let watchdog = thread::spawn(move || match done_rx.recv_timeout(limit) {
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    interrupter.interrupt();
                    true
                }
                _ => false,
            });
            let result = solver.solve_assumps(assumps);
            let _ = done_tx.send(());
            let fired = watchdog.join().unwrap_or(true);
            if fired {
                return Err(Error::Timeout {
                    query: label.to_string(),
                    limit,
                });
            }
            result?
        }
    };

    match result {
        SolverResult::Sat => Ok(SolveOutcome::Sat),
        SolverResult::Unsat => Ok(SolveOutcome::Unsat),
        SolverResult::Interrupted => Err(Error::Timeout {
            query: label.to_string(),
            limit: timeout.unwrap_or_default(),
        }),
    }
}
