//! Propositional building blocks: a clause buffer with its own variable
//! manager, a small formula tree with Tseitin definitions, and sequential
//! counters for unary arithmetic.

use rustsat::instances::{BasicVarManager, Cnf, ManageVars};
use rustsat::types::{Clause, Lit};

/// Boolean formula over solver literals. The constructors fold constants,
/// so `Formula::and` of an empty list is `True` and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    True,
    False,
    Lit(Lit),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

impl Formula {
    pub fn constant(value: bool) -> Formula {
        if value {
            Formula::True
        } else {
            Formula::False
        }
    }

    pub fn lit(lit: Lit) -> Formula {
        Formula::Lit(lit)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(f: Formula) -> Formula {
        match f {
            Formula::True => Formula::False,
            Formula::False => Formula::True,
            Formula::Lit(l) => Formula::Lit(!l),
            Formula::Not(inner) => *inner,
            other => Formula::Not(Box::new(other)),
        }
    }

    pub fn and(parts: impl IntoIterator<Item = Formula>) -> Formula {
        let mut kept = Vec::new();
        for part in parts {
            match part {
                Formula::True => {}
                Formula::False => return Formula::False,
                Formula::And(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Formula::True,
            1 => kept.pop().unwrap_or(Formula::True),
            _ => Formula::And(kept),
        }
    }

    pub fn or(parts: impl IntoIterator<Item = Formula>) -> Formula {
        let mut kept = Vec::new();
        for part in parts {
            match part {
                Formula::False => {}
                Formula::True => return Formula::True,
                Formula::Or(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Formula::False,
            1 => kept.pop().unwrap_or(Formula::False),
            _ => Formula::Or(kept),
        }
    }

    pub fn implies(premise: Formula, conclusion: Formula) -> Formula {
        Formula::or([Formula::not(premise), conclusion])
    }
}

/// Owns variable numbering and buffers clauses until they are flushed into
/// a solver. Literal `top` is fixed true by a unit clause, so constants can
/// appear inside clauses without special cases.
pub struct Encoder {
    vars: BasicVarManager,
    pending: Cnf,
    top: Lit,
    n_clauses: usize,
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        let mut vars = BasicVarManager::default();
        let top = vars.new_var().pos_lit();
        let mut enc = Encoder {
            vars,
            pending: Cnf::new(),
            top,
            n_clauses: 0,
        };
        enc.add_unit(top);
        enc
    }

    pub fn new_lit(&mut self) -> Lit {
        self.vars.new_var().pos_lit()
    }

    pub fn add_unit(&mut self, a: Lit) {
        self.pending.add_unit(a);
        self.n_clauses += 1;
    }

    pub fn add_binary(&mut self, a: Lit, b: Lit) {
        self.pending.add_binary(a, b);
        self.n_clauses += 1;
    }

    pub fn add_ternary(&mut self, a: Lit, b: Lit, c: Lit) {
        self.pending.add_ternary(a, b, c);
        self.n_clauses += 1;
    }

    pub fn add_clause(&mut self, lits: &[Lit]) {
        let clause: Clause = lits.iter().copied().collect();
        self.pending.add_clause(clause);
        self.n_clauses += 1;
    }

    /// Hands over every clause added since the last call.
    pub fn take_pending(&mut self) -> Cnf {
        std::mem::replace(&mut self.pending, Cnf::new())
    }

    pub fn n_vars(&self) -> u32 {
        self.vars.n_used()
    }

    pub fn n_clauses(&self) -> usize {
        self.n_clauses
    }

    /// Assert `f` permanently.
    pub fn assert(&mut self, f: &Formula) {
        match f {
            Formula::True => {}
            Formula::And(parts) => {
                for part in parts {
                    self.assert(part);
                }
            }
            other => {
                let lit = self.define(other);
                self.add_unit(lit);
            }
        }
    }

    /// Tseitin: returns a literal equivalent to `f`. The defining clauses
    /// are satisfiable for any assignment of `f`'s inputs, so they can be
    /// added globally.
    pub fn define(&mut self, f: &Formula) -> Lit {
        match f {
            Formula::True => self.top,
            Formula::False => !self.top,
            Formula::Lit(l) => *l,
            Formula::Not(inner) => !self.define(inner),
            Formula::And(parts) => {
                let lits: Vec<Lit> = parts.iter().map(|p| self.define(p)).collect();
                let out = self.new_lit();
                // out => each part
                for &l in &lits {
                    self.add_binary(!out, l);
                }
                // all parts => out
                let mut clause: Vec<Lit> = lits.iter().map(|&l| !l).collect();
                clause.push(out);
                self.add_clause(&clause);
                out
            }
            Formula::Or(parts) => {
                let lits: Vec<Lit> = parts.iter().map(|p| self.define(p)).collect();
                let out = self.new_lit();
                // each part => out
                for &l in &lits {
                    self.add_binary(!l, out);
                }
                // out => some part
                let mut clause = lits;
                clause.push(!out);
                self.add_clause(&clause);
                out
            }
        }
    }

    /// Sequential counter. Returns `out` with `out[k] <=> at least k+1 of
    /// inputs are true`, for `k < min(bound, inputs.len())`. Inputs may
    /// repeat; a repeated literal counts once per occurrence.
    pub fn unary_count(&mut self, inputs: &[Lit], bound: usize) -> Vec<Lit> {
        let bound = bound.min(inputs.len());
        let top = self.top;

        // prev[k] <=> at least k of the inputs seen so far
        let mut prev: Vec<Lit> = std::iter::once(top)
            .chain(std::iter::repeat(!top).take(bound))
            .collect();

        for (i, &x) in inputs.iter().enumerate() {
            let mut next = Vec::with_capacity(bound + 1);
            next.push(top);
            for k in 1..=bound {
                if k > i + 1 {
                    next.push(!top);
                    continue;
                }
                let s = self.new_lit();
                // s <=> prev[k] OR (prev[k-1] AND x)
                self.add_binary(!prev[k], s);
                self.add_ternary(!prev[k - 1], !x, s);
                self.add_ternary(!s, prev[k], prev[k - 1]);
                self.add_ternary(!s, prev[k], x);
                next.push(s);
            }
            prev = next;
        }

        prev.into_iter().skip(1).collect()
    }

    /// Literal equivalent to "at most `n` of `lits` are true".
    pub fn at_most(&mut self, lits: &[Lit], n: usize) -> Lit {
        if n >= lits.len() {
            return self.top;
        }
        let counter = self.unary_count(lits, n + 1);
        !counter[n]
    }
}
