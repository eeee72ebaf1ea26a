//! Merging per-group enumeration results into category sets.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::registry::{Registry, TeamId};
use crate::standings::{GroupRef, PredicateKind};

pub const MAKE_POSTSEASON: &str = "make_postseason";

/// One enumeration result for a single group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    pub group: GroupRef,
    pub kind: PredicateKind,
    pub teams: BTreeSet<TeamId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryResults {
    categories: BTreeMap<String, BTreeSet<TeamId>>,
    outcomes: Vec<GroupOutcome>,
}

impl CategoryResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `teams` into the category named after `kind`.
    pub fn record(&mut self, group: GroupRef, kind: PredicateKind, teams: BTreeSet<TeamId>) {
        self.categories
            .entry(kind.name().to_string())
            .or_default()
            .extend(teams.iter().copied());
        self.outcomes.push(GroupOutcome { group, kind, teams });
    }

    /// Recompute `make_postseason` as the union of every other category.
    pub fn finish(&mut self) {
        self.categories.remove(MAKE_POSTSEASON);
        let all: BTreeSet<TeamId> = self.categories.values().flatten().copied().collect();
        self.categories.insert(MAKE_POSTSEASON.to_string(), all);
    }

    pub fn get(&self, category: &str) -> Option<&BTreeSet<TeamId>> {
        self.categories.get(category)
    }

    pub fn make_postseason(&self) -> Option<&BTreeSet<TeamId>> {
        self.get(MAKE_POSTSEASON)
    }

    /// Categories in output order: division kinds, wildcard kinds, then the
    /// union.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &BTreeSet<TeamId>)> + '_ {
        PredicateKind::DIVISION
            .into_iter()
            .chain(PredicateKind::LEAGUE)
            .map(PredicateKind::name)
            .chain(std::iter::once(MAKE_POSTSEASON))
            .filter_map(move |name| self.categories.get_key_value(name))
            .map(|(name, teams)| (name.as_str(), teams))
    }

    pub fn outcomes(&self) -> &[GroupOutcome] {
        &self.outcomes
    }

    /// Category name to team codes, for rendering.
    pub fn to_codes(&self, registry: &Registry) -> BTreeMap<String, Vec<String>> {
        self.categories
            .iter()
            .map(|(name, teams)| {
                let codes = teams.iter().map(|&t| registry.label(t)).collect();
                (name.clone(), codes)
            })
            .collect()
    }
}

/// Serialised form: category name to sorted team ids.
impl Serialize for CategoryResults {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.categories.serialize(serializer)
    }
}
