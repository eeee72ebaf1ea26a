//! Team registry: dense ordinal ids grouped into divisions and leagues.
//!
//! Ids are assigned once, after sorting teams by division name, so every
//! division and league is a contiguous id range. Group membership is pure
//! id arithmetic from then on.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use serde::Serialize;

use crate::error::InputError;

/// Ordinal team id, `0..N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TeamId(pub usize);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered team. Equality, ordering and hashing use `id` only; the
/// external id and code are presentation data.
#[derive(Debug, Clone)]
pub struct Team {
    pub id: TeamId,
    pub external_id: u32,
    pub code: String,
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Team {}

impl PartialOrd for Team {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Team {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Team {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeagueLayout {
    pub teams_per_division: usize,
    pub divisions_per_league: usize,
}

impl LeagueLayout {
    pub fn teams_per_league(&self) -> usize {
        self.teams_per_division * self.divisions_per_league
    }
}

impl Default for LeagueLayout {
    // MLB: six divisions of five, two leagues of three divisions
    fn default() -> Self {
        LeagueLayout {
            teams_per_division: 5,
            divisions_per_league: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Division {
    pub index: usize,
    pub name: String,
    teams: Range<usize>,
}

impl Division {
    pub fn contains(&self, team: TeamId) -> bool {
        self.teams.contains(&team.0)
    }

    pub fn teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.teams.clone().map(TeamId)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct League {
    pub index: usize,
    pub name: String,
    teams: Range<usize>,
    divisions: Range<usize>,
}

impl League {
    pub fn contains(&self, team: TeamId) -> bool {
        self.teams.contains(&team.0)
    }

    pub fn teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.teams.clone().map(TeamId)
    }

    /// Indices into `Registry::divisions`.
    pub fn division_indices(&self) -> Range<usize> {
        self.divisions.clone()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    layout: LeagueLayout,
    teams: Vec<Team>,
    divisions: Vec<Division>,
    leagues: Vec<League>,
    by_external: HashMap<u32, TeamId>,
}

impl Registry {
    pub fn layout(&self) -> LeagueLayout {
        self.layout
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(id.0)
    }

    pub fn contains(&self, id: TeamId) -> bool {
        id.0 < self.teams.len()
    }

    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    pub fn leagues(&self) -> &[League] {
        &self.leagues
    }

    pub fn by_external_id(&self, external_id: u32) -> Option<TeamId> {
        self.by_external.get(&external_id).copied()
    }

    pub fn by_code(&self, code: &str) -> Option<TeamId> {
        self.teams
            .iter()
            .find(|t| t.code.eq_ignore_ascii_case(code))
            .map(|t| t.id)
    }

    /// Panics if `id` is not registered; callers validate ids at the edge.
    pub fn division_of(&self, id: TeamId) -> &Division {
        &self.divisions[id.0 / self.layout.teams_per_division]
    }

    pub fn league_of(&self, id: TeamId) -> &League {
        &self.leagues[id.0 / self.layout.teams_per_league()]
    }

    /// True when no two teams share a display code.
    pub fn codes_unique(&self) -> bool {
        let mut seen = HashSet::new();
        self.teams.iter().all(|t| seen.insert(t.code.as_str()))
    }

    /// Display label for a team: its code, or the ordinal id if codes collide.
    pub fn label(&self, id: TeamId) -> String {
        match self.team(id) {
            Some(team) if self.codes_unique() => team.code.clone(),
            _ => id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct TeamEntry {
    external_id: u32,
    code: String,
    division: String,
    league: Option<String>,
}

/// Collects raw team metadata, then assigns ids in one explicit step.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    layout: LeagueLayout,
    entries: Vec<TeamEntry>,
}

impl RegistryBuilder {
    pub fn new(layout: LeagueLayout) -> Self {
        RegistryBuilder {
            layout,
            entries: Vec::new(),
        }
    }

    pub fn team(
        &mut self,
        external_id: u32,
        code: impl Into<String>,
        division: impl Into<String>,
        league: Option<String>,
    ) -> &mut Self {
        self.entries.push(TeamEntry {
            external_id,
            code: code.into(),
            division: division.into(),
            league,
        });
        self
    }

    pub fn build(&self) -> Result<Registry, InputError> {
        let layout = self.layout;
        if layout.teams_per_division == 0 || layout.divisions_per_league == 0 {
            return Err(InputError::InvalidLayout {
                teams_per_division: layout.teams_per_division,
                divisions_per_league: layout.divisions_per_league,
            });
        }
        if self.entries.is_empty() {
            return Err(InputError::EmptyRegistry);
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.external_id) {
                return Err(InputError::DuplicateExternalId(entry.external_id));
            }
        }

        // Stable sort: teams keep their input order within a division
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.division.cmp(&b.division));

        let mut divisions = Vec::new();
        for chunk in entries.chunk_by(|a, b| a.division == b.division) {
            if chunk.len() != layout.teams_per_division {
                return Err(InputError::DivisionSize {
                    name: chunk[0].division.clone(),
                    expected: layout.teams_per_division,
                    found: chunk.len(),
                });
            }
            let first = divisions.len() * layout.teams_per_division;
            divisions.push(Division {
                index: divisions.len(),
                name: chunk[0].division.clone(),
                teams: first..first + chunk.len(),
            });
        }

        if divisions.len() % layout.divisions_per_league != 0 {
            return Err(InputError::IncompleteLeague {
                divisions: divisions.len(),
                per_league: layout.divisions_per_league,
            });
        }

        let per_league = layout.teams_per_league();
        let mut leagues = Vec::new();
        for (index, group) in entries.chunks(per_league).enumerate() {
            let declared = group.iter().find_map(|e| e.league.clone());
            if let Some(expected) = &declared {
                for entry in group {
                    if let Some(found) = &entry.league {
                        if found != expected {
                            return Err(InputError::MixedLeague {
                                division: entry.division.clone(),
                                expected: expected.clone(),
                                found: found.clone(),
                            });
                        }
                    }
                }
            }
            let first_division = index * layout.divisions_per_league;
            leagues.push(League {
                index,
                name: declared.unwrap_or_else(|| format!("League {}", index + 1)),
                teams: index * per_league..(index + 1) * per_league,
                divisions: first_division..first_division + layout.divisions_per_league,
            });
        }

        let teams: Vec<Team> = entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| Team {
                id: TeamId(i),
                external_id: e.external_id,
                code: e.code,
            })
            .collect();
        let by_external = teams.iter().map(|t| (t.external_id, t.id)).collect();

        log::debug!(
            "registry built: {} teams, {} divisions, {} leagues",
            teams.len(),
            divisions.len(),
            leagues.len()
        );

        Ok(Registry {
            layout,
            teams,
            divisions,
            leagues,
            by_external,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a registry of `divisions` divisions with codes `T0`, `T1`, ...
    /// in id order.
    pub(crate) fn registry(layout: LeagueLayout, divisions: usize) -> Registry {
        let mut builder = RegistryBuilder::new(layout);
        for d in 0..divisions {
            for i in 0..layout.teams_per_division {
                let n = d * layout.teams_per_division + i;
                builder.team(100 + n as u32, format!("T{}", n), format!("D{:02}", d), None);
            }
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_ids_follow_division_name_order() {
        let layout = LeagueLayout {
            teams_per_division: 2,
            divisions_per_league: 1,
        };
        let mut builder = RegistryBuilder::new(layout);
        builder
            .team(1, "NYM", "NL East", None)
            .team(2, "NYY", "AL East", None)
            .team(3, "ATL", "NL East", None)
            .team(4, "BOS", "AL East", None);
        let reg = builder.build().unwrap();

        let codes: Vec<&str> = reg.teams().iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes, vec!["NYY", "BOS", "NYM", "ATL"]);
        assert_eq!(reg.divisions()[0].name, "AL East");
        assert_eq!(reg.by_external_id(3), Some(TeamId(3)));
        assert_eq!(reg.by_code("bos"), Some(TeamId(1)));
    }

    #[test]
    fn test_group_membership_is_contiguous() {
        let reg = registry(LeagueLayout::default(), 6);
        assert_eq!(reg.len(), 30);
        assert_eq!(reg.leagues().len(), 2);
        assert_eq!(reg.division_of(TeamId(7)).index, 1);
        assert_eq!(reg.league_of(TeamId(14)).index, 0);
        assert_eq!(reg.league_of(TeamId(15)).index, 1);
        assert_eq!(reg.leagues()[1].division_indices(), 3..6);
        assert!(reg.divisions()[5].contains(TeamId(29)));
        assert!(!reg.divisions()[5].contains(TeamId(24)));
    }

    #[test]
    fn test_division_size_is_checked() {
        let mut builder = RegistryBuilder::new(LeagueLayout::default());
        builder.team(1, "A", "East", None).team(2, "B", "East", None);
        assert_eq!(
            builder.build().unwrap_err(),
            InputError::DivisionSize {
                name: "East".to_string(),
                expected: 5,
                found: 2
            }
        );
    }

    #[test]
    fn test_mixed_league_is_rejected() {
        let layout = LeagueLayout {
            teams_per_division: 1,
            divisions_per_league: 2,
        };
        let mut builder = RegistryBuilder::new(layout);
        builder
            .team(1, "A", "AL East", Some("AL".to_string()))
            .team(2, "B", "AL West", Some("NL".to_string()));
        assert!(matches!(
            builder.build(),
            Err(InputError::MixedLeague { .. })
        ));
    }

    #[test]
    fn test_zero_sized_layout_is_rejected() {
        for (teams, divisions) in [(1, 0), (0, 1)] {
            let mut builder = RegistryBuilder::new(LeagueLayout {
                teams_per_division: teams,
                divisions_per_league: divisions,
            });
            builder.team(1, "A", "East", None);
            assert!(matches!(
                builder.build(),
                Err(InputError::InvalidLayout { .. })
            ));
        }
    }

    #[test]
    fn test_duplicate_external_id() {
        let mut builder = RegistryBuilder::new(LeagueLayout {
            teams_per_division: 2,
            divisions_per_league: 1,
        });
        builder.team(7, "A", "East", None).team(7, "B", "East", None);
        assert_eq!(builder.build().unwrap_err(), InputError::DuplicateExternalId(7));
    }

    #[test]
    fn test_labels_fall_back_to_ids_on_code_collision() {
        let mut builder = RegistryBuilder::new(LeagueLayout {
            teams_per_division: 2,
            divisions_per_league: 1,
        });
        builder.team(1, "NY", "East", None).team(2, "NY", "East", None);
        let reg = builder.build().unwrap();
        assert!(!reg.codes_unique());
        assert_eq!(reg.label(TeamId(1)), "#1");
    }

    #[test]
    fn test_team_equality_uses_id_only() {
        let a = Team {
            id: TeamId(3),
            external_id: 1,
            code: "A".to_string(),
        };
        let b = Team {
            id: TeamId(3),
            external_id: 2,
            code: "B".to_string(),
        };
        assert_eq!(a, b);
    }
}
