//! Text and JSON views of category results.

use crate::error::Result;
use crate::registry::Registry;
use crate::results::CategoryResults;

/// Grid with one column per team and `O`/`X` per category:
///
/// ```text
/// ┌─────────────────────┬─────┬─────┐
/// │                     │ NYY │ BOS │
/// │ win_division        │  O  │  X  │
/// └─────────────────────┴─────┴─────┘
/// ```
pub fn render_table(registry: &Registry, results: &CategoryResults) -> String {
    let labels: Vec<String> = registry.teams().iter().map(|t| registry.label(t.id)).collect();
    let cell_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(1).max(1) + 2;
    let title_width = results
        .categories()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0)
        .max(8)
        + 2;

    let rule = |left: char, mid: char, right: char| {
        let mut line = String::new();
        line.push(left);
        line.push_str(&"─".repeat(title_width));
        for _ in &labels {
            line.push(mid);
            line.push_str(&"─".repeat(cell_width));
        }
        line.push(right);
        line.push('\n');
        line
    };

    let mut out = rule('┌', '┬', '┐');

    out.push('│');
    out.push_str(&" ".repeat(title_width));
    for label in &labels {
        out.push('│');
        out.push_str(&center(label, cell_width));
    }
    out.push_str("│\n");
    out.push_str(&rule('├', '┼', '┤'));

    for (name, teams) in results.categories() {
        out.push('│');
        out.push_str(&format!(" {:<width$}", name, width = title_width - 1));
        for team in registry.teams() {
            out.push('│');
            let mark = if teams.contains(&team.id) { "O" } else { "X" };
            out.push_str(&center(mark, cell_width));
        }
        out.push_str("│\n");
    }

    out.push_str(&rule('└', '┴', '┘'));
    out
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// Category name to team labels.
pub fn render_json(registry: &Registry, results: &CategoryResults) -> Result<String> {
    Ok(serde_json::to_string_pretty(&results.to_codes(registry))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::registry;
    use crate::registry::{LeagueLayout, TeamId};
    use crate::standings::{GroupRef, PredicateKind};
    use std::collections::BTreeSet;

    fn sample() -> (Registry, CategoryResults) {
        let reg = registry(
            LeagueLayout {
                teams_per_division: 2,
                divisions_per_league: 1,
            },
            1,
        );
        let mut results = CategoryResults::new();
        results.record(
            GroupRef::Division(0),
            PredicateKind::WinDivision,
            BTreeSet::from([TeamId(1)]),
        );
        results.finish();
        (reg, results)
    }

    #[test]
    fn test_table_marks_members() {
        let (reg, results) = sample();
        let table = render_table(&reg, &results);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("T0") && lines[1].contains("T1"));
        assert!(lines[3].starts_with("│ win_division"));
        assert!(lines[3].trim_end_matches('│').ends_with("O  "));
        assert_eq!(lines[3].matches('X').count(), 1);
        assert!(lines[4].starts_with("│ make_postseason"));
        // All rows line up
        let widths: BTreeSet<usize> = lines.iter().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 1);
    }

    #[test]
    fn test_json_uses_codes() {
        let (reg, results) = sample();
        let json = render_json(&reg, &results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["win_division"], serde_json::json!(["T1"]));
        assert_eq!(value["make_postseason"], serde_json::json!(["T1"]));
    }
}
