use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

use pennant_sat::render::{render_json, render_table};
use pennant_sat::{EncodingStats, Error, Registry, Season, SeasonSolver, SolveConfig, TeamId};

/// Postseason elimination over every completion of the remaining schedule
#[derive(Parser, Debug)]
#[command(name = "pennant-sat")]
#[command(about = "SAT-based MLB postseason elimination engine", long_about = None)]
struct Cli {
    /// Log per-query solve counts
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct SolveArgs {
    /// Season file (JSON)
    season: PathBuf,

    /// Budget per solve call in milliseconds, 0 for none
    #[arg(long, env = "PENNANT_TIMEOUT_MS", default_value_t = 30_000)]
    timeout_ms: u64,

    /// Cap on any team's final win total; overrides the season file.
    /// Records that no completion can reach are only caught with a cap
    #[arg(long, env = "PENNANT_SEASON_GAMES")]
    season_games: Option<u32>,

    /// Print encoding statistics (also PENNANT_STATS)
    #[arg(long)]
    stats: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Which teams can still win, share or reach each postseason slot
    Solve {
        #[command(flatten)]
        args: SolveArgs,

        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Every final win total a team can still reach
    Range {
        #[command(flatten)]
        args: SolveArgs,

        /// Team abbreviation, e.g. NYY
        team: String,
    },

    /// One possible completion of the remaining schedule
    Witness {
        #[command(flatten)]
        args: SolveArgs,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Table,
    Json,
}

impl SolveArgs {
    fn config(&self, season: &Season) -> SolveConfig {
        SolveConfig {
            timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
            season_games: self.season_games.or(season.season_games),
        }
    }

    fn show_stats(&self) -> bool {
        self.stats || std::env::var("PENNANT_STATS").is_ok()
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let result = match &cli.command {
        Command::Solve { args, format } => solve_cmd(args, *format),
        Command::Range { args, team } => range_cmd(args, team),
        Command::Witness { args } => witness_cmd(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        match e {
            Error::Timeout { .. } => std::process::exit(2),
            _ => std::process::exit(1),
        }
    }
}

fn load(args: &SolveArgs) -> pennant_sat::Result<(Season, SolveConfig)> {
    let season = Season::load(&args.season)?;
    let config = args.config(&season);
    Ok((season, config))
}

fn solve_cmd(args: &SolveArgs, format: Format) -> pennant_sat::Result<()> {
    let (season, config) = load(args)?;
    let start = Instant::now();
    let mut solver = SeasonSolver::new(&season.registry, &season.counts, &season.recorded, &config)?;
    let results = solver.run()?;
    let elapsed = start.elapsed();

    match format {
        Format::Table => print!("{}", render_table(&season.registry, &results)),
        Format::Json => println!("{}", render_json(&season.registry, &results)?),
    }

    if args.show_stats() {
        print_stats(&solver.stats(), elapsed);
    }
    Ok(())
}

fn range_cmd(args: &SolveArgs, code: &str) -> pennant_sat::Result<()> {
    let (season, config) = load(args)?;
    let team = resolve_team(&season.registry, code)?;
    let start = Instant::now();
    let mut solver = SeasonSolver::new(&season.registry, &season.counts, &season.recorded, &config)?;
    let wins = solver.feasible_wins(team)?;
    let elapsed = start.elapsed();

    let registry = &season.registry;
    let label = format!(
        "{} ({}, {})",
        registry.label(team),
        registry.division_of(team).name,
        registry.league_of(team).name
    );
    match (wins.first(), wins.last()) {
        (Some(low), Some(high)) => {
            let values: Vec<String> = wins.iter().map(|w| w.to_string()).collect();
            println!("{}: {}..={} ({})", label, low, high, values.join(" "));
        }
        _ => println!("{}: no reachable total", label),
    }

    if args.show_stats() {
        print_stats(&solver.stats(), elapsed);
    }
    Ok(())
}

fn witness_cmd(args: &SolveArgs) -> pennant_sat::Result<()> {
    let (season, config) = load(args)?;
    let registry = &season.registry;
    let mut solver = SeasonSolver::new(registry, &season.counts, &season.recorded, &config)?;
    let completion = solver.witness()?;

    println!("Remaining games:");
    for ((winner, loser), won) in &completion.wins {
        if *won > 0 {
            println!("  {} beats {} x{}", registry.label(*winner), registry.label(*loser), won);
        }
    }
    println!("Final totals:");
    for division in registry.divisions() {
        println!("  {}", division.name);
        for team in division.teams() {
            let total = completion.totals.get(&team).copied().unwrap_or_default();
            println!("    {:<5} {}", registry.label(team), total);
        }
    }
    Ok(())
}

fn print_stats(stats: &EncodingStats, elapsed: Duration) {
    println!("\n=== ENCODING STATISTICS ===");
    println!("  Variables:          {}", stats.variables);
    println!("  Clauses:            {}", stats.clauses);
    println!("  Decision variables: {}", stats.decision_variables);
    println!("  Predicates:         {}", stats.predicates);
    println!("  Queries:            {}", stats.queries);
    println!("  Solve calls:        {}", stats.solve_calls);
    println!("  Solve time:         {:.3}ms", elapsed.as_secs_f64() * 1000.0);
}

/// Case-insensitive code lookup with a "Did you mean" hint on a miss.
fn resolve_team(registry: &Registry, code: &str) -> pennant_sat::Result<TeamId> {
    if let Some(id) = registry.by_code(code) {
        return Ok(id);
    }

    let input = code.to_lowercase();
    let mut best: Option<(&str, f64)> = None;
    for team in registry.teams() {
        let similarity = strsim::jaro_winkler(&input, &team.code.to_lowercase());
        if best.map_or(true, |(_, s)| similarity > s) {
            best = Some((team.code.as_str(), similarity));
        }
    }

    let mut message = format!("'{}'", code);
    // At least 60% similar
    if let Some((suggested, similarity)) = best {
        if similarity >= 0.6 {
            message.push_str(&format!(" (did you mean '{}'?)", suggested));
        }
    }
    Err(pennant_sat::InputError::UnknownTeam(message).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pennant_sat::{LeagueLayout, RegistryBuilder};

    fn registry() -> Registry {
        let mut builder = RegistryBuilder::new(LeagueLayout {
            teams_per_division: 2,
            divisions_per_league: 1,
        });
        builder
            .team(1, "NYY", "AL East", None)
            .team(2, "BOS", "AL East", None);
        builder.build().unwrap()
    }

    #[test]
    fn test_cli_parses_solve() {
        let cli = Cli::try_parse_from(["pennant-sat", "solve", "season.json", "--format", "json", "--timeout-ms", "0"])
            .unwrap();
        match cli.command {
            Command::Solve { args, format } => {
                assert_eq!(format, Format::Json);
                assert_eq!(args.timeout_ms, 0);
                assert_eq!(args.season, PathBuf::from("season.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let cli = Cli::try_parse_from(["pennant-sat", "witness", "s.json", "--timeout-ms", "0", "--season-games", "162"])
            .unwrap();
        let Command::Witness { args } = cli.command else {
            panic!("expected witness");
        };
        let season = Season::from_json(r#"{"layout": {"teams_per_division": 1, "divisions_per_league": 1},
            "teams": [{"id": 1, "abbreviation": "A", "division": "D", "wins": 0}]}"#)
        .unwrap();
        let config = args.config(&season);
        assert_eq!(config.timeout, None);
        assert_eq!(config.season_games, Some(162));
    }

    #[test]
    fn test_resolve_team_suggests_close_code() {
        let reg = registry();
        assert_eq!(resolve_team(&reg, "nyy").unwrap(), TeamId(0));
        let err = resolve_team(&reg, "NYM").unwrap_err().to_string();
        assert!(err.contains("did you mean 'NYY'"), "{err}");
        let err = resolve_team(&reg, "zzz").unwrap_err().to_string();
        assert!(!err.contains("did you mean"), "{err}");
    }
}
