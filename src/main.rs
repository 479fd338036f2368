use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use team_pricing::model::group::to_count;
use team_pricing::{
    even_assignment, quote, GroupComposition, LogFormat, LoggingSettings, OptimizationResult,
    Optimizer, Price, Settings, Strategy, TeamQuote,
};

#[derive(Parser)]
#[command(name = "team-pricing")]
#[command(about = "Price a party split across independently billed teams")]
#[command(version)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cheapest and dearest split over all assignments
    Optimize {
        #[command(flatten)]
        counts: Counts,
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },
    /// Price the evenly balanced split
    Even {
        #[command(flatten)]
        counts: Counts,
    },
}

#[derive(Args)]
struct Counts {
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    adults: i64,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    children: i64,
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    teams: i64,
    /// Add-on hours, overrides the settings
    #[arg(long, allow_negative_numbers = true)]
    hours: Option<i64>,
    /// Minimum people per team, overrides the settings
    #[arg(long, allow_negative_numbers = true)]
    min_occupancy: Option<i64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Auto,
    Exhaustive,
    Parallel,
    Dynamic,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => Strategy::Auto,
            StrategyArg::Exhaustive => Strategy::Exhaustive,
            StrategyArg::Parallel => Strategy::Parallel,
            StrategyArg::Dynamic => Strategy::Dynamic,
        }
    }
}

#[derive(Serialize)]
struct EvenQuote {
    total: Price,
    teams: Vec<TeamQuote>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("could not load settings")?;
    init_tracing(&settings.logging);

    match cli.command {
        Commands::Optimize { counts, strategy } => {
            let (group, teams) = apply(&counts, &mut settings)?;
            if let Some(strategy) = strategy {
                settings.search.strategy = strategy.into();
            }
            info!(adults = group.adults, children = group.children, teams, "optimizing");
            let result = Optimizer::from_settings(settings.pricing, &settings.search)
                .optimize(group, teams)
                .context("could not price the party")?;
            match cli.format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => print_result(&result),
            }
        }
        Commands::Even { counts } => {
            let (group, teams) = apply(&counts, &mut settings)?;
            let assignment = even_assignment(group, teams)?;
            let (total, teams) = quote(&assignment, group, &settings.pricing)
                .context("could not price the even split")?;
            let even = EvenQuote { total, teams };
            match cli.format {
                OutputFormat::Json => print_json(&even)?,
                OutputFormat::Text => print_teams("even", even.total, &even.teams),
            }
        }
    }
    Ok(())
}

/// Validates the raw counts and folds the overrides into `settings`.
fn apply(counts: &Counts, settings: &mut Settings) -> Result<(GroupComposition, u32)> {
    let group = GroupComposition::try_new(counts.adults, counts.children)?;
    let teams = to_count("teams", counts.teams)?;
    if let Some(hours) = counts.hours {
        settings.pricing.add_on_hours = to_count("hours", hours)?;
    }
    if let Some(occupancy) = counts.min_occupancy {
        settings.pricing.min_team_occupancy = to_count("min-occupancy", occupancy)?;
    }
    Ok((group, teams))
}

fn init_tracing(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter);
    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_result(result: &OptimizationResult) {
    print_teams("min", result.min_price, &result.min_breakdown);
    print_teams("max", result.max_price, &result.max_breakdown);
    println!("over {} assignments", result.candidates);
}

fn print_teams(label: &str, total: Price, teams: &[TeamQuote]) {
    println!("{label}: {total}");
    for (index, team) in teams.iter().enumerate() {
        println!(
            "  team {}: {} adults, {} children -> {}",
            index + 1,
            team.adults,
            team.children,
            team.price
        );
    }
}
