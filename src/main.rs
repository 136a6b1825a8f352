use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use league_desk::api::{build_router, AppState};
use league_desk::calculate::{
    audit_roster_stats, compute_standings, compute_top_assisters, compute_top_scorers,
    rebuild_roster_stats,
};
use league_desk::config::AppConfig;
use league_desk::models::{PlayerStat, Season, Team};
use league_desk::storage::{LeagueStore, StorageConfig, WriteBatch};

#[derive(Parser)]
#[command(name = "league-desk")]
#[command(about = "Football league standings, player statistics and result tracking")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./league.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error; overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// List seasons
    Seasons,

    /// Print a season's league table
    Standings {
        /// Season id or name
        #[arg(long)]
        season: String,
    },

    /// Print a season's top scorers
    Scorers {
        /// Season id or name
        #[arg(long)]
        season: String,

        /// Number of players to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a season's top assisters
    Assisters {
        /// Season id or name
        #[arg(long)]
        season: String,

        /// Number of players to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Compare roster counters against the recorded goal logs
    CheckStats,

    /// Recompute roster counters from the recorded goal logs
    RebuildStats {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting league-desk v{}", env!("CARGO_PKG_VERSION"));
    let store = LeagueStore::new(StorageConfig::new(config.data_dir.clone()));

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let app = build_router(AppState::new(config));
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Seasons => {
            let seasons = store.seasons()?;
            if seasons.is_empty() {
                println!("No seasons recorded.");
            }
            for season in &seasons {
                println!(
                    "{:<18} {:<28} {} .. {}  {:<9} {} rounds",
                    season.id.as_str(),
                    season.name,
                    season.start_date,
                    season.end_date,
                    season.status.to_string(),
                    season.rounds.len()
                );
            }
        }
        Commands::Standings { season } => {
            let season = find_season(&store, &season)?;
            let teams = store.teams_in(&season.id)?;
            let form_length = config.league.form_length;

            println!("{}\n", season.name);
            println!(
                "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}  Form",
                "Pos", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
            );
            for row in compute_standings(&season, &teams) {
                let form: String = row
                    .recent_form(form_length)
                    .iter()
                    .map(|f| f.to_string())
                    .collect();
                println!(
                    "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>+4} {:>4}  {}",
                    row.position,
                    row.team_name,
                    row.played,
                    row.won,
                    row.drawn,
                    row.lost,
                    row.goals_for,
                    row.goals_against,
                    row.goal_difference,
                    row.points,
                    form
                );
            }
        }
        Commands::Scorers { season, limit } => {
            let season = find_season(&store, &season)?;
            let teams = store.teams_in(&season.id)?;
            let players = compute_top_scorers(&season, &teams);
            print_leaderboard(&players, &teams, limit.unwrap_or(config.league.leaderboard_size));
        }
        Commands::Assisters { season, limit } => {
            let season = find_season(&store, &season)?;
            let teams = store.teams_in(&season.id)?;
            let players = compute_top_assisters(&season, &teams);
            print_leaderboard(&players, &teams, limit.unwrap_or(config.league.leaderboard_size));
        }
        Commands::CheckStats => {
            let discrepancies = audit_roster_stats(&store.seasons()?, &store.teams()?);
            if discrepancies.is_empty() {
                println!("All roster counters match the recorded results.");
            } else {
                for d in &discrepancies {
                    println!(
                        "{:<24} stored {}G {}A, expected {}G {}A",
                        d.player_name,
                        d.stored.goals,
                        d.stored.assists,
                        d.expected.goals,
                        d.expected.assists
                    );
                }
                bail!("{} roster counters out of sync", discrepancies.len());
            }
        }
        Commands::RebuildStats { dry_run } => {
            let (seasons, teams) = store.snapshot()?;
            let discrepancies = audit_roster_stats(&seasons, &teams);
            println!("Members to correct: {}", discrepancies.len());
            for d in &discrepancies {
                println!(
                    "  {:<24} {}G {}A -> {}G {}A",
                    d.player_name,
                    d.stored.goals,
                    d.stored.assists,
                    d.expected.goals,
                    d.expected.assists
                );
            }

            if dry_run {
                println!("\n(dry run - no data written to disk)");
            } else if !discrepancies.is_empty() {
                let rebuilt = rebuild_roster_stats(&seasons, &teams);
                store.apply(WriteBatch::new().put_teams(rebuilt))?;
                println!("Roster counters rebuilt.");
            }
        }
    }

    Ok(())
}

/// Look a season up by id, then by case-insensitive name.
fn find_season(store: &LeagueStore, key: &str) -> Result<Season> {
    let seasons = store.seasons()?;
    let mut matches: Vec<Season> = seasons
        .iter()
        .filter(|s| s.id.as_str() == key)
        .cloned()
        .collect();
    if matches.is_empty() {
        matches = seasons
            .into_iter()
            .filter(|s| s.name.eq_ignore_ascii_case(key))
            .collect();
    }

    match matches.len() {
        0 => bail!("season not found: {}", key),
        1 => Ok(matches.remove(0)),
        n => bail!("{} seasons are named {:?}; use the season id", n, key),
    }
}

fn print_leaderboard(players: &[PlayerStat], teams: &[Team], limit: usize) {
    if players.is_empty() {
        println!("No goals recorded yet.");
        return;
    }
    println!("{:>3}  {:<24} {:<18} {:>5} {:>7}", "#", "Player", "Team", "Goals", "Assists");
    for (i, p) in players.iter().take(limit).enumerate() {
        let team_name = teams
            .iter()
            .find(|t| t.id == p.team_id)
            .map_or(p.team_id.as_str(), |t| t.name.as_str());
        println!(
            "{:>3}  {:<24} {:<18} {:>5} {:>7}",
            i + 1,
            p.player_name,
            team_name,
            p.goals,
            p.assists
        );
    }
}
