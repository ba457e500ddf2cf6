use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use scoreboard::backend::cache::{clear_cache, get_cache_path, CacheConfig};
use scoreboard::backend::{self, BackendClient, BackendError, SubmitOutcome};
use scoreboard::config::{self, Config};
use scoreboard::fetch::{self, Standings, View};
use scoreboard::golf::{self, GolfSession};
use scoreboard::output;
use scoreboard::ranking::{self, LeaderboardForm, ScoringPolicy};
use scoreboard::triggers::RefreshTriggers;
use scoreboard::tui::{self, App};

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_NOT_FOUND: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_DUPLICATE: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// List leaderboards (default if no subcommand)
    Boards {
        /// Include inactive leaderboards
        #[arg(long)]
        all: bool,
    },
    /// Print the ranked standings of a leaderboard
    Show {
        id: i64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Live view of a leaderboard
    Watch {
        id: i64,
        /// Override the auto-refresh interval (e.g. "10s", "2m")
        #[arg(long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,
    },
    /// Submit a team's score
    Submit {
        id: i64,
        #[arg(long)]
        team: String,
        #[arg(long, allow_hyphen_values = true)]
        score: String,
    },
    /// Create a leaderboard
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum, default_value_t = ScoringPolicy::PointsHigh)]
        scoring_type: ScoringPolicy,
        /// Column heading for scores (defaults to "Points" or "Time")
        #[arg(long)]
        score_label: Option<String>,
        /// Let a team overwrite its own score
        #[arg(long)]
        allow_updates: bool,
    },
    /// Change a leaderboard's settings
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        scoring_type: Option<ScoringPolicy>,
        #[arg(long)]
        score_label: Option<String>,
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        allow_updates: Option<bool>,
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        active: Option<bool>,
    },
    /// Delete a leaderboard and its entries
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Open a leaderboard's page in the browser
    Open { id: i64 },
    /// Fizz Buzz code-golf challenge
    Golf {
        #[command(subcommand)]
        command: GolfCommands,
    },
    /// Interactive config setup
    Init,
    /// Remove cached standings snapshots
    ClearCache,
}

#[derive(Subcommand, Debug)]
enum GolfCommands {
    /// Print the code-golf standings
    Show {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Live view of the code-golf standings
    Watch {
        #[arg(long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,
    },
    /// Start the clock for a team
    Start {
        #[arg(long)]
        category: u8,
        #[arg(long)]
        team: String,
    },
    /// Verify and submit a solution
    Submit {
        /// File containing the solution source
        #[arg(long)]
        solution: PathBuf,
        /// File containing the solution's captured output
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Tsv,
}

#[derive(Parser, Debug)]
#[command(name = "scoreboard")]
#[command(about = "Live leaderboards for hackathons and competitions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/scoreboard/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Do not read or write cached standings
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Input rejected before anything was sent
#[derive(Debug, Error)]
#[error("{}", .0.join("\n  "))]
struct Invalid(Vec<String>);

impl Invalid {
    fn one(msg: impl Into<String>) -> Self {
        Invalid(vec![msg.into()])
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<BackendError>() {
            return match e {
                BackendError::Unauthorized { .. } => EXIT_AUTH,
                BackendError::NotFound(_) => EXIT_NOT_FOUND,
                BackendError::DuplicateSubject { .. } => EXIT_DUPLICATE,
                BackendError::Network(_) | BackendError::Status { .. } | BackendError::Decode(_) => EXIT_NETWORK,
            };
        }
        if cause.downcast_ref::<Invalid>().is_some() {
            return EXIT_CONFIG;
        }
    }
    EXIT_CONFIG
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+); a provider
    // already installed by a dependency is fine too
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "scoreboard=debug" } else { "scoreboard=warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(scoreboard::stderr_buffer::BufferedStderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    let command = cli.command.unwrap_or(Commands::Boards { all: false });

    // Commands that need neither config nor network
    match &command {
        Commands::Init => {
            if let Err(e) = config::init::run_init_wizard(cli.config.clone()) {
                eprintln!("Error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::ClearCache => {
            let path = get_cache_path();
            if let Err(e) = clear_cache(&path) {
                eprintln!("Error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
            println!("Cache cleared ({})", path.display());
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    let config = match config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let cache = CacheConfig::new(!cli.no_cache);

    if let Err(e) = run(command, &config, &cache).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }

    std::process::exit(EXIT_SUCCESS);
}

fn connect(config: &Config) -> Result<BackendClient> {
    let (url, key) = config.backend_credentials().map_err(|e| Invalid::one(format!("{:#}", e)))?;
    backend::create_client(url, key, config.request_timeout())
}

async fn run(command: Commands, config: &Config, cache: &CacheConfig) -> Result<()> {
    match command {
        Commands::Boards { all } => list_boards(&connect(config)?, all).await,
        Commands::Show { id, format } => show(&connect(config)?, config, cache, View::Board(id), format).await,
        Commands::Watch { id, interval } => watch(connect(config)?, config, cache, View::Board(id), interval).await,
        Commands::Submit { id, team, score } => submit(&connect(config)?, config, id, &team, &score).await,
        Commands::Create {
            name,
            description,
            scoring_type,
            score_label,
            allow_updates,
        } => {
            let form = LeaderboardForm {
                name,
                description: description.unwrap_or_default(),
                scoring_type,
                score_label: score_label.unwrap_or_default(),
                allow_updates,
                is_active: true,
            };
            let draft = ranking::validate_leaderboard(&form).map_err(Invalid)?;
            let board = backend::create_leaderboard(&connect(config)?, &draft).await?;
            println!(
                "Created leaderboard {}: {} ({})",
                board.id,
                board.name,
                board.scoring_type.describe()
            );
            Ok(())
        }
        Commands::Edit {
            id,
            name,
            description,
            scoring_type,
            score_label,
            allow_updates,
            active,
        } => {
            let client = connect(config)?;
            let board = backend::get_leaderboard(&client, id).await?;

            // A label still at the old policy's default follows the new policy
            let label_is_default = board.score_label == board.scoring_type.default_label();
            let score_label = match (score_label, scoring_type) {
                (Some(label), _) => label,
                (None, Some(policy)) if label_is_default && policy != board.scoring_type => String::new(),
                (None, _) => board.score_label.clone(),
            };

            let form = LeaderboardForm {
                name: name.unwrap_or_else(|| board.name.clone()),
                description: description.unwrap_or_else(|| board.description.clone().unwrap_or_default()),
                scoring_type: scoring_type.unwrap_or(board.scoring_type),
                score_label,
                allow_updates: allow_updates.unwrap_or(board.allow_updates),
                is_active: active.unwrap_or(board.is_active),
            };
            let draft = ranking::validate_leaderboard(&form).map_err(Invalid)?;
            let updated = backend::update_leaderboard(&client, id, &draft).await?;
            println!("Updated leaderboard {}: {}", updated.id, updated.name);
            Ok(())
        }
        Commands::Delete { id, yes } => {
            let client = connect(config)?;
            let board = backend::get_leaderboard(&client, id).await?;
            if !yes && !confirm(&format!("Delete '{}' and all its entries?", board.name))? {
                println!("Aborted.");
                return Ok(());
            }
            backend::delete_leaderboard(&client, id).await?;
            println!("Deleted leaderboard {}: {}", board.id, board.name);
            Ok(())
        }
        Commands::Open { id } => {
            let site = config
                .site_url
                .as_deref()
                .ok_or_else(|| Invalid::one("site_url is not configured; add it to your config file"))?;
            let url = scoreboard::browser::board_url(site, id);
            scoreboard::browser::open_url(&url)?;
            println!("Opening leaderboard {} in browser: {}", id, url);
            Ok(())
        }
        Commands::Golf { command } => match command {
            GolfCommands::Show { format } => show(&connect(config)?, config, cache, View::Golf, format).await,
            GolfCommands::Watch { interval } => watch(connect(config)?, config, cache, View::Golf, interval).await,
            GolfCommands::Start { category, team } => golf_start(category, &team),
            GolfCommands::Submit { solution, output } => golf_submit(&connect(config)?, &solution, &output).await,
        },
        Commands::Init | Commands::ClearCache => Ok(()),
    }
}

async fn list_boards(client: &BackendClient, all: bool) -> Result<()> {
    let boards = backend::list_leaderboards(client, all).await?;
    let counts = futures::future::join_all(boards.iter().map(|b| backend::count_entries(client, b.id))).await;
    let rows: Vec<_> = boards
        .into_iter()
        .zip(counts)
        .map(|(board, count)| {
            let count = count
                .inspect_err(|e| warn!(leaderboard = board.id, "could not count entries: {}", e))
                .ok();
            (board, count)
        })
        .collect();

    println!("{}", output::format_board_list(&rows, output::should_use_colors()));
    Ok(())
}

fn print_standings(standings: &Standings, config: &Config, format: OutputFormat) {
    let now = Utc::now();
    let use_colors = output::should_use_colors();
    let text = match (standings, format) {
        (Standings::Board { leaderboard, entries }, OutputFormat::Table) => {
            let locale = output::resolve_locale(&config.locale);
            format!(
                "{}\n{}\n\n{}",
                leaderboard.name,
                leaderboard.scoring_type.describe(),
                output::format_board_table(leaderboard, entries, &locale, now, use_colors)
            )
        }
        (Standings::Board { entries, .. }, OutputFormat::Tsv) => output::format_board_tsv(entries),
        (Standings::Golf { submissions }, OutputFormat::Table) => {
            output::format_golf_table(submissions, now, use_colors)
        }
        (Standings::Golf { submissions }, OutputFormat::Tsv) => output::format_golf_tsv(submissions),
    };
    println!("{}", text);
}

/// One-shot standings. When the data service cannot be reached, fall back to
/// the last snapshot and say how old it is.
async fn show(client: &BackendClient, config: &Config, cache: &CacheConfig, view: View, format: OutputFormat) -> Result<()> {
    match fetch::fetch_and_rank(client, view, cache).await {
        Ok(standings) => {
            print_standings(&standings, config, format);
            Ok(())
        }
        Err(e) if e.is_not_found() => Err(e.into()),
        Err(e) => match fetch::load_last_known(view, cache) {
            Some((saved_at, standings)) => {
                eprintln!(
                    "Warning: {}. Showing cached standings from {}.",
                    e,
                    output::format_relative_age(saved_at, Utc::now()).to_lowercase()
                );
                print_standings(&standings, config, format);
                Ok(())
            }
            None => Err(e.into()),
        },
    }
}

async fn watch(
    client: BackendClient,
    config: &Config,
    cache: &CacheConfig,
    view: View,
    interval: Option<Duration>,
) -> Result<()> {
    let period = interval.unwrap_or_else(|| config.refresh_period());
    if period.is_zero() {
        return Err(Invalid::one("--interval must be longer than zero").into());
    }

    let subscription = backend::subscribe(&client, view.change_feed());
    let triggers = RefreshTriggers::start(period, Some(subscription));

    let mut app = App::new_loading(view, config, triggers.is_live());
    app.refresh_interval = period;
    if let Some((saved_at, standings)) = fetch::load_last_known(view, cache) {
        debug!(%saved_at, "starting from cached standings");
        app = app.with_last_known(saved_at, standings);
    }

    tui::run_tui(app, client, cache.clone(), triggers).await
}

async fn submit(client: &BackendClient, config: &Config, id: i64, team: &str, score: &str) -> Result<()> {
    let entry = ranking::validate_entry(team, score).map_err(Invalid)?;
    let board = backend::get_leaderboard(client, id).await?;
    if !board.is_active {
        return Err(Invalid::one(format!("Leaderboard '{}' is closed for submissions", board.name)).into());
    }

    let outcome = backend::submit_entry(client, &board, &entry).await?;
    let locale = output::resolve_locale(&config.locale);
    let shown = output::format_score(outcome.entry().score, board.scoring_type.metric(), &locale);
    match &outcome {
        SubmitOutcome::Created(e) => println!("Added {} with {} to {}", e.team_name, shown, board.name),
        SubmitOutcome::Saved(e) => println!("Saved {} for {} on {}", shown, e.team_name, board.name),
    }

    // Placement is informative only; the submit already succeeded
    let entries = backend::list_entries(client, id).await.unwrap_or_default();
    let total = entries.len();
    let ranked = ranking::rank_for_policy(entries, board.scoring_type);
    if let Some(place) = ranked.iter().find(|r| r.item.id == outcome.entry().id) {
        println!("Now ranked #{} of {}", place.rank, total);
    }
    Ok(())
}

fn golf_start(category: u8, team: &str) -> Result<()> {
    let (category, team_number) = ranking::validate_golf_start(category, team).map_err(Invalid)?;
    let session = GolfSession::new(category, team_number, Utc::now());
    golf::save_session(&golf::get_session_path(), &session)?;
    println!(
        "Clock started for cat-{}-team-{}. Print Fizz Buzz for 1 to 100 in as few characters as you can,",
        category, team_number
    );
    println!("then run `scoreboard golf submit --solution <file> --output <file>`.");
    Ok(())
}

async fn golf_submit(client: &BackendClient, solution: &Path, output_path: &Path) -> Result<()> {
    let session_path = golf::get_session_path();
    let session = golf::load_session(&session_path)?
        .ok_or_else(|| Invalid::one("No challenge in progress. Run `scoreboard golf start` first"))?;

    let code = std::fs::read_to_string(solution)
        .with_context(|| format!("Failed to read solution from {}", solution.display()))?;
    let captured = std::fs::read_to_string(output_path)
        .with_context(|| format!("Failed to read output from {}", output_path.display()))?;

    let row = golf::prepare_submission(&session, &code, &captured, Utc::now())
        .map_err(|mismatch| Invalid::one(format!("Output rejected: {}", mismatch)))?;
    let saved = backend::insert_submission(client, &row).await?;
    golf::clear_session(&session_path)?;

    let elapsed = Duration::from_secs(saved.solve_time_seconds.unwrap_or_default() as u64);
    println!(
        "Accepted for {}: {} characters, solved in {}",
        saved.team_label(),
        saved.character_count,
        humantime::format_duration(elapsed)
    );
    Ok(())
}

fn confirm(message: &str) -> Result<bool> {
    print!("{} [y/N]: ", message);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
