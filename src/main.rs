//! Leaderboard Timeline CLI
//!
//! Usage:
//!   leaderboard-timeline timeline --game sm64 --category wkpoo02r --var 'e8m7em86=9qj7z0oq' --top 10
//!   leaderboard-timeline runs --game sm64 --category wkpoo02r --format csv --output runs.csv
//!   leaderboard-timeline levels --game sm64
//!   leaderboard-timeline categories --game sm64 [--level <level id>]
//!
//! Environment Variables:
//!   LEADERBOARD_CONFIG - Path to TOML config file
//!   SRC_API_BASE, SRC_USER_AGENT, SRC_TIMEOUT_SECS, SRC_RATE_* - see config.rs
//!   TIMELINE_TOP - default top-N (0 keeps everyone)
//!   RUST_LOG - log filter (default: leaderboard_timeline=info)

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaderboard_timeline::{
    config::Config,
    models::{Category, LeaderboardSelection, VariableConstraint},
    pipeline::{listing_report, timeline_report},
    scrapers::SpeedrunClient,
    sink::{publish, FileSink, OutputFormat},
    timeline::{Cell, Table},
};

#[derive(Parser, Debug)]
#[command(name = "leaderboard-timeline")]
#[command(about = "Personal-best progression tables from speedrun.com leaderboards")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, env = "LEADERBOARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tsv, global = true)]
    format: OutputFormat,

    /// Write the table to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Personal-best progression, one row per participant, one column per date
    Timeline {
        #[command(flatten)]
        board: BoardArgs,

        /// Keep the N best times per date (0 keeps everyone; defaults to config)
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// Every run on the leaderboard, one row each
    Runs {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Levels of a game
    Levels {
        #[arg(short, long)]
        game: String,
    },
    /// Full-game categories (or a level's categories) with sub-category values
    Categories {
        #[arg(short, long)]
        game: String,

        #[arg(short, long)]
        level: Option<String>,
    },
}

#[derive(Args, Debug)]
struct BoardArgs {
    /// Game id or abbreviation
    #[arg(short, long)]
    game: String,

    /// Category id
    #[arg(short, long)]
    category: String,

    /// Level id (individual-level leaderboards)
    #[arg(short, long)]
    level: Option<String>,

    /// Sub-category constraint, repeatable
    #[arg(long = "var", value_name = "VARIABLE=VALUE")]
    vars: Vec<VariableConstraint>,
}

impl BoardArgs {
    async fn selection(&self, client: &SpeedrunClient) -> Result<LeaderboardSelection> {
        let game = client
            .game(&self.game)
            .await
            .with_context(|| format!("Unknown game '{}'", self.game))?;
        info!(game = %game.names.international, id = %game.id, "🔎 Resolved game");

        Ok(LeaderboardSelection {
            game_id: game.id,
            level_id: self.level.clone(),
            category_id: self.category.clone(),
            variables: self
                .vars
                .iter()
                .map(|c| (c.variable_id.clone(), c.value_id.clone()))
                .collect(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let client = SpeedrunClient::from_config(&config)?;
    let sink = FileSink::new(cli.output.clone(), cli.format);

    let (range, table) = match &cli.command {
        Command::Timeline { board, top } => {
            let selection = board.selection(&client).await?;
            let top = match top {
                Some(0) => None,
                Some(n) => Some(*n),
                None => config.top_n(),
            };
            let report = timeline_report(&client, &selection, top).await?;
            info!(
                fetched = report.fetched,
                kept = report.kept,
                rows = report.table.body().len(),
                "📊 Timeline ready"
            );
            ("Timeline", report.table)
        }
        Command::Runs { board } => {
            let selection = board.selection(&client).await?;
            let report = listing_report(&client, &selection).await?;
            info!(fetched = report.fetched, kept = report.kept, "Run listing ready");
            ("Runs", report.table)
        }
        Command::Levels { game } => {
            let game = client.game(game).await?;
            let levels = client.levels(&game.id).await?;
            let mut rows = vec![vec![Cell::text("id"), Cell::text("name")]];
            rows.extend(
                levels
                    .into_iter()
                    .map(|l| vec![Cell::Text(l.id), Cell::Text(l.name)]),
            );
            ("Levels", Table { rows })
        }
        Command::Categories { game, level } => {
            let categories = match level {
                Some(level_id) => client.level_categories(level_id).await?,
                None => {
                    let game = client.game(game).await?;
                    client.full_game_categories(&game.id).await?
                }
            };
            ("Categories", categories_table(&categories))
        }
    };

    publish(&sink, range, &table).await
}

/// One row per category x sub-category value; categories without
/// sub-categories get a single row with the variable columns absent.
fn categories_table(categories: &[Category]) -> Table {
    let mut rows = vec![[
        "category id",
        "category",
        "variable id",
        "variable",
        "value id",
        "value",
    ]
    .iter()
    .map(|h| Cell::text(*h))
    .collect::<Vec<_>>()];

    for category in categories {
        let head = [
            Cell::text(category.id.as_str()),
            Cell::text(category.name.as_str()),
        ];
        let mut any = false;
        for variable in category.subcategory_variables() {
            for (value_id, value) in &variable.values.values {
                any = true;
                let mut row = head.to_vec();
                row.extend([
                    Cell::text(variable.id.as_str()),
                    Cell::text(variable.name.as_str()),
                    Cell::text(value_id.as_str()),
                    Cell::text(value.label.as_str()),
                ]);
                rows.push(row);
            }
        }
        if !any {
            let mut row = head.to_vec();
            row.extend(std::iter::repeat(Cell::Absent).take(4));
            rows.push(row);
        }
    }

    Table { rows }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaderboard_timeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
