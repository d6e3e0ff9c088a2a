mod commands;
mod render;
mod services;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use daybook_core::date_range::{parse_date, parse_month};
use daybook_core::reminder::{TaskPriority, TaskStatus};
use daybook_core::source::Platform;
use daybook_core::tasks::{SortOrder, TaskFilter, TaskSort, TaskSortKey};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::services::Services;

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Today's events, your month and your reminders, kept current as time passes")]
struct Cli {
    /// Platform to behave as (web, android, ios). Defaults to config, then the build target
    #[arg(long, global = true)]
    platform: Option<Platform>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one day's events, classified against the current time
    Today {
        /// Day to show instead of today (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Print the day panel as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a month grid and its events
    Month {
        /// Month to show instead of the current one (YYYY-MM)
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// Keep the day panel on screen and refresh it in the background
    Watch,
    /// Show the week containing a day, Sunday first
    Week {
        /// Day inside the week to show (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List open reminders
    Tasks {
        /// Only tasks with this status (todo, in-progress); repeatable
        #[arg(long)]
        status: Vec<TaskStatus>,

        /// Only tasks with this priority (low, medium, high); repeatable
        #[arg(long)]
        priority: Vec<TaskPriority>,

        /// Only tasks carrying this tag; repeatable, any tag matches
        #[arg(long)]
        tag: Vec<String>,

        /// Sort by created, due, priority or title
        #[arg(long, default_value = "created")]
        sort: TaskSortKey,

        /// asc or desc. Defaults to the natural order of the sort key
        #[arg(long)]
        order: Option<SortOrder>,
    },
    /// List sample notes, pinned first
    Notes {
        /// Only notes whose title or content contains this text
        #[arg(long)]
        search: Option<String>,

        /// Only notes carrying this tag; repeatable, any tag matches
        #[arg(long)]
        tag: Vec<String>,
    },
    /// List the calendars the source can read
    Calendars,
    /// Manage the Google Calendar session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Show whether a token is stored and when it expires
    Status,
    /// Store a token exported from a browser sign-in
    Import {
        /// JSON token file, or "-" for stdin
        file: Option<PathBuf>,
    },
    /// Remove the stored token
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Watch => "info",
        _ => "warn",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}={}", env!("CARGO_CRATE_NAME"), default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let services = Services::load(cli.platform)?;

    match cli.command {
        Commands::Today { date, json } => commands::today::run(&services, date, json).await,
        Commands::Month { month } => commands::month::run(&services, month).await,
        Commands::Watch => commands::watch::run(&services).await,
        Commands::Week { date } => commands::week::run(&services, date).await,
        Commands::Tasks {
            status,
            priority,
            tag,
            sort,
            order,
        } => {
            let filter = TaskFilter {
                statuses: status,
                priorities: priority,
                tags: tag,
            };
            let sort = TaskSort {
                key: sort,
                order: order.unwrap_or_else(|| sort.default_order()),
            };
            commands::tasks::run(&services, filter, sort).await
        }
        Commands::Notes { search, tag } => commands::notes::run(&services, search, tag),
        Commands::Calendars => commands::calendars::run(&services).await,
        Commands::Auth { command } => match command {
            AuthCommands::Status => commands::auth::status(&services),
            AuthCommands::Import { file } => commands::auth::import(&services, file.as_deref()),
            AuthCommands::Logout => commands::auth::logout(&services),
        },
    }
}
