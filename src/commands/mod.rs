//! Command-line surface
//!
//! - `login` / `signup` / `logout`: account session
//! - `list`, `add`, `edit`, `delete`, `stats`, `export`: the owner's journal
//! - `share` / `view`: public link and read-only view of someone else's journal
//! - `assets`: offline app-shell cache

pub mod assets;
pub mod auth;
pub mod share;
pub mod stats;
pub mod trades;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::app::{JournalApp, JournalError};
use crate::offline::AssetWorker;
use crate::view::{describe, Locale};

#[derive(Parser)]
#[command(name = "g-trade-journal", version, about = "G Trade Journal client")]
pub struct Cli {
    /// Config file, defaults to ./journal.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true, default_value_t = false)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login(Credentials),
    /// Create an account
    Signup(Credentials),
    /// Sign out and forget the stored session
    Logout,
    /// Show the trade table and stats
    List,
    /// Record a trade
    Add(TradeArgs),
    /// Change the trade at a table row
    Edit {
        /// Row number as shown by `list`
        row: usize,
        #[command(flatten)]
        fields: TradeArgs,
    },
    /// Delete the trade at a table row
    Delete {
        row: usize,
    },
    /// Aggregate stats and equity curve
    Stats {
        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Public read-only access to your journal
    Share {
        #[command(subcommand)]
        action: ShareAction,
    },
    /// Open someone's shared journal
    View {
        /// User id or share link
        #[arg(long)]
        user: String,
    },
    /// Write the trade list as CSV
    Export {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Offline app-shell cache
    Assets {
        #[command(subcommand)]
        action: AssetsAction,
    },
}

#[derive(Args)]
pub struct Credentials {
    #[arg(long)]
    pub email: String,
    /// Read from stdin when omitted
    #[arg(long)]
    pub password: Option<String>,
}

/// Trade fields; on `edit` only the given ones change
#[derive(Args, Default)]
pub struct TradeArgs {
    #[arg(long)]
    pub pair: Option<String>,
    /// YYYY-MM-DD, today when omitted on `add`
    #[arg(long)]
    pub date: Option<String>,
    /// Asia, Frankfurt, London or "New York"
    #[arg(long)]
    pub session: Option<String>,
    /// Long or Short
    #[arg(long)]
    pub direction: Option<String>,
    #[arg(long)]
    pub setup: Option<String>,
    /// Chart link
    #[arg(long)]
    pub url: Option<String>,
    /// Risk in percent
    #[arg(long)]
    pub risk: Option<String>,
    /// Reward multiple
    #[arg(long)]
    pub rr: Option<String>,
    /// Take, Stop or BE
    #[arg(long)]
    pub result: Option<String>,
}

#[derive(Subcommand)]
pub enum ShareAction {
    /// Whether the journal is public
    Status,
    /// Make the journal public
    On,
    /// Make the journal private
    Off,
    /// Print the share link
    Link,
}

#[derive(Subcommand)]
pub enum AssetsAction {
    /// Precache the app shell
    Install,
    /// Drop caches of older versions
    Activate,
    /// Fetch one resource through the cache
    Get {
        url: String,
        /// Treat as a page navigation
        #[arg(long, default_value_t = false)]
        navigate: bool,
    },
}

/// Everything a command handler may touch
pub struct Context {
    pub app: JournalApp,
    pub worker: AssetWorker,
    pub assume_yes: bool,
}

impl Context {
    pub fn locale(&self) -> Locale {
        self.app.locale()
    }

    /// Localized error for the user
    pub fn fail(&self, error: JournalError) -> anyhow::Error {
        log::debug!("Command failed: {:?}", error);
        anyhow::anyhow!(describe(self.locale(), &error))
    }

    pub fn prompt(&self) -> Box<dyn crate::view::Prompt> {
        if self.assume_yes {
            Box::new(crate::view::FixedAnswer(true))
        } else {
            Box::new(crate::view::StdinPrompt)
        }
    }
}

pub async fn dispatch(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Login(creds) => auth::login(ctx, creds).await,
        Commands::Signup(creds) => auth::signup(ctx, creds).await,
        Commands::Logout => auth::logout(ctx).await,
        Commands::List => trades::list(ctx).await,
        Commands::Add(fields) => trades::add(ctx, fields).await,
        Commands::Edit { row, fields } => trades::edit(ctx, row, fields).await,
        Commands::Delete { row } => trades::delete(ctx, row).await,
        Commands::Stats { json } => stats::show(ctx, json).await,
        Commands::Share { action } => share::run(ctx, action).await,
        Commands::View { user } => share::view(ctx, &user).await,
        Commands::Export { csv } => trades::export(ctx, &csv).await,
        Commands::Assets { action } => assets::run(ctx, action).await,
    }
}
