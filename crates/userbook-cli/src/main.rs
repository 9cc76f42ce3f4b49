//! Userbook CLI
//!
//! Command-line interface for the user record store

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use userbook_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "userbook", version)]
#[command(about = "Userbook - store and browse user records", long_about = None)]
struct Cli {
    /// Database file
    #[arg(
        long,
        global = true,
        env = "USERBOOK_DB",
        default_value = ".userbook/users.db"
    )]
    db: PathBuf,

    /// Log output on stderr: pretty, json or off
    #[arg(long, global = true, env = "USERBOOK_LOG", default_value = "off")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a user
    Create(commands::create::CreateArgs),
    /// List every user, sorted by first name
    List(commands::list::ListArgs),
    /// Show one user
    Show(commands::show::ShowArgs),
    /// Overwrite a user's names, age and optionally email
    Update(commands::update::UpdateArgs),
    /// Delete a user
    Delete(commands::delete::DeleteArgs),
    /// List users aged 18 or more
    Adults(commands::list::ListArgs),
    /// Bring the database schema up to date (or to --to)
    Migrate(commands::migrate::MigrateArgs),
    /// Print build and schema versions
    Version,
    /// Interactive session with a live user list
    Shell,
}

fn init_logging(mode: &str) -> Result<(), Box<dyn std::error::Error>> {
    if mode.eq_ignore_ascii_case("off") {
        return Ok(());
    }
    let profile: Profile = mode.parse()?;
    logging_facility::init(profile);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&cli.log)?;
    tracing::debug!(db = %cli.db.display(), "userbook starting");

    match cli.command {
        Commands::Create(args) => commands::create::execute(args, &cli.db).await,
        Commands::List(args) => commands::list::execute(args, &cli.db).await,
        Commands::Show(args) => commands::show::execute(args, &cli.db).await,
        Commands::Update(args) => commands::update::execute(args, &cli.db).await,
        Commands::Delete(args) => commands::delete::execute(args, &cli.db).await,
        Commands::Adults(args) => commands::list::execute_adults(args, &cli.db).await,
        Commands::Migrate(args) => commands::migrate::execute(args, &cli.db),
        Commands::Version => commands::migrate::execute_version(&cli.db),
        Commands::Shell => commands::shell::execute(&cli.db).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
