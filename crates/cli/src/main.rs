//! Vitrine CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! vitrine-cli migrate
//!
//! # Bootstrap the first admin (nobody can sign in until one exists)
//! vitrine-cli admin create -e claire@vitrine-immo.fr -n "Claire Martin" -r super
//!
//! # List or remove admins
//! vitrine-cli admin list
//! vitrine-cli admin remove -e claire@vitrine-immo.fr
//!
//! # Insert a demo agency with two agents
//! vitrine-cli seed
//! ```
//!
//! All commands read `DATABASE_URL` (a `.env` file is honoured).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vitrine-cli")]
#[command(author, version, about = "Vitrine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert demo agents and an agency
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`standard` or `super`)
        #[arg(short, long, default_value = "standard")]
        role: String,
    },
    /// List all admins
    List,
    /// Remove an admin by email
    Remove {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name, role } => {
                commands::admin::create(&email, &name, &role).await?;
            }
            AdminAction::List => commands::admin::list().await?,
            AdminAction::Remove { email } => commands::admin::remove(&email).await?,
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}
