pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::database::{manager, PgStore};

#[derive(Parser)]
#[command(name = "staff-portal")]
#[command(about = "Staff Portal CLI - schema bootstrap and staff account management")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the database tables if they do not exist")]
    Migrate,

    #[command(about = "User accounts and the staff flag")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let config = AppConfig::from_env()?;
    let pool = manager::connect(&config).await?;

    let result = match cli.command {
        Commands::Migrate => commands::migrate::handle(&pool, output_format).await,
        Commands::User { cmd } => {
            let store = PgStore::new(pool.clone());
            commands::user::handle(cmd, &store, output_format).await
        }
    };

    manager::close(pool).await;
    result
}
