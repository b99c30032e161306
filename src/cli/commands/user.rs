use anyhow::Context;
use clap::Subcommand;

use crate::auth::password::hash_password_with_cost;
use crate::cli::OutputFormat;
use crate::database::models::{NewUser, UserSummary};
use crate::database::{Store, StoreError};

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    #[command(about = "Create a user account")]
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        #[arg(long, help = "Grant portal access immediately")]
        staff: bool,
    },

    #[command(about = "Grant portal access to an existing user")]
    GrantStaff {
        #[arg(long)]
        email: String,
    },

    #[command(about = "Revoke portal access; outstanding tokens stop working on their next use")]
    RevokeStaff {
        #[arg(long)]
        email: String,
    },

    #[command(about = "Show a user")]
    Show {
        #[arg(long)]
        email: String,
    },
}

pub async fn handle(cmd: UserCommands, store: &dyn Store, output_format: OutputFormat) -> anyhow::Result<()> {
    let user = execute(cmd, store, bcrypt::DEFAULT_COST).await?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
        OutputFormat::Text => {
            println!("{:<6} {:<30} {:<20} {}", "ID", "EMAIL", "USERNAME", "STAFF");
            println!("{:<6} {:<30} {:<20} {}", user.id, user.email, user.username, user.is_staff);
        }
    }
    Ok(())
}

pub async fn execute(cmd: UserCommands, store: &dyn Store, bcrypt_cost: u32) -> anyhow::Result<UserSummary> {
    let user = match cmd {
        UserCommands::Create { email, username, password, staff } => {
            if password.len() < 8 {
                anyhow::bail!("password must be at least 8 characters");
            }
            let hashed_password =
                hash_password_with_cost(&password, bcrypt_cost).context("failed to hash password")?;

            let user = store
                .create_user(NewUser {
                    email: email.trim().to_string(),
                    username: username.trim().to_string(),
                    hashed_password,
                    is_staff: staff,
                })
                .await?;
            tracing::info!("Created user '{}' (staff={})", user.email, user.is_staff);
            user
        }
        UserCommands::GrantStaff { email } => store.set_staff(&email, true).await?,
        UserCommands::RevokeStaff { email } => store.set_staff(&email, false).await?,
        UserCommands::Show { email } => store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", email)))?,
    };

    Ok(UserSummary::from(&user))
}
