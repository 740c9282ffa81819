use anyhow::bail;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::UserProfile;
use crate::database::{DatabaseManager, Store};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List all users")]
    List,

    #[command(about = "Grant admin access to the user(s) with this email")]
    Promote {
        #[arg(help = "Email address")]
        email: String,
    },

    #[command(about = "Revoke admin access from the user(s) with this email")]
    Demote {
        #[arg(help = "Email address")]
        email: String,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = DatabaseManager::open_store(&config.database).await?;
    execute(cmd, store.as_ref(), &output_format).await
}

/// Run a user command against an already opened store
pub async fn execute(cmd: UserCommands, store: &dyn Store, output_format: &OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List => {
            let users: Vec<UserProfile> = store.list_users().await?.into_iter().map(UserProfile::from).collect();

            if users.is_empty() {
                return output_empty_collection(output_format, "users", "No users found");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<37} {:<20} {:<30} {:<6} {}", "ID", "USERNAME", "EMAIL", "ADMIN", "CREATED");
                    println!("{}", "-".repeat(110));

                    for user in &users {
                        let admin = if user.is_admin { "yes" } else { "no" };
                        let created = user.created_at.format("%Y-%m-%d %H:%M").to_string();
                        println!("{:<37} {:<20} {:<30} {:<6} {}", user.id.to_string(), user.username, user.email, admin, created);
                    }
                }
            }
            Ok(())
        }
        UserCommands::Promote { email } => set_admin(store, &email, true, output_format).await,
        UserCommands::Demote { email } => set_admin(store, &email, false, output_format).await,
    }
}

async fn set_admin(store: &dyn Store, email: &str, is_admin: bool, output_format: &OutputFormat) -> anyhow::Result<()> {
    let touched = store.set_admin(email, is_admin).await?;
    if touched == 0 {
        bail!("No user with email '{}'", email);
    }

    let verb = if is_admin { "promoted to admin" } else { "demoted from admin" };
    output_success(
        output_format,
        &format!("User '{}' {}", email, verb),
        Some(json!({ "email": email, "isAdmin": is_admin, "updated": touched })),
    )
}
