//! CLI administration tool for link-store.
//!
//! Manages users, short links and visit history directly in the store.
//!
//! # Usage
//!
//! ```bash
//! # Create a user (prompts for the password)
//! cargo run --bin admin -- user create alice --admin
//!
//! # Create a short link owned by alice
//! cargo run --bin admin -- link create https://example.com --owner alice
//!
//! # List alice's links, newest first
//! cargo run --bin admin -- link list --owner alice
//!
//! # Show today's visits of a link
//! cargo run --bin admin -- history list abc123
//!
//! # Repair leftovers of interrupted writes
//! cargo run --bin admin -- store reconcile
//! ```
//!
//! # Environment Variables
//!
//! - `REDIS_URL` or `REDIS_HOST` (required): see [`link_store::config`]
//!
//! Pass `--memory` to run against a throwaway in-memory store instead.

use link_store::application::services::{HistoryService, LinkService, UserService};
use link_store::config::{self, Config};
use link_store::domain::entities::{LinkPatch, NewUser, Role, ShortLink};
use link_store::domain::repositories::KeyValueStore;
use link_store::infrastructure::kv::{MemoryStore, RedisStore};
use link_store::telemetry;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Password};
use std::sync::Arc;

/// CLI tool for managing link-store data.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use an empty in-memory store instead of Redis
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage short links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Inspect visit history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Store maintenance
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Create {
        username: String,

        /// Grant the administrator role
        #[arg(long)]
        admin: bool,
    },

    /// Show a user
    Show { username: String },

    /// Check a user's password
    Verify { username: String },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Create a short link with a fresh id
    Create {
        url: String,

        /// Owner username
        #[arg(short, long)]
        owner: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Show a short link
    Show { id: String },

    /// List short links, newest first
    List {
        /// Only list links of this owner
        #[arg(short, long)]
        owner: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u64,

        #[arg(long, default_value_t = 20)]
        page_size: u64,
    },

    /// Update the target, description or state of a short link
    Update {
        id: String,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,
    },

    /// Delete a short link with its history
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List visits of a short link, most recent first
    List {
        id: String,

        /// Day bucket as YYYYMMDD (default: today)
        #[arg(long)]
        day: Option<String>,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Check the store connection
    Check,

    /// Remove dangling index entries and purge orphaned history
    Reconcile,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.memory {
        let config = Config {
            redis_url: String::new(),
            log_level: "warn".to_string(),
            log_format: "text".to_string(),
            link_id_max_attempts: 0,
        };
        telemetry::init_tracing(&config);
        println!("{}", "⚠️  Using in-memory store, nothing is persisted".yellow());
        return run(cli.command, Arc::new(MemoryStore::new()), &config).await;
    }

    let config = config::load_from_env()?;
    telemetry::init_tracing(&config);
    config.print_summary();

    let store = RedisStore::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;

    run(cli.command, Arc::new(store), &config).await
}

/// Dispatches a command against `store`.
async fn run<S: KeyValueStore>(command: Commands, store: Arc<S>, config: &Config) -> Result<()> {
    match command {
        Commands::User { action } => handle_user_action(action, UserService::new(store)).await,
        Commands::Link { action } => {
            let links = LinkService::new(store).with_max_id_attempts(config.link_id_max_attempts);
            handle_link_action(action, links).await
        }
        Commands::History { action } => {
            handle_history_action(action, LinkService::new(store.clone()), HistoryService::new(store))
                .await
        }
        Commands::Store { action } => handle_store_action(action, store).await,
    }
}

async fn handle_user_action<S: KeyValueStore>(
    action: UserAction,
    users: UserService<S>,
) -> Result<()> {
    match action {
        UserAction::Create { username, admin } => {
            println!("{}", "👤 Create User".bright_blue().bold());
            println!();

            let password = Password::new()
                .with_prompt("Password")
                .with_confirmation("Repeat password", "Passwords do not match")
                .interact()?;

            let role = if admin {
                Role::Administrator
            } else {
                Role::Standard
            };

            let user = users
                .create(NewUser::new(username, password, role))
                .await
                .context("Failed to create user")?;

            println!();
            println!("{}", "✅ User created successfully!".green().bold());
            print_user_role(&user.username, user.is_admin());
        }
        UserAction::Show { username } => {
            let user = users.load(&username).await?;

            println!("{}", "👤 User".bright_blue().bold());
            println!();
            print_user_role(&user.username, user.is_admin());
            println!(
                "  Created:  {}",
                user.created_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .bright_black()
            );
            println!();
        }
        UserAction::Verify { username } => {
            let password = Password::new().with_prompt("Password").interact()?;

            match users.authenticate(&username, &password).await {
                Ok(_) => println!("{}", "✅ Password OK".green().bold()),
                Err(e) => println!("{} {}", "❌".red(), e.to_string().red()),
            }
        }
    }

    Ok(())
}

fn print_user_role(username: &str, is_admin: bool) {
    let role = if is_admin {
        "administrator".bright_magenta()
    } else {
        "standard".normal()
    };
    println!("  Username: {}", username.cyan());
    println!("  Role:     {}", role);
}

async fn handle_link_action<S: KeyValueStore>(
    action: LinkAction,
    links: LinkService<S>,
) -> Result<()> {
    match action {
        LinkAction::Create {
            url,
            owner,
            description,
        } => {
            let link = links
                .create(ShortLink::new(url, description, owner))
                .await
                .context("Failed to create short link")?;

            println!("{}", "✅ Short link created!".green().bold());
            println!();
            print_link(&link);
        }
        LinkAction::Show { id } => {
            let link = links.load(&id).await?;
            print_link(&link);
        }
        LinkAction::List {
            owner,
            page,
            page_size,
        } => {
            list_links(&links, owner.as_deref(), page, page_size).await?;
        }
        LinkAction::Update {
            id,
            url,
            description,
            enable,
            disable,
        } => {
            let mut link = links.load(&id).await?;

            let patch = LinkPatch {
                url: url.unwrap_or_else(|| link.url.clone()),
                description: description.unwrap_or_else(|| link.description.clone()),
                is_enabled: if enable {
                    true
                } else if disable {
                    false
                } else {
                    link.is_enabled
                },
            };

            links
                .update(&mut link, patch)
                .await
                .context("Failed to update short link")?;

            println!("{}", "✅ Short link updated!".green().bold());
            println!();
            print_link(&link);
        }
        LinkAction::Delete { id, yes } => {
            let link = links.load(&id).await?;
            print_link(&link);

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Delete this link and all of its history?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            links.delete(&link).await;

            println!("{}", "✅ Short link deleted".green().bold());
        }
    }

    Ok(())
}

fn print_link(link: &ShortLink) {
    let state = if link.is_enabled {
        "ENABLED".green()
    } else {
        "DISABLED".red()
    };

    println!("  ID:          {}", link.id.bright_yellow().bold());
    println!("  URL:         {}", link.url.cyan());
    if !link.description.is_empty() {
        println!("  Description: {}", link.description);
    }
    println!("  Owner:       {}", link.created_by);
    println!("  State:       {}", state);
    if let Some(updated_at) = link.updated_at {
        println!(
            "  Updated:     {}",
            updated_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
        );
    }
    println!();
}

/// Prints one page of links as a table.
///
/// ```text
/// 🔗 Short Links
///
///   ID      Owner        Updated            URL
///   ──────────────────────────────────────────────────────────
///   abc123  alice        2024-01-15 10:30   https://example.com
/// ```
async fn list_links<S: KeyValueStore>(
    links: &LinkService<S>,
    owner: Option<&str>,
    page: u64,
    page_size: u64,
) -> Result<()> {
    println!("{}", "🔗 Short Links".bright_blue().bold());
    println!();

    let page_links = links.list(owner, page, page_size).await?;
    let total = links.count(owner).await?;

    if page_links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<7} {:<12} {:<18} {}",
        "ID".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Updated".bright_white().bold(),
        "URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for link in &page_links {
        let updated = link
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let url = if link.is_enabled {
            link.url.normal()
        } else {
            link.url.bright_black()
        };

        println!(
            "  {:<7} {:<12} {:<18} {}",
            link.id.bright_yellow(),
            link.created_by.cyan(),
            updated.bright_black(),
            url
        );
    }

    println!();
    println!(
        "  Page {} · {} of {} indexed",
        page,
        page_links.len().to_string().bright_white().bold(),
        total.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn handle_history_action<S: KeyValueStore>(
    action: HistoryAction,
    links: LinkService<S>,
    history: HistoryService<S>,
) -> Result<()> {
    match action {
        HistoryAction::List { id, day } => {
            let link = links.load(&id).await?;

            let visits = match day {
                Some(day) => {
                    let day = NaiveDate::parse_from_str(&day, "%Y%m%d")
                        .with_context(|| format!("Invalid day '{day}', expected YYYYMMDD"))?;
                    history.list_for_day(&link, day).await?
                }
                None => history.list_all(&link).await?,
            };

            println!(
                "{} {}",
                "📈 Visits of".bright_blue().bold(),
                link.id.bright_yellow().bold()
            );
            println!();

            if visits.is_empty() {
                println!("{}", "  No visits recorded".yellow());
                return Ok(());
            }

            for visit in &visits {
                println!(
                    "  {}  {:<15}  {}  {}",
                    visit.time.format("%H:%M:%S").to_string().bright_black(),
                    visit.ip.cyan(),
                    visit.url,
                    visit.user_agent.bright_black()
                );
            }

            println!();
            println!(
                "  Total: {}",
                visits.len().to_string().bright_white().bold()
            );
            println!();
        }
    }

    Ok(())
}

async fn handle_store_action<S: KeyValueStore>(action: StoreAction, store: Arc<S>) -> Result<()> {
    match action {
        StoreAction::Check => {
            println!("{}", "🔍 Checking store connection...".bright_blue());

            if !store.health_check().await {
                anyhow::bail!("Store is not reachable");
            }

            println!("{}", "✅ Store connection OK".green().bold());
        }
        StoreAction::Reconcile => {
            println!("{}", "🧹 Reconciling store...".bright_blue());

            let report = LinkService::new(store).reconcile().await?;

            println!();
            println!(
                "  Dangling index entries removed: {}",
                report.dangling_removed.to_string().bright_green().bold()
            );
            println!(
                "  Orphaned histories purged:      {}",
                report.orphans_purged.to_string().bright_green().bold()
            );
            println!();
        }
    }

    Ok(())
}
