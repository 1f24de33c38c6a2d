mod config;
mod plan_cmds;
mod pref_cmds;
mod render;
mod shopping_cmds;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use platter_store::{PlanStore, default_store_path};

use config::PlatterConfig;

#[derive(Parser)]
#[command(name = "platter", about = "AI-assisted weekly family meal planner")]
struct Cli {
    /// Store file path (overrides the default data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Backend to use: builtin, openai, or ollama (overrides config)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// List available model backends
    Backends,
    /// Generate a new meal plan
    Plan,
    /// List stored meal plans
    History,
    /// Show the recipe for one day of the latest plan
    Recipe {
        /// Day number (1-based)
        day: usize,
    },
    /// Manage food preferences
    Preference {
        #[command(subcommand)]
        command: PreferenceCommands,
    },
    /// Update family details
    Family {
        /// Number of household members
        #[arg(long)]
        members: Option<u32>,
        /// Child's age (repeat for each child)
        #[arg(long = "child-age")]
        child_ages: Vec<u8>,
        /// Meals per plan (1-7)
        #[arg(long)]
        meal_count: Option<u8>,
    },
    /// Show the shopping list for a plan (defaults to the latest)
    ShoppingList {
        /// Plan id from `platter history`
        #[arg(long)]
        plan: Option<String>,
    },
    /// Submit a plan's shopping list to the cart service
    Cart {
        /// Plan id from `platter history`
        #[arg(long)]
        plan: Option<String>,
    },
}

#[derive(Subcommand)]
enum PreferenceCommands {
    /// Add a food preference
    Add {
        /// Food name
        food: String,
        /// Mark as disliked instead of liked
        #[arg(long)]
        dislike: bool,
    },
    /// Remove a food preference
    Remove {
        /// Food name
        food: String,
        /// Remove from disliked instead of liked
        #[arg(long)]
        dislike: bool,
    },
    /// List liked and disliked foods
    List,
}

fn open_store(path_override: Option<PathBuf>) -> anyhow::Result<Arc<PlanStore>> {
    let path = path_override.unwrap_or_else(default_store_path);
    let store = PlanStore::open(&path)
        .with_context(|| format!("failed to open store at {}", path.display()))?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            config::cmd_init(force)?;
        }
        Commands::Backends => {
            let config = PlatterConfig::resolve(cli.backend.as_deref())?;
            let registry = config.build_registry();
            let mut names = registry.list();
            names.sort_unstable();
            for name in names {
                let marker = if name == config.provider { " (active)" } else { "" };
                println!("{name}{marker}");
            }
            if registry.get(&config.provider).is_none() {
                println!();
                println!(
                    "warning: configured backend {:?} is not available",
                    config.provider
                );
            }
        }
        Commands::Plan => {
            let config = PlatterConfig::resolve(cli.backend.as_deref())?;
            let store = open_store(cli.store)?;
            plan_cmds::run_plan(&config, store).await?;
        }
        Commands::History => {
            let store = open_store(cli.store)?;
            plan_cmds::run_history(store).await?;
        }
        Commands::Recipe { day } => {
            let store = open_store(cli.store)?;
            plan_cmds::run_recipe(store, day).await?;
        }
        Commands::Preference { command } => {
            let store = open_store(cli.store)?;
            match command {
                PreferenceCommands::Add { food, dislike } => {
                    pref_cmds::run_preference_add(store, &food, dislike).await?;
                }
                PreferenceCommands::Remove { food, dislike } => {
                    pref_cmds::run_preference_remove(store, &food, dislike).await?;
                }
                PreferenceCommands::List => {
                    pref_cmds::run_preference_list(store).await?;
                }
            }
        }
        Commands::Family {
            members,
            child_ages,
            meal_count,
        } => {
            let store = open_store(cli.store)?;
            pref_cmds::run_family(store, members, child_ages, meal_count).await?;
        }
        Commands::ShoppingList { plan } => {
            let config = PlatterConfig::resolve(cli.backend.as_deref())?;
            let store = open_store(cli.store)?;
            shopping_cmds::run_shopping_list(&config, store, plan.as_deref()).await?;
        }
        Commands::Cart { plan } => {
            let config = PlatterConfig::resolve(cli.backend.as_deref())?;
            let store = open_store(cli.store)?;
            shopping_cmds::run_cart(&config, store, plan.as_deref()).await?;
        }
    }

    Ok(())
}
