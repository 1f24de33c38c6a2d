//! `shopping-list` and `cart` commands.

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::debug;
use uuid::Uuid;

use platter_core::cart::{CartClient, MockCartClient};
use platter_core::plan::Planner;
use platter_store::{MealPlan, PlanStore, ShoppingListItem};

use crate::config::PlatterConfig;
use crate::render;

/// Resolve `--plan` to a stored plan, defaulting to the most recent.
async fn resolve_plan(store: &PlanStore, plan_id: Option<&str>) -> Result<MealPlan> {
    match plan_id {
        Some(raw) => {
            let id: Uuid = raw.parse().map_err(|_| {
                anyhow::anyhow!("{raw:?} is not a plan id; see `platter history` for ids")
            })?;
            match store.find_plan(id).await {
                Some(plan) => Ok(plan),
                None => bail!("no stored plan with id {id}"),
            }
        }
        None => match store.latest_plan().await {
            Some(plan) => Ok(plan),
            None => bail!("no meal plans generated yet; run `platter plan` first"),
        },
    }
}

/// Fetch the cached shopping list for a plan, deriving and caching it when
/// absent.
async fn load_items(
    config: &PlatterConfig,
    store: &Arc<PlanStore>,
    plan: &MealPlan,
) -> Result<Vec<ShoppingListItem>> {
    if let Some(items) = store.cached_shopping_list(plan.id).await {
        return Ok(items);
    }
    debug!(plan_id = %plan.id, "no cached shopping list; deriving one");

    let backend = config.build_backend()?;
    let planner = Planner::new(backend, store.clone()).with_config(config.planner_config());
    let items = planner.shopping_list_for(plan).await;
    store.store_shopping_list(plan.id, items.clone()).await?;
    Ok(items)
}

/// Print the shopping list for a plan.
pub async fn run_shopping_list(
    config: &PlatterConfig,
    store: Arc<PlanStore>,
    plan_id: Option<&str>,
) -> Result<()> {
    let plan = resolve_plan(&store, plan_id).await?;
    let items = load_items(config, &store, &plan).await?;
    if items.is_empty() {
        println!("The shopping list for plan {} is empty.", plan.id);
        return Ok(());
    }
    println!("Shopping list for plan {}:", plan.id);
    render::print_shopping_list(&items);
    Ok(())
}

/// Submit a plan's shopping list through the cart collaborator.
pub async fn run_cart(
    config: &PlatterConfig,
    store: Arc<PlanStore>,
    plan_id: Option<&str>,
) -> Result<()> {
    let plan = resolve_plan(&store, plan_id).await?;
    let items = load_items(config, &store, &plan).await?;
    if items.is_empty() {
        bail!("the shopping list for plan {} is empty", plan.id);
    }

    let client = MockCartClient::new();
    let receipt = client.submit(&items).await?;
    render::print_receipt(&receipt);
    Ok(())
}
