//! `plan`, `history`, and `recipe` commands.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use platter_core::plan::Planner;
use platter_store::PlanStore;

use crate::config::PlatterConfig;
use crate::render;

/// Generate a new meal plan and print it.
pub async fn run_plan(config: &PlatterConfig, store: Arc<PlanStore>) -> Result<()> {
    let backend = config.build_backend()?;
    println!("Generating a meal plan with the {} backend...", backend.name());

    let planner = Planner::new(backend, store).with_config(config.planner_config());
    let plan = planner
        .generate_plan()
        .await
        .context("meal plan generation failed")?;

    render::print_meal_plan(&plan);
    println!();
    println!("Recipes: `platter recipe <day>`; shopping list: `platter shopping-list`.");
    Ok(())
}

/// List stored plans.
pub async fn run_history(store: Arc<PlanStore>) -> Result<()> {
    let history = store.history().await;
    if history.is_empty() {
        println!("No meal plans generated yet. Run `platter plan` to create one.");
        return Ok(());
    }
    render::print_history(&history);
    Ok(())
}

/// Print the recipe for one day of the most recent plan.
pub async fn run_recipe(store: Arc<PlanStore>, day: usize) -> Result<()> {
    let Some(plan) = store.latest_plan().await else {
        bail!("no meal plans generated yet; run `platter plan` first");
    };

    let Some(meal_day) = day
        .checked_sub(1)
        .and_then(|index| plan.days.get(index))
    else {
        bail!("no Day {day} in the latest plan (it has {} days)", plan.days.len());
    };

    render::print_recipe(meal_day);
    Ok(())
}
