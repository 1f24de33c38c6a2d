//! `preference` and `family` commands.

use std::sync::Arc;

use anyhow::Result;

use platter_store::PlanStore;

use crate::render;

/// Add a liked or disliked food.
pub async fn run_preference_add(store: Arc<PlanStore>, food: &str, dislike: bool) -> Result<()> {
    let added = store.add_preference(food, !dislike).await?;
    let side = if dislike { "disliked" } else { "liked" };
    if added {
        println!("Added {food:?} to {side} foods.");
    } else {
        println!("{food:?} is already in {side} foods.");
    }
    Ok(())
}

/// Remove a liked or disliked food.
pub async fn run_preference_remove(store: Arc<PlanStore>, food: &str, dislike: bool) -> Result<()> {
    let removed = store.remove_preference(food, !dislike).await?;
    let side = if dislike { "disliked" } else { "liked" };
    if removed {
        println!("Removed {food:?} from {side} foods.");
    } else {
        println!("{food:?} was not in {side} foods.");
    }
    Ok(())
}

/// Print both preference lists side by side.
pub async fn run_preference_list(store: Arc<PlanStore>) -> Result<()> {
    let preferences = store.preferences().await;
    let rows: Vec<Vec<String>> = (0..preferences.liked.len().max(preferences.disliked.len()))
        .map(|i| {
            vec![
                preferences.liked.get(i).cloned().unwrap_or_default(),
                preferences.disliked.get(i).cloned().unwrap_or_default(),
            ]
        })
        .collect();
    render::print_table(&["Liked", "Disliked"], &rows);
    Ok(())
}

/// Update family details; unset flags keep their current values.
pub async fn run_family(
    store: Arc<PlanStore>,
    members: Option<u32>,
    child_ages: Vec<u8>,
    meal_count: Option<u8>,
) -> Result<()> {
    let mut profile = store.profile().await;
    if let Some(members) = members {
        profile.members = members;
    }
    if !child_ages.is_empty() {
        profile.children_ages = child_ages;
    }
    if let Some(meal_count) = meal_count {
        profile.meal_count = meal_count;
    }
    store.update_family(profile).await?;

    let profile = store.profile().await;
    println!(
        "Family of {} ({} children), {} meal(s) per plan.",
        profile.members,
        profile.children_ages.len(),
        profile.meal_count
    );
    Ok(())
}
