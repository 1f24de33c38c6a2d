//! Data model and JSON-file preference/history store for platter.
//!
//! The store is the single owner of family state: profile, liked/disliked
//! foods, plan history, and cached shopping lists. The generation pipeline in
//! `platter-core` reads snapshots from it and performs one terminal
//! [`store::PlanStore::append_plan`] per successful generation.

pub mod models;
pub mod store;

pub use models::{
    DaySlot, DaySlotParseError, FamilyProfile, Ingredient, MealDay, MealPlan, PreferenceSet,
    Recipe, ShoppingListItem, clamp_meal_count,
};
pub use store::{HISTORY_LIMIT, PlanStore, StoreData, StoreError, default_store_path};
