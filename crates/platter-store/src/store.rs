//! JSON-file-backed preference and history store.
//!
//! One file holds the family profile, food preferences, plan history, and
//! cached shopping lists. All mutations go through [`PlanStore`], which holds
//! a single async mutex across every read-modify-write-save cycle, so
//! concurrent generation requests can never lose or duplicate a history
//! entry. Reads return cloned snapshots and never block unrelated writers
//! longer than the copy takes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    FamilyProfile, MealPlan, PreferenceSet, ShoppingListItem, clamp_meal_count,
};

/// History keeps only this many most recent plans. Evicting a plan also
/// discards its cached shopping list.
pub const HISTORY_LIMIT: usize = 10;

/// Errors from loading or persisting the store file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode store data: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

/// Everything the store persists. Public so tests and tooling can seed a
/// store file directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreData {
    pub family: FamilyProfile,
    pub preferences: PreferenceSet,
    /// Append-only, oldest first, capped at [`HISTORY_LIMIT`].
    #[serde(default)]
    pub history: Vec<MealPlan>,
    /// Cached shopping lists keyed by plan id.
    #[serde(default)]
    pub shopping_lists: HashMap<Uuid, Vec<ShoppingListItem>>,
}

impl Default for StoreData {
    /// Starter data for a fresh install: a family of four and a liked-food
    /// list the fallback generator can draw from.
    fn default() -> Self {
        let mut preferences = PreferenceSet::default();
        for food in [
            "Hotdogs",
            "Burgers",
            "Chicken nuggets and chips",
            "Fish tacos",
            "Salmon and broccoli",
            "Fajitas",
            "Bolognese",
        ] {
            preferences.add_liked(food);
        }
        Self {
            family: FamilyProfile::default(),
            preferences,
            history: Vec::new(),
            shopping_lists: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Single-writer store over one JSON file.
pub struct PlanStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl std::fmt::Debug for PlanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStore").field("path", &self.path).finish()
    }
}

/// Default store file location: `$XDG_DATA_HOME/platter/platter.json` or
/// `~/.local/share/platter/platter.json`.
pub fn default_store_path() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("platter").join("platter.json");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("platter")
        .join("platter.json")
}

impl PlanStore {
    /// Open a store at `path`, seeding default data when the file is missing.
    ///
    /// A file that exists but cannot be parsed is treated as missing (with a
    /// warning) rather than failing the whole application; the next save
    /// overwrites it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(data) => data,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "store file is corrupt; starting from defaults");
                    StoreData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store file; starting from defaults");
                StoreData::default()
            }
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Open a store seeded with explicit data, persisting it immediately.
    pub fn open_with_data(path: impl Into<PathBuf>, data: StoreData) -> Result<Self, StoreError> {
        let path = path.into();
        write_data(&path, &data)?;
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -- snapshot reads -----------------------------------------------------

    pub async fn profile(&self) -> FamilyProfile {
        self.data.lock().await.family.clone()
    }

    pub async fn preferences(&self) -> PreferenceSet {
        self.data.lock().await.preferences.clone()
    }

    /// Full plan history, oldest first.
    pub async fn history(&self) -> Vec<MealPlan> {
        self.data.lock().await.history.clone()
    }

    pub async fn latest_plan(&self) -> Option<MealPlan> {
        self.data.lock().await.history.last().cloned()
    }

    pub async fn find_plan(&self, id: Uuid) -> Option<MealPlan> {
        self.data
            .lock()
            .await
            .history
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn cached_shopping_list(&self, plan_id: Uuid) -> Option<Vec<ShoppingListItem>> {
        self.data.lock().await.shopping_lists.get(&plan_id).cloned()
    }

    // -- mutations (lock held across read-modify-write-save) ----------------

    /// Add a food preference. Inserting a liked food removes any disliked
    /// entry with the same normalized value, and vice versa.
    pub async fn add_preference(&self, food: &str, liked: bool) -> Result<bool, StoreError> {
        let mut data = self.data.lock().await;
        let added = if liked {
            data.preferences.add_liked(food)
        } else {
            data.preferences.add_disliked(food)
        };
        write_data(&self.path, &data)?;
        Ok(added)
    }

    /// Remove a food preference. Returns whether an entry was removed.
    pub async fn remove_preference(&self, food: &str, liked: bool) -> Result<bool, StoreError> {
        let mut data = self.data.lock().await;
        let removed = data.preferences.remove(food, liked);
        write_data(&self.path, &data)?;
        Ok(removed)
    }

    /// Replace the family profile, clamping `meal_count` into the weekly
    /// range.
    pub async fn update_family(&self, mut profile: FamilyProfile) -> Result<(), StoreError> {
        profile.meal_count = clamp_meal_count(profile.meal_count);
        let mut data = self.data.lock().await;
        data.family = profile;
        write_data(&self.path, &data)
    }

    /// Append a finalized plan to history, evicting the oldest entries (and
    /// their cached shopping lists) beyond [`HISTORY_LIMIT`].
    pub async fn append_plan(&self, plan: MealPlan) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        data.history.push(plan);
        while data.history.len() > HISTORY_LIMIT {
            let evicted = data.history.remove(0);
            data.shopping_lists.remove(&evicted.id);
            debug!(plan_id = %evicted.id, "evicted plan from history");
        }
        write_data(&self.path, &data)
    }

    /// Cache a derived shopping list for a plan.
    pub async fn store_shopping_list(
        &self,
        plan_id: Uuid,
        items: Vec<ShoppingListItem>,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        data.shopping_lists.insert(plan_id, items);
        write_data(&self.path, &data)
    }
}

fn write_data(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    let contents = serde_json::to_string_pretty(data)?;
    std::fs::write(path, contents).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DaySlot, Ingredient, MealDay, Recipe};
    use chrono::Utc;

    fn sample_plan(title: &str) -> MealPlan {
        MealPlan {
            id: Uuid::new_v4(),
            week_starting: Utc::now(),
            generated_at: Utc::now(),
            days: vec![MealDay {
                day: DaySlot::Day1,
                meal: title.to_owned(),
                description: String::new(),
                is_remixed: true,
                contains_oily_fish: true,
                ingredients: vec![Ingredient::new("salmon", 2.0, "fillets", "Fish")],
                recipe: Recipe {
                    cooking_time_minutes: 30,
                    instructions: vec!["Cook.".to_owned()],
                    source: None,
                    url: None,
                },
            }],
        }
    }

    fn temp_store() -> (tempfile::TempDir, PlanStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = PlanStore::open(dir.path().join("platter.json")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn fresh_store_seeds_defaults() {
        let (_dir, store) = temp_store();
        let profile = store.profile().await;
        assert_eq!(profile.members, 4);
        assert_eq!(profile.meal_count, 3);
        assert!(!store.preferences().await.liked.is_empty());
        assert!(store.history().await.is_empty());
    }

    #[tokio::test]
    async fn preferences_persist_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("platter.json");

        {
            let store = PlanStore::open(&path).unwrap();
            store.add_preference("Katsu curry", true).await.unwrap();
        }

        let reopened = PlanStore::open(&path).unwrap();
        assert!(reopened.preferences().await.is_liked("katsu curry"));
    }

    #[tokio::test]
    async fn corrupt_file_recovers_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("platter.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let store = PlanStore::open(&path).unwrap();
        assert_eq!(store.profile().await.members, 4);
    }

    #[tokio::test]
    async fn append_caps_history_and_evicts_cached_lists() {
        let (_dir, store) = temp_store();

        let oldest = sample_plan("oldest");
        let oldest_id = oldest.id;
        store.append_plan(oldest).await.unwrap();
        store
            .store_shopping_list(oldest_id, vec![])
            .await
            .unwrap();

        for i in 0..HISTORY_LIMIT {
            store.append_plan(sample_plan(&format!("plan {i}"))).await.unwrap();
        }

        let history = store.history().await;
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].days[0].meal, "plan 0");
        assert!(store.find_plan(oldest_id).await.is_none());
        assert!(store.cached_shopping_list(oldest_id).await.is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_keep_every_entry() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = std::sync::Arc::new(
            PlanStore::open(dir.path().join("platter.json")).unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append_plan(sample_plan(&format!("plan {i}"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.history().await.len(), 8);
    }

    #[tokio::test]
    async fn update_family_clamps_meal_count() {
        let (_dir, store) = temp_store();
        store
            .update_family(FamilyProfile {
                members: 5,
                children_ages: vec![3, 6, 9],
                meal_count: 12,
            })
            .await
            .unwrap();
        assert_eq!(store.profile().await.meal_count, 7);
    }

    #[tokio::test]
    async fn shopping_list_cache_round_trip() {
        let (_dir, store) = temp_store();
        let plan = sample_plan("fish pie");
        let id = plan.id;
        store.append_plan(plan).await.unwrap();

        assert!(store.cached_shopping_list(id).await.is_none());

        let items = vec![ShoppingListItem {
            name: "salmon".to_owned(),
            quantity: 2.0,
            unit: "fillets".to_owned(),
            category: "seafood".to_owned(),
            sources: vec!["Salmon".to_owned()],
        }];
        store.store_shopping_list(id, items.clone()).await.unwrap();
        assert_eq!(store.cached_shopping_list(id).await, Some(items));
    }
}
