//! End-to-end pipeline tests with scripted backends.
//!
//! Each test drives [`Planner::generate_plan`] against a backend that
//! replays a fixed sequence of replies (or errors), checking the retry and
//! repair ladder from the outside: what comes back, what lands in history,
//! and what never does.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use platter_core::backend::{BackendError, BuiltinBackend, GenerateRequest, ModelBackend};
use platter_core::plan::{Planner, PlannerConfig, check_invariants};
use platter_core::{GenerationError, RemixPolicy};
use platter_store::{FamilyProfile, PlanStore, PreferenceSet, StoreData};

/// One scripted reply: a raw text, or a transient backend error.
enum Reply {
    Text(&'static str),
    Unavailable,
    Timeout,
}

/// Backend replaying a fixed reply sequence; exhausted scripts report
/// unavailable. Counts calls so tests can assert the retry bound.
struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicU32,
}

impl ScriptedBackend {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().await.pop_front() {
            Some(Reply::Text(raw)) => Ok(raw.to_owned()),
            Some(Reply::Unavailable) | None => {
                Err(BackendError::unavailable("scripted", "script exhausted"))
            }
            Some(Reply::Timeout) => Err(BackendError::timeout("scripted", request.timeout)),
        }
    }
}

const VALID_THREE_DAY_DOC: &str = r#"{
  "days": [
    {
      "day": "Day 1",
      "meal": "Grilled Salmon with Greens",
      "description": "Salmon with broccoli and peas.",
      "is_remixed": false,
      "contains_oily_fish": true,
      "ingredients": [
        {"name": "Salmon Fillet", "quantity": 2, "unit": "pieces", "category": "Fish"},
        {"name": "Broccoli", "quantity": 1, "unit": "head", "category": "Produce"}
      ],
      "preparation_instructions": ["Step 1: Grill the salmon.", "Step 2: Steam the greens."]
    },
    {
      "day": "Day 2",
      "meal": "Chicken Fajita Bowl",
      "description": "A bowl remix of fajita night.",
      "is_remixed": true,
      "contains_oily_fish": false,
      "ingredients": [
        {"name": "Chicken Breast", "quantity": 500, "unit": "grams", "category": "Meat"},
        {"name": "Peppers", "quantity": 2, "unit": "", "category": "Produce"}
      ],
      "preparation_instructions": ["Step 1: Fry the chicken.", "Step 2: Assemble bowls."]
    },
    {
      "day": "Day 3",
      "meal": "Beef Bolognese",
      "description": "The family classic.",
      "is_remixed": false,
      "contains_oily_fish": false,
      "ingredients": [
        {"name": "Beef Mince", "quantity": 500, "unit": "grams", "category": "Meat"},
        {"name": "Tomatoes", "quantity": 4, "unit": "", "category": "Produce"}
      ],
      "preparation_instructions": ["Step 1: Brown the mince.", "Step 2: Simmer the sauce."]
    }
  ]
}"#;

/// A structurally parseable document missing recipes and both policy flags.
const SPARSE_DOC: &str = r#"{
  "days": [
    {"day": "Day 1", "meal": "Chicken pie"},
    {"day": "Day 2", "meal": "Veggie stir fry"},
    {"day": "Day 3", "meal": "Lamb kofta"}
  ]
}"#;

fn test_config() -> PlannerConfig {
    PlannerConfig {
        retry_limit: 2,
        request_timeout: Duration::from_secs(5),
        normalize_with_backend: false,
        ..PlannerConfig::default()
    }
}

fn store_in(dir: &tempfile::TempDir) -> Arc<PlanStore> {
    Arc::new(PlanStore::open(dir.path().join("platter.json")).unwrap())
}

fn planner(backend: ScriptedBackend, store: Arc<PlanStore>) -> Planner {
    Planner::new(Box::new(backend), store).with_config(test_config())
}

#[tokio::test]
async fn valid_reply_finalizes_in_one_attempt() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = store_in(&dir);
    let planner = planner(
        ScriptedBackend::new(vec![Reply::Text(VALID_THREE_DAY_DOC)]),
        store.clone(),
    );

    let plan = planner.generate_plan().await.unwrap();

    assert_eq!(plan.days.len(), 3);
    assert!(check_invariants(&plan, 3).is_empty());
    assert_eq!(plan.days[0].meal, "Grilled Salmon with Greens");

    let history = store.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, plan.id);

    // The shopping list was derived and cached alongside the append.
    let cached = store.cached_shopping_list(plan.id).await.unwrap();
    assert!(!cached.is_empty());
}

#[tokio::test]
async fn malformed_reply_retries_then_succeeds() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = store_in(&dir);
    let backend = ScriptedBackend::new(vec![
        Reply::Text("Sorry, here is your plan: {\"days\": [{\"meal\":"),
        Reply::Text(VALID_THREE_DAY_DOC),
    ]);
    let planner = planner(backend, store.clone());

    let plan = planner.generate_plan().await.unwrap();
    assert_eq!(plan.days.len(), 3);
    assert_eq!(store.history().await.len(), 1);
}

#[tokio::test]
async fn exhausted_retries_fall_back_to_liked_foods() {
    let dir = tempfile::TempDir::new().unwrap();
    // The seeded defaults include liked foods, so repair can build a plan.
    let store = store_in(&dir);
    let backend = ScriptedBackend::new(vec![
        Reply::Text("no json here"),
        Reply::Text("still no json"),
        Reply::Text("none at all"),
    ]);
    let planner = planner(backend, store.clone());

    let plan = planner.generate_plan().await.unwrap();

    assert_eq!(plan.days.len(), 3);
    assert!(check_invariants(&plan, 3).is_empty());
    assert!(plan.days.iter().any(|d| d.contains_oily_fish));
    assert!(plan.days.iter().any(|d| d.is_remixed));
    // All recipes came from the deterministic fallback.
    assert!(plan.days.iter().all(|d| d.has_complete_recipe()));
    assert_eq!(store.history().await.len(), 1);
}

#[tokio::test]
async fn repeated_fallback_generation_is_deterministic() {
    let run = |dir: tempfile::TempDir| async move {
        let store = store_in(&dir);
        let backend = ScriptedBackend::new(vec![]);
        let planner = planner(backend, store);
        let plan = planner.generate_plan().await.unwrap();
        plan.days
            .iter()
            .map(|d| (d.meal.clone(), d.recipe.instructions.clone()))
            .collect::<Vec<_>>()
    };

    let a = run(tempfile::TempDir::new().unwrap()).await;
    let b = run(tempfile::TempDir::new().unwrap()).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn nothing_recoverable_fails_without_touching_history() {
    let dir = tempfile::TempDir::new().unwrap();
    // No liked foods: repair has nothing to expand from.
    let data = StoreData {
        family: FamilyProfile::default(),
        preferences: PreferenceSet::default(),
        history: Vec::new(),
        shopping_lists: Default::default(),
    };
    let store = Arc::new(
        PlanStore::open_with_data(dir.path().join("platter.json"), data).unwrap(),
    );

    let backend = ScriptedBackend::new(vec![
        Reply::Text("not json"),
        Reply::Text("{\"days\": [}"),
        Reply::Text("truncated {\"days\""),
    ]);
    let planner = planner(backend, store.clone());

    let err = planner.generate_plan().await.unwrap_err();
    match err {
        GenerationError::Failed { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected Failed, got: {other}"),
    }
    assert!(store.history().await.is_empty());
}

#[tokio::test]
async fn backend_timeouts_are_retried_within_the_bound() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = store_in(&dir);
    let backend = ScriptedBackend::new(vec![
        Reply::Timeout,
        Reply::Unavailable,
        Reply::Text(VALID_THREE_DAY_DOC),
    ]);
    let planner = planner(backend, store.clone());

    let plan = planner.generate_plan().await.unwrap();
    assert_eq!(plan.days.len(), 3);
    assert_eq!(store.history().await.len(), 1);
}

#[tokio::test]
async fn full_plan_calls_stay_within_the_retry_bound() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = store_in(&dir);
    let backend = Arc::new(ScriptedBackend::new(vec![]));

    struct Shared(Arc<ScriptedBackend>);

    #[async_trait]
    impl ModelBackend for Shared {
        fn name(&self) -> &str {
            self.0.name()
        }

        async fn generate(&self, request: &GenerateRequest) -> Result<String, BackendError> {
            self.0.generate(request).await
        }
    }

    let planner = Planner::new(Box::new(Shared(backend.clone())), store).with_config(test_config());
    planner.generate_plan().await.unwrap();

    // 3 full-plan attempts + at most one narrow backfill call per day.
    assert!(
        backend.calls() <= 3 + 3,
        "expected a bounded number of calls, got {}",
        backend.calls()
    );
}

#[tokio::test]
async fn sparse_document_is_repaired_not_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = store_in(&dir);
    let backend = ScriptedBackend::new(vec![Reply::Text(SPARSE_DOC)]);
    let planner = planner(backend, store.clone());

    let plan = planner.generate_plan().await.unwrap();

    assert_eq!(plan.days.len(), 3);
    assert!(check_invariants(&plan, 3).is_empty());
    // The sparse titles survived; detail was backfilled around them.
    assert!(plan.meal_titles().any(|m| m == "Chicken pie"));
    assert!(plan.days.iter().all(|d| d.has_complete_recipe()));
}

#[tokio::test]
async fn second_plan_remixes_against_history() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = store_in(&dir);

    let first = Planner::new(
        Box::new(ScriptedBackend::new(vec![Reply::Text(VALID_THREE_DAY_DOC)])),
        store.clone(),
    )
    .with_config(test_config());
    first.generate_plan().await.unwrap();

    // Second run: sparse reply containing a meal similar to history.
    let second = Planner::new(
        Box::new(ScriptedBackend::new(vec![Reply::Text(
            r#"{"days": [
                {"meal": "Beef Bolognese Bake"},
                {"meal": "Halloumi wraps"},
                {"meal": "Sausage traybake"}
            ]}"#,
        )])),
        store.clone(),
    )
    .with_config(test_config());
    let plan = second.generate_plan().await.unwrap();

    let remixed: Vec<&str> = plan
        .days
        .iter()
        .filter(|d| d.is_remixed)
        .map(|d| d.meal.as_str())
        .collect();
    assert_eq!(remixed, vec!["Beef Bolognese Bake"]);
    assert_eq!(store.history().await.len(), 2);
}

#[tokio::test]
async fn end_to_end_with_builtin_backend() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = store_in(&dir);
    store
        .update_family(FamilyProfile {
            members: 4,
            children_ages: vec![6, 9],
            meal_count: 3,
        })
        .await
        .unwrap();

    let planner = Planner::new(Box::new(BuiltinBackend::new()), store.clone())
        .with_policy(RemixPolicy::default())
        .with_config(PlannerConfig {
            request_timeout: Duration::from_secs(5),
            ..PlannerConfig::default()
        });

    let plan = planner.generate_plan().await.unwrap();
    assert_eq!(plan.days.len(), 3);
    assert!(check_invariants(&plan, 3).is_empty());

    let items = planner.shopping_list_for(&plan).await;
    assert!(!items.is_empty());

    // No duplicate normalized names within a unit, and category-grouped
    // order.
    let mut keys: Vec<(String, String)> = items
        .iter()
        .map(|i| (i.name.clone(), i.unit.clone()))
        .collect();
    let before = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), before, "duplicate normalized names in {items:?}");

    let categories: Vec<&str> = items.iter().map(|i| i.category.as_str()).collect();
    let mut sorted = categories.clone();
    sorted.sort();
    assert_eq!(categories, sorted);

    // Aggregation is idempotent.
    let again = planner.shopping_list_for(&plan).await;
    assert_eq!(items, again);
}
