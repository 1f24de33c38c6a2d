//! Shopping list aggregation.
//!
//! Flattens every ingredient of a finalized plan, merges occurrences by
//! normalized name, sums quantities where units are compatible, assigns one
//! category per normalized name, and returns a list ordered by category then
//! name. Aggregation is a pure function of the plan and the name map, so
//! repeated runs over the same plan yield identical output.

use std::collections::HashMap;
use std::time::Duration;

use platter_store::{MealPlan, ShoppingListItem};
use tracing::warn;

use crate::backend::ModelBackend;
use crate::shopping::normalize::{llm_canonicalize, rule_normalize};

/// Pantry staples most households already have; filtered only when
/// requested.
const PANTRY_STAPLES: &[&str] = &[
    "salt",
    "black pepper",
    "baking powder",
    "baking soda",
    "vanilla extract",
    "garlic powder",
    "onion powder",
    "paprika",
    "cumin",
    "cinnamon",
    "nutmeg",
    "bay leaf",
];

/// Keyword tables for categorizing ingredients that arrive without a
/// category.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "produce",
        &[
            "tomato", "onion", "garlic", "potato", "carrot", "lettuce", "avocado", "lemon",
            "lime", "apple", "banana", "berry", "pepper", "cucumber", "courgette", "zucchini",
            "squash", "broccoli", "cauliflower", "spinach", "kale", "parsley", "basil", "mint",
            "bean", "pea", "vegetable",
        ],
    ),
    (
        "meat",
        &["beef", "chicken", "pork", "lamb", "turkey", "sausage", "bacon", "ham", "steak", "mince"],
    ),
    (
        "seafood",
        &["fish", "salmon", "tuna", "cod", "shrimp", "prawn", "crab", "mussel", "mackerel",
          "sardine", "trout", "anchov"],
    ),
    (
        "dairy",
        &["milk", "cheese", "yogurt", "yoghurt", "cream", "butter", "egg"],
    ),
    (
        "bakery",
        &["bread", "bun", "roll", "tortilla", "wrap", "pita", "bagel", "pastry"],
    ),
    (
        "pantry",
        &["rice", "pasta", "noodle", "lentil", "chickpea", "flour", "sugar", "oil", "vinegar",
          "sauce", "spice", "herb", "grain", "nut", "seed", "honey", "stock"],
    ),
    ("frozen", &["frozen"]),
    ("beverages", &["juice", "soda", "coffee", "tea", "wine"]),
];

/// Classify an ingredient name into a shopping category.
pub fn categorize(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    for &(category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return category;
        }
    }
    "other"
}

/// Whether a normalized name is a pantry staple.
pub fn is_pantry_staple(name: &str) -> bool {
    PANTRY_STAPLES.iter().any(|staple| name.contains(staple))
}

/// Aggregation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    /// Drop pantry staples from the output. Off by default so that every
    /// ingredient of the plan is accounted for.
    pub skip_pantry_staples: bool,
}

/// Aggregate a plan's ingredients with an explicit raw-name -> canonical-name
/// map. Names missing from the map fall back to [`rule_normalize`].
pub fn aggregate_with(
    plan: &MealPlan,
    name_map: &HashMap<String, String>,
    options: AggregateOptions,
) -> Vec<ShoppingListItem> {
    struct Group {
        name: String,
        unit: String,
        quantity: f64,
        sources: Vec<String>,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut category_votes: HashMap<String, HashMap<String, usize>> = HashMap::new();

    for ingredient in plan.days.iter().flat_map(|d| &d.ingredients) {
        let canonical = match name_map.get(&ingredient.name) {
            // Mapped values are model output; normalize them again.
            Some(mapped) => rule_normalize(mapped),
            None => rule_normalize(&ingredient.name),
        };
        if canonical.is_empty() {
            continue;
        }
        if options.skip_pantry_staples && is_pantry_staple(&canonical) {
            continue;
        }

        if !ingredient.category.trim().is_empty() {
            *category_votes
                .entry(canonical.clone())
                .or_default()
                .entry(ingredient.category.trim().to_lowercase())
                .or_insert(0) += 1;
        }

        let unit = ingredient.unit.trim().to_lowercase();
        match groups
            .iter_mut()
            .find(|g| g.name == canonical && g.unit == unit)
        {
            Some(group) => {
                group.quantity += ingredient.quantity;
                if !group.sources.contains(&ingredient.name) {
                    group.sources.push(ingredient.name.clone());
                }
            }
            None => groups.push(Group {
                name: canonical,
                unit,
                quantity: ingredient.quantity,
                sources: vec![ingredient.name.clone()],
            }),
        }
    }

    let mut items: Vec<ShoppingListItem> = groups
        .into_iter()
        .map(|group| {
            // Most frequent non-empty category for this name; ties broken
            // alphabetically for stable output.
            let category = category_votes
                .get(&group.name)
                .and_then(|votes| {
                    votes
                        .iter()
                        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                        .map(|(category, _)| category.clone())
                })
                .unwrap_or_else(|| categorize(&group.name).to_owned());
            ShoppingListItem {
                name: group.name,
                quantity: group.quantity,
                unit: group.unit,
                category,
                sources: group.sources,
            }
        })
        .collect();

    items.sort_by(|a, b| a.category.cmp(&b.category).then(a.name.cmp(&b.name)).then(a.unit.cmp(&b.unit)));
    items
}

/// Aggregate a plan's ingredients into a shopping list.
///
/// When a backend is supplied, one batched canonicalization call merges
/// near-duplicates the rules miss; if that call fails for any reason the
/// aggregation silently degrades to rule-based (and ultimately exact-string)
/// grouping.
pub async fn shopping_list(
    plan: &MealPlan,
    backend: Option<&dyn ModelBackend>,
    timeout: Duration,
    options: AggregateOptions,
) -> Vec<ShoppingListItem> {
    let mut distinct: Vec<String> = Vec::new();
    for ingredient in plan.days.iter().flat_map(|d| &d.ingredients) {
        if !distinct.contains(&ingredient.name) {
            distinct.push(ingredient.name.clone());
        }
    }

    let name_map = match backend {
        Some(backend) => match llm_canonicalize(backend, &distinct, timeout).await {
            Some(mapping) => mapping,
            None => {
                warn!("name canonicalization unavailable; using rule-based grouping");
                HashMap::new()
            }
        },
        None => HashMap::new(),
    };

    aggregate_with(plan, &name_map, options)
}
