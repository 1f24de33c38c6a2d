//! Completeness backfill.
//!
//! Guarantees that every day of a draft plan ends up with at least one
//! ingredient and one instruction step. A day missing detail first gets one
//! narrow single-meal generation call scoped to its title; if the backend is
//! absent, fails, or replies with something unusable, a deterministic
//! fallback recipe is synthesized instead. The fallback depends only on the
//! meal title and time budget, so repeated runs produce identical recipes.

use std::time::Duration;

use platter_store::{Ingredient, MealDay, Recipe};
use tracing::{debug, warn};

use crate::backend::{GenerateRequest, ModelBackend};
use crate::plan::parser::parse_recipe_document;
use crate::plan::schema::RecipeIngredient;
use crate::prompt::{BuiltPrompt, sanitize_term};

/// Marker recorded in [`Recipe::source`] for synthesized fallback recipes.
pub const FALLBACK_SOURCE: &str = "generated-fallback";

/// Generic ingredient list used by the synthesized fallback.
const FALLBACK_INGREDIENTS: &[(&str, f64, &str, &str)] = &[
    ("Main protein (chicken, beef, or fish)", 500.0, "grams", "Meat"),
    ("Mixed vegetables", 400.0, "grams", "Produce"),
    ("Rice or pasta", 250.0, "grams", "Pantry"),
    ("Olive Oil", 1.0, "tbsp", "Pantry"),
];

/// Build the narrow single-meal prompt.
fn build_recipe_prompt(meal: &str, description: &str, minutes: u32) -> BuiltPrompt {
    let meal = sanitize_term(meal);
    let description = sanitize_term(description);

    let system = "You are a professional chef specializing in family-friendly recipes. \
                  Create practical recipes with specific, buyable ingredients and clear, \
                  numbered instructions a novice cook could follow."
        .to_owned();

    let mut user = format!("Create one detailed recipe for: {meal}\n");
    if !description.is_empty() {
        user.push_str(&format!("The meal is described as: {description}\n"));
    }
    user.push_str(&format!(
        "It should take about {minutes} minutes to prepare and cook.\n\n\
         Reply with a JSON document exactly matching this shape:\n\
         {{\"ingredients\": [{{\"name\": \"...\", \"quantity\": 1, \"unit\": \"...\", \
         \"category\": \"...\"}}], \"instructions\": [\"Step 1: ...\"], \"cooking_time\": {minutes}}}\n"
    ));

    BuiltPrompt { system, user }
}

/// Synthesize the deterministic fallback recipe for a meal title.
pub fn synthesize_recipe(meal: &str, minutes: u32) -> (Vec<Ingredient>, Recipe) {
    let ingredients = FALLBACK_INGREDIENTS
        .iter()
        .map(|(name, quantity, unit, category)| Ingredient::new(*name, *quantity, unit, category))
        .collect();

    let recipe = Recipe {
        cooking_time_minutes: minutes,
        instructions: vec![
            "Step 1: Prepare all ingredients, washing and chopping as needed.".to_owned(),
            format!("Step 2: Cook the main components of the {meal} over medium heat."),
            "Step 3: Combine everything and season to taste.".to_owned(),
            "Step 4: Serve hot with the sides.".to_owned(),
        ],
        source: Some(FALLBACK_SOURCE.to_owned()),
        url: None,
    };

    (ingredients, recipe)
}

/// Fill in whatever a day's recipe is missing.
///
/// No-op for complete days. For incomplete days, tries one narrow backend
/// call, then falls back to [`synthesize_recipe`]. Only the missing pieces
/// are replaced; detail the primary generation did produce is kept.
pub async fn complete_recipe(
    backend: Option<&dyn ModelBackend>,
    day: &mut MealDay,
    minutes: u32,
    timeout: Duration,
) {
    let needs_ingredients = day.ingredients.is_empty();
    let needs_instructions = !day.recipe.instructions.iter().any(|s| !s.trim().is_empty());
    if !needs_ingredients && !needs_instructions {
        return;
    }

    if let Some(backend) = backend {
        let prompt = build_recipe_prompt(&day.meal, &day.description, minutes);
        let request = GenerateRequest::new(prompt.system, prompt.user).with_timeout(timeout);
        match backend.generate(&request).await {
            Ok(raw) => match parse_recipe_document(&raw) {
                Ok(doc) => {
                    if needs_ingredients && !doc.ingredients.is_empty() {
                        day.ingredients = doc
                            .ingredients
                            .into_iter()
                            .map(RecipeIngredient::into_entry)
                            .map(|e| Ingredient::new(e.name, e.quantity, &e.unit, &e.category))
                            .collect();
                    }
                    let steps: Vec<String> = doc
                        .instructions
                        .into_iter()
                        .filter(|s| !s.trim().is_empty())
                        .collect();
                    if needs_instructions && !steps.is_empty() {
                        day.recipe.instructions = steps;
                        day.recipe.source = Some(backend.name().to_owned());
                    }
                    if let Some(time) = doc.cooking_time {
                        if time > 0 {
                            day.recipe.cooking_time_minutes = time;
                        }
                    }
                    debug!(day = %day.day, meal = %day.meal, "backfilled recipe from backend");
                }
                Err(e) => {
                    warn!(day = %day.day, error = %e, "single-meal reply unusable; synthesizing");
                }
            },
            Err(e) => {
                warn!(day = %day.day, error = %e, "single-meal generation failed; synthesizing");
            }
        }
    }

    // Whatever is still missing gets the deterministic fallback.
    let still_needs_ingredients = day.ingredients.is_empty();
    let still_needs_instructions = !day.recipe.instructions.iter().any(|s| !s.trim().is_empty());
    if still_needs_ingredients || still_needs_instructions {
        let (ingredients, recipe) = synthesize_recipe(&day.meal, minutes);
        if still_needs_ingredients {
            day.ingredients = ingredients;
        }
        if still_needs_instructions {
            day.recipe.instructions = recipe.instructions;
            day.recipe.source = recipe.source;
        }
        if day.recipe.cooking_time_minutes == 0 {
            day.recipe.cooking_time_minutes = minutes;
        }
        debug!(day = %day.day, meal = %day.meal, "synthesized fallback recipe");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use async_trait::async_trait;
    use platter_store::DaySlot;

    fn bare_day(meal: &str) -> MealDay {
        MealDay {
            day: DaySlot::Day1,
            meal: meal.to_owned(),
            description: "Quick and easy.".to_owned(),
            is_remixed: false,
            contains_oily_fish: false,
            ingredients: vec![],
            recipe: Recipe {
                cooking_time_minutes: 0,
                instructions: vec![],
                source: None,
                url: None,
            },
        }
    }

    struct ScriptedBackend(Result<String, ()>);

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _request: &GenerateRequest) -> Result<String, BackendError> {
            match &self.0 {
                Ok(raw) => Ok(raw.clone()),
                Err(()) => Err(BackendError::unavailable("scripted", "down")),
            }
        }
    }

    #[tokio::test]
    async fn synthesized_fallback_is_deterministic() {
        let (ingredients_a, recipe_a) = synthesize_recipe("Fish Tacos", 30);
        let (ingredients_b, recipe_b) = synthesize_recipe("Fish Tacos", 30);
        assert_eq!(ingredients_a, ingredients_b);
        assert_eq!(recipe_a, recipe_b);
        assert_eq!(recipe_a.source.as_deref(), Some(FALLBACK_SOURCE));
        assert!(recipe_a.instructions[1].contains("Fish Tacos"));
    }

    #[tokio::test]
    async fn no_backend_synthesizes_fallback() {
        let mut day = bare_day("Fajitas");
        complete_recipe(None, &mut day, 30, Duration::from_secs(1)).await;

        assert!(day.has_complete_recipe());
        assert_eq!(day.recipe.source.as_deref(), Some(FALLBACK_SOURCE));
        assert_eq!(day.recipe.cooking_time_minutes, 30);
    }

    #[tokio::test]
    async fn backend_failure_synthesizes_fallback() {
        let backend = ScriptedBackend(Err(()));
        let mut day = bare_day("Fajitas");
        complete_recipe(Some(&backend), &mut day, 45, Duration::from_secs(1)).await;

        assert!(day.has_complete_recipe());
        assert_eq!(day.recipe.source.as_deref(), Some(FALLBACK_SOURCE));
    }

    #[tokio::test]
    async fn usable_backend_reply_wins_over_fallback() {
        let backend = ScriptedBackend(Ok(r#"{"ingredients":[{"name":"Chicken Thighs",
            "quantity":6,"unit":"pieces","category":"Meat"}],
            "instructions":["Step 1: Marinate.","Step 2: Grill."],"cooking_time":25}"#
            .to_owned()));
        let mut day = bare_day("Grilled Chicken");
        complete_recipe(Some(&backend), &mut day, 30, Duration::from_secs(1)).await;

        assert_eq!(day.ingredients.len(), 1);
        assert_eq!(day.ingredients[0].name, "Chicken Thighs");
        assert_eq!(day.recipe.instructions.len(), 2);
        assert_eq!(day.recipe.cooking_time_minutes, 25);
        assert_eq!(day.recipe.source.as_deref(), Some("scripted"));
    }

    #[tokio::test]
    async fn complete_days_are_untouched() {
        let backend = ScriptedBackend(Err(()));
        let mut day = bare_day("Stew");
        day.ingredients.push(Ingredient::new("Beef", 500.0, "grams", "Meat"));
        day.recipe.instructions.push("Simmer for an hour.".to_owned());
        let before = day.clone();

        complete_recipe(Some(&backend), &mut day, 30, Duration::from_secs(1)).await;
        assert_eq!(day, before);
    }

    #[tokio::test]
    async fn partial_day_keeps_existing_detail() {
        // Ingredients present, instructions missing: only instructions come
        // from the fallback.
        let mut day = bare_day("Stew");
        day.ingredients.push(Ingredient::new("Beef", 500.0, "grams", "Meat"));

        complete_recipe(None, &mut day, 30, Duration::from_secs(1)).await;
        assert_eq!(day.ingredients.len(), 1);
        assert_eq!(day.ingredients[0].name, "Beef");
        assert!(!day.recipe.instructions.is_empty());
    }
}
