//! Remix policy engine.
//!
//! Deterministic, non-AI transformations that enforce the two plan-level
//! policy invariants: at least one day derived from prior history (a
//! "remix"), and at least one oily-fish day. Which day gets picked when
//! none qualifies is a documented default policy, configurable through
//! [`RemixPolicy`], not an inference about taste.

use platter_store::{Ingredient, MealDay, MealPlan};
use tracing::debug;

/// Title/description pattern pairs for deriving a remixed meal name from a
/// base meal. `{}` is replaced with the base title. Selection is by a
/// byte-sum hash of the base title so the same title always remixes the
/// same way.
const REMIX_PATTERNS: &[(&str, &str)] = &[
    (
        "Deconstructed {}",
        "A creative deconstructed version of {}, with all the flavours you love presented in a new way.",
    ),
    (
        "{} Bowl",
        "Inspired by {}, served as a customizable bowl with the ingredients arranged separately.",
    ),
    (
        "Loaded {} Platter",
        "A family-style platter based on {}, with extra toppings and sides for everyone to share.",
    ),
    (
        "One-Pan {}",
        "A simplified one-pan version of {}, with the same great taste but easier cleanup.",
    ),
    (
        "Crispy {}",
        "A crispier, more textured version of {} that adds a satisfying crunch to a family favourite.",
    ),
    (
        "Stuffed {}",
        "A creative stuffed version of {}, with fillings that complement the original flavours.",
    ),
    (
        "Sheet Pan {}",
        "A convenient sheet pan version of {}, with everything roasted together for maximum flavour.",
    ),
    (
        "Mini {}",
        "Fun, bite-sized versions of {}, perfect for little hands and customizable for each family member.",
    ),
    (
        "{} Skewers",
        "The flavours of {} threaded onto skewers for a fun, interactive meal.",
    ),
    (
        "{} Stir-Fry",
        "A quick stir-fry take on {}, keeping the flavours while adding fresh vegetables.",
    ),
];

/// Policy knobs for the deterministic repair passes.
#[derive(Debug, Clone)]
pub struct RemixPolicy {
    /// Substrings that mark a meal or ingredient as containing oily fish.
    pub oily_fish_keywords: Vec<String>,
    /// Ingredient injected when a day is converted to an oily-fish day.
    pub canonical_oily_fish: Ingredient,
    /// Substrings that make a day a poor candidate for fish conversion.
    pub conflict_markers: Vec<String>,
}

impl Default for RemixPolicy {
    fn default() -> Self {
        Self {
            oily_fish_keywords: [
                "salmon", "mackerel", "sardine", "trout", "herring", "anchov", "pilchard", "tuna",
            ]
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
            canonical_oily_fish: Ingredient::new("Salmon Fillet", 2.0, "pieces", "Fish"),
            conflict_markers: ["chocolate", "custard", "pancake", "waffle", "ice cream", "dessert"]
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl RemixPolicy {
    /// Whether the text names an oily fish.
    pub fn is_oily_fish(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.oily_fish_keywords.iter().any(|k| lower.contains(k))
    }

    /// Derive a remixed title and description for a base meal.
    /// Deterministic for a given base title.
    pub fn remix_title(&self, base: &str) -> (String, String) {
        let idx = byte_sum(base) % REMIX_PATTERNS.len();
        let (title_pattern, desc_pattern) = REMIX_PATTERNS[idx];
        (
            title_pattern.replace("{}", base),
            desc_pattern.replace("{}", base),
        )
    }

    /// Ensure at least one day is marked `is_remixed`.
    ///
    /// Picks the day whose title shares the most case-folded tokens with any
    /// prior-plan meal, ties broken by earliest day index; with no history,
    /// the first day. The chosen day keeps its meal and gains a description
    /// note tying it back to the prior meal.
    pub fn ensure_remixed_day(&self, days: &mut [MealDay], history: &[MealPlan]) {
        if days.is_empty() || days.iter().any(|d| d.is_remixed) {
            return;
        }

        let prior_titles: Vec<&str> = history.iter().flat_map(|p| p.meal_titles()).collect();

        let mut best_index = 0;
        let mut best: Option<(usize, &str)> = None;
        for (i, day) in days.iter().enumerate() {
            for prior in &prior_titles {
                let score = shared_tokens(&day.meal, prior);
                if score > 0 && best.is_none_or(|(s, _)| score > s) {
                    best = Some((score, prior));
                    best_index = i;
                }
            }
        }

        let day = &mut days[best_index];
        day.is_remixed = true;
        if let Some((_, prior)) = best {
            if !day.description.is_empty() {
                day.description.push(' ');
            }
            day.description
                .push_str(&format!("A twist on a previous favourite, {prior}."));
        }
        debug!(day = %day.day, meal = %day.meal, "marked day as remixed");
    }

    /// Ensure at least one day is an oily-fish day.
    ///
    /// First repairs flags: a day that already names an oily fish in its
    /// title or ingredients only needs `contains_oily_fish` set. Otherwise
    /// the day with the fewest conflict markers (earliest index on ties)
    /// gets the canonical oily-fish ingredient injected.
    pub fn ensure_oily_fish(&self, days: &mut [MealDay]) {
        if days.is_empty() || days.iter().any(|d| d.contains_oily_fish) {
            return;
        }

        // Flag repair: the fish is already there, the flag is not.
        for day in days.iter_mut() {
            let named = self.is_oily_fish(&day.meal)
                || day.ingredients.iter().any(|i| self.is_oily_fish(&i.name));
            if named {
                day.contains_oily_fish = true;
                debug!(day = %day.day, meal = %day.meal, "repaired oily fish flag");
                return;
            }
        }

        // Conversion: pick the least conflicting day and inject the
        // canonical ingredient.
        let mut best_index = 0;
        let mut best_conflicts = usize::MAX;
        for (i, day) in days.iter().enumerate() {
            let conflicts = self.conflict_count(day);
            if conflicts < best_conflicts {
                best_conflicts = conflicts;
                best_index = i;
            }
        }

        let day = &mut days[best_index];
        day.contains_oily_fish = true;
        day.ingredients.push(self.canonical_oily_fish.clone());
        if !day.description.is_empty() {
            day.description.push(' ');
        }
        day.description.push_str(&format!(
            "Served with {} to bring oily fish into the week.",
            self.canonical_oily_fish.name.to_lowercase()
        ));
        debug!(day = %day.day, meal = %day.meal, "converted day to oily fish");
    }

    fn conflict_count(&self, day: &MealDay) -> usize {
        let mut text = day.meal.to_lowercase();
        for ingredient in &day.ingredients {
            text.push(' ');
            text.push_str(&ingredient.name.to_lowercase());
        }
        self.conflict_markers.iter().filter(|m| text.contains(m.as_str())).count()
    }
}

fn byte_sum(text: &str) -> usize {
    text.bytes().map(usize::from).sum()
}

/// Number of case-folded tokens two titles share.
fn shared_tokens(a: &str, b: &str) -> usize {
    let a_tokens: Vec<String> = a.split_whitespace().map(|t| t.to_lowercase()).collect();
    b.split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| a_tokens.contains(t))
        .count()
}
