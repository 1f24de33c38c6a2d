//! Prompt construction for full-plan generation.
//!
//! Pure functions: family state in, bounded prompt text out. All free-text
//! values (preferences and history titles alike) pass through
//! [`sanitize_term`] before being embedded, so user-entered or
//! model-originated food names can neither blow up the prompt size nor smuggle
//! instructions into it.

use platter_store::{FamilyProfile, PreferenceSet};

/// Per-item length cap applied by [`sanitize_term`].
pub const MAX_TERM_CHARS: usize = 64;
/// Per-list item cap applied by [`sanitize_list`].
pub const MAX_TERMS_PER_LIST: usize = 32;

/// Strip control characters and curly braces, collapse whitespace, and cap
/// the length of one embedded term.
pub fn sanitize_term(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && *c != '{' && *c != '}')
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_TERM_CHARS).collect()
}

/// Sanitize every term in a list, dropping entries that sanitize to nothing
/// and capping the total count.
pub fn sanitize_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| sanitize_term(s))
        .filter(|s| !s.is_empty())
        .take(MAX_TERMS_PER_LIST)
        .collect()
}

/// Inputs for one full-plan prompt.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub profile: FamilyProfile,
    pub preferences: PreferenceSet,
    /// Meal titles from recent history, to steer the model away from
    /// repetition.
    pub recent_meals: Vec<String>,
    pub weekday_minutes: u32,
    pub weekend_minutes: u32,
}

/// A system/user prompt pair ready for a backend call.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
}

impl BuiltPrompt {
    /// The same prompt with a stricter output instruction appended, used for
    /// retry attempts after a parse or schema failure.
    pub fn corrective(&self) -> Self {
        let mut user = self.user.clone();
        user.push_str(
            "\n\nYour previous reply was not a valid JSON document matching the schema. \
             Reply again with nothing but the JSON document: no prose, no markdown fences, \
             no trailing commentary.",
        );
        Self {
            system: self.system.clone(),
            user,
        }
    }
}

/// JSON shape the model must produce, embedded verbatim in every plan prompt.
const SCHEMA_EXAMPLE: &str = r#"{
  "days": [
    {
      "day": "Day 1",
      "meal": "Quick Salmon with Roasted Vegetables",
      "description": "Pan-fried salmon with roasted broccoli, carrots and cherry tomatoes.",
      "is_remixed": false,
      "contains_oily_fish": true,
      "ingredients": [
        {"name": "Salmon Fillet", "quantity": 2, "unit": "pieces", "category": "Fish"},
        {"name": "Broccoli", "quantity": 1, "unit": "head", "category": "Produce"},
        {"name": "Carrots", "quantity": 3, "unit": "medium", "category": "Produce"},
        {"name": "Cherry Tomatoes", "quantity": 1, "unit": "punnet", "category": "Produce"},
        {"name": "Olive Oil", "quantity": 1, "unit": "tbsp", "category": "Pantry"}
      ],
      "preparation_instructions": [
        "Step 1: Toss the vegetables with olive oil and roast for 15 minutes.",
        "Step 2: Pan-fry the salmon for 10 minutes.",
        "Step 3: Serve together."
      ]
    }
  ]
}"#;

/// Build the full-plan prompt.
///
/// The hard constraints (meal count, oily fish, remix) are stated separately
/// and numbered so the parser's corrective retries have something concrete to
/// point back at.
pub fn build_plan_prompt(ctx: &PromptContext) -> BuiltPrompt {
    let meal_count = ctx.profile.meal_count;
    let liked = sanitize_list(&ctx.preferences.liked);
    let disliked = sanitize_list(&ctx.preferences.disliked);
    let recent = sanitize_list(&ctx.recent_meals);

    let mut system = String::with_capacity(1024);
    system.push_str(&format!(
        "You are an expert meal planning assistant for a family of {}",
        ctx.profile.members
    ));
    match ctx.profile.children_ages.len() {
        0 => system.push_str(".\n"),
        n => {
            let ages: Vec<String> = ctx
                .profile
                .children_ages
                .iter()
                .map(|a| a.to_string())
                .collect();
            system.push_str(&format!(
                " with {n} {} aged {}.\n",
                if n == 1 { "child" } else { "children" },
                ages.join(", ")
            ));
        }
    }
    system.push_str(&format!(
        "Weekday meals (Day 1 to Day 5) should take around {} minutes to prepare and cook; \
         weekend meals (Day 6 and Day 7) may take up to {} minutes.\n",
        ctx.weekday_minutes, ctx.weekend_minutes
    ));
    system.push_str(
        "Every meal must include a significant meat or fish protein and at least three \
         different vegetables, served with suitable accompaniments. All meals should be \
         healthy, family-friendly, and varied.\n",
    );

    let mut user = String::with_capacity(2048);
    user.push_str(&format!("Create a meal plan with {meal_count} meals for the family.\n\n"));
    user.push_str(&format!("PREFERRED MEALS: {}\n", liked.join(", ")));
    user.push_str(&format!("DISLIKED FOODS: {}\n", disliked.join(", ")));
    user.push_str(&format!("RECENT MEALS (avoid repeating): {}\n\n", recent.join(", ")));

    user.push_str("Every constraint below is mandatory:\n");
    user.push_str(&format!(
        "1. The plan must contain exactly {meal_count} days, labelled \"Day 1\" through \
         \"Day {meal_count}\", each with a unique meal.\n"
    ));
    user.push_str(
        "2. At least one meal must contain oily fish (salmon, mackerel, sardines, or trout) \
         and carry \"contains_oily_fish\": true.\n",
    );
    user.push_str(
        "3. Exactly one meal must be a creative remix of a preferred meal, carrying \
         \"is_remixed\": true; use the preferred meals to understand the family's taste.\n",
    );
    user.push_str(
        "4. Every meal must list its ingredients (name, quantity, unit, category) and \
         step-by-step preparation instructions with timings.\n\n",
    );

    user.push_str("Reply with a JSON document exactly matching this shape:\n");
    user.push_str(SCHEMA_EXAMPLE);
    user.push('\n');

    BuiltPrompt { system, user }
}
