use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Day slots
// ---------------------------------------------------------------------------

/// A slot in the fixed weekly cycle. A plan never repeats a slot.
///
/// Slots 6 and 7 are weekend slots and carry the longer cooking-time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DaySlot {
    Day1,
    Day2,
    Day3,
    Day4,
    Day5,
    Day6,
    Day7,
}

impl DaySlot {
    /// All slots in weekly order.
    pub const ALL: [DaySlot; 7] = [
        Self::Day1,
        Self::Day2,
        Self::Day3,
        Self::Day4,
        Self::Day5,
        Self::Day6,
        Self::Day7,
    ];

    /// Zero-based position in the weekly cycle.
    pub fn index(self) -> usize {
        match self {
            Self::Day1 => 0,
            Self::Day2 => 1,
            Self::Day3 => 2,
            Self::Day4 => 3,
            Self::Day5 => 4,
            Self::Day6 => 5,
            Self::Day7 => 6,
        }
    }

    /// Slot at a zero-based position, if it is within the weekly cycle.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Weekend slots get the relaxed cooking-time budget.
    pub fn is_weekend(self) -> bool {
        self.index() >= 5
    }
}

impl fmt::Display for DaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}", self.index() + 1)
    }
}

impl FromStr for DaySlot {
    type Err = DaySlotParseError;

    /// Accepts `"Day N"`, a bare number, or a weekday name mapped onto the
    /// cycle by position (`monday` is `Day 1`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();

        let by_weekday = match normalized.as_str() {
            "monday" => Some(Self::Day1),
            "tuesday" => Some(Self::Day2),
            "wednesday" => Some(Self::Day3),
            "thursday" => Some(Self::Day4),
            "friday" => Some(Self::Day5),
            "saturday" => Some(Self::Day6),
            "sunday" => Some(Self::Day7),
            _ => None,
        };
        if let Some(slot) = by_weekday {
            return Ok(slot);
        }

        let digits = normalized.strip_prefix("day").unwrap_or(&normalized).trim();
        if let Ok(n) = digits.parse::<usize>() {
            if (1..=7).contains(&n) {
                return Ok(Self::ALL[n - 1]);
            }
        }

        Err(DaySlotParseError(s.to_owned()))
    }
}

impl From<DaySlot> for String {
    fn from(slot: DaySlot) -> Self {
        slot.to_string()
    }
}

impl TryFrom<String> for DaySlot {
    type Error = DaySlotParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Error returned when parsing an invalid [`DaySlot`] string.
#[derive(Debug, Clone)]
pub struct DaySlotParseError(pub String);

impl fmt::Display for DaySlotParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid day label: {:?}", self.0)
    }
}

impl std::error::Error for DaySlotParseError {}

// ---------------------------------------------------------------------------
// Family profile and preferences
// ---------------------------------------------------------------------------

/// Who the plan is for: household size, children's ages, and how many meals
/// each generated plan should contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyProfile {
    pub members: u32,
    pub children_ages: Vec<u8>,
    /// Target number of meals per plan. Clamped to [`MEAL_COUNT_RANGE`] on
    /// every write path.
    pub meal_count: u8,
}

/// Allowed range for [`FamilyProfile::meal_count`].
pub const MEAL_COUNT_RANGE: std::ops::RangeInclusive<u8> = 1..=7;

/// Clamp a requested meal count into [`MEAL_COUNT_RANGE`].
pub fn clamp_meal_count(count: u8) -> u8 {
    count.clamp(*MEAL_COUNT_RANGE.start(), *MEAL_COUNT_RANGE.end())
}

impl Default for FamilyProfile {
    fn default() -> Self {
        Self {
            members: 4,
            children_ages: vec![6, 8],
            meal_count: 3,
        }
    }
}

/// Liked and disliked foods. Free text, case-insensitively deduplicated.
///
/// Invariant: no value (after case-folding) appears in both sets. Inserting
/// into one side removes any match from the opposing side first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSet {
    pub liked: Vec<String>,
    pub disliked: Vec<String>,
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

fn remove_from(list: &mut Vec<String>, food: &str) -> bool {
    let key = fold(food);
    let before = list.len();
    list.retain(|f| fold(f) != key);
    list.len() != before
}

impl PreferenceSet {
    /// Add a liked food, removing any disliked entry with the same
    /// normalized value. Returns `false` if it was already liked.
    pub fn add_liked(&mut self, food: &str) -> bool {
        remove_from(&mut self.disliked, food);
        if self.liked.iter().any(|f| fold(f) == fold(food)) {
            return false;
        }
        self.liked.push(food.trim().to_owned());
        true
    }

    /// Add a disliked food, removing any liked entry with the same
    /// normalized value. Returns `false` if it was already disliked.
    pub fn add_disliked(&mut self, food: &str) -> bool {
        remove_from(&mut self.liked, food);
        if self.disliked.iter().any(|f| fold(f) == fold(food)) {
            return false;
        }
        self.disliked.push(food.trim().to_owned());
        true
    }

    /// Remove a food from the liked (or disliked) set. Returns whether an
    /// entry was removed.
    pub fn remove(&mut self, food: &str, liked: bool) -> bool {
        if liked {
            remove_from(&mut self.liked, food)
        } else {
            remove_from(&mut self.disliked, food)
        }
    }

    pub fn is_liked(&self, food: &str) -> bool {
        self.liked.iter().any(|f| fold(f) == fold(food))
    }

    pub fn is_disliked(&self, food: &str) -> bool {
        self.disliked.iter().any(|f| fold(f) == fold(food))
    }
}

// ---------------------------------------------------------------------------
// Recipes and meals
// ---------------------------------------------------------------------------

/// One ingredient line within a recipe. Two ingredients are "the same" only
/// after shopping-list name normalization; there is no identity beyond the
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    /// Unit of measure; empty for countable items.
    #[serde(default)]
    pub unit: String,
    /// Shopping-list grouping only.
    #[serde(default)]
    pub category: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: f64, unit: &str, category: &str) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.to_owned(),
            category: category.to_owned(),
        }
    }
}

/// How to cook a meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub cooking_time_minutes: u32,
    /// Ordered, non-empty step strings.
    pub instructions: Vec<String>,
    /// Where the recipe came from (e.g. a backend name or
    /// `"generated-fallback"`).
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One day of a meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDay {
    pub day: DaySlot,
    pub meal: String,
    pub description: String,
    pub is_remixed: bool,
    pub contains_oily_fish: bool,
    pub ingredients: Vec<Ingredient>,
    pub recipe: Recipe,
}

impl MealDay {
    /// A recipe is complete when it has at least one ingredient and one
    /// instruction step.
    pub fn has_complete_recipe(&self) -> bool {
        !self.ingredients.is_empty()
            && self.recipe.instructions.iter().any(|s| !s.trim().is_empty())
    }
}

/// A finalized weekly plan.
///
/// Plans returned by the generation pipeline always satisfy: exact day count,
/// at least one oily-fish day, at least one remixed day, complete recipes,
/// and no duplicate day slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: Uuid,
    pub week_starting: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub days: Vec<MealDay>,
}

impl MealPlan {
    /// Meal titles in day order.
    pub fn meal_titles(&self) -> impl Iterator<Item = &str> {
        self.days.iter().map(|d| d.meal.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shopping list
// ---------------------------------------------------------------------------

/// One merged line of a shopping list. Derived from a plan, never persisted
/// as a standalone entity (the store only caches it per plan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    /// Normalized ingredient name.
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    /// Raw ingredient names that were merged into this line.
    #[serde(default)]
    pub sources: Vec<String>,
}
