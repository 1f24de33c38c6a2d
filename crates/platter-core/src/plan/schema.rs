//! Wire schema for model-generated documents.
//!
//! These types deserialize the JSON contract the prompt asks for, leniently:
//! obviously-equivalent shapes are coerced (numeric strings and simple
//! fractions to numbers, stringly booleans to booleans, missing optional
//! lists to empty), because a generative model cannot be trusted to hit the
//! strict shape every time. Anything beyond these coercions is a schema
//! error handled by the parser.

use serde::{Deserialize, Deserializer};

/// Top-level document: a sequence of day objects.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub days: Vec<DayEntry>,
}

/// One generated day.
#[derive(Debug, Clone, Deserialize)]
pub struct DayEntry {
    /// Day label as produced by the model; slot assignment tolerates
    /// missing, duplicate, or unparseable labels by falling back to
    /// position.
    #[serde(default)]
    pub day: Option<String>,
    pub meal: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_remixed: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub contains_oily_fish: bool,
    #[serde(default)]
    pub ingredients: Vec<IngredientEntry>,
    #[serde(default)]
    pub preparation_instructions: Vec<String>,
    #[serde(default)]
    pub cooking_time: Option<u32>,
}

/// One generated ingredient line.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientEntry {
    pub name: String,
    #[serde(default = "default_quantity", deserialize_with = "flexible_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: String,
}

/// Narrow single-recipe document used by the completeness backfill.
///
/// Ingredients may arrive as structured entries or as bare strings
/// (`"2 salmon fillets"`); bare strings become unit-less entries with
/// quantity 1.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDocument {
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub cooking_time: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeIngredient {
    Structured(IngredientEntry),
    Bare(String),
}

impl RecipeIngredient {
    pub fn into_entry(self) -> IngredientEntry {
        match self {
            Self::Structured(entry) => entry,
            Self::Bare(name) => IngredientEntry {
                name,
                quantity: 1.0,
                unit: String::new(),
                category: String::new(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Coercions
// ---------------------------------------------------------------------------

fn default_quantity() -> f64 {
    1.0
}

/// Accept a number, a numeric string, or a simple fraction string
/// (`"1/2"`). Non-numeric text ("to taste") falls back to 1, matching the
/// generator's own default for unparseable quantities.
fn flexible_quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_quantity(&value))
}

fn coerce_quantity(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(1.0),
        serde_json::Value::String(s) => parse_quantity_str(s).unwrap_or(1.0),
        _ => 1.0,
    }
}

fn parse_quantity_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Some((num, denom)) = s.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let denom: f64 = denom.trim().parse().ok()?;
        if denom == 0.0 {
            return None;
        }
        return Some(num / denom);
    }
    s.parse().ok()
}

/// Accept a boolean or a `"true"`/`"false"` string (any casing). Anything
/// else is false.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}
