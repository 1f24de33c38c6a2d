//! Ingredient-name normalization.
//!
//! Rule-based normalization handles the common near-duplicates (case,
//! plurals, preparation qualifiers, regional aliases). A single batched
//! backend call can additionally canonicalize what the rules miss; that call
//! is strictly best-effort and any failure leaves the rule-based result in
//! place.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::{GenerateRequest, ModelBackend};
use crate::plan::parser::extract_json_payload;
use crate::prompt::{MAX_TERM_CHARS, sanitize_term};

/// Preparation and size qualifiers dropped during normalization.
const QUALIFIERS: &[&str] = &[
    "fresh", "frozen", "dried", "chopped", "diced", "sliced", "minced", "grated", "peeled",
    "cooked", "raw", "whole", "large", "small", "medium",
];

/// Regional and brand-style aliases folded to one canonical name.
const ALIASES: &[(&str, &str)] = &[
    ("tomato sauce", "pasta sauce"),
    ("spaghetti sauce", "pasta sauce"),
    ("marinara", "pasta sauce"),
    ("bell pepper", "pepper"),
    ("capsicum", "pepper"),
    ("scallion", "green onion"),
    ("spring onion", "green onion"),
];

/// Normalize one ingredient name with rules only: case-fold, strip
/// punctuation and qualifier words, singularize, and apply the alias table.
pub fn rule_normalize(name: &str) -> String {
    let lower: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c == ',' || c == '.' || c == ';' { ' ' } else { c })
        .collect();

    let mut words: Vec<String> = lower
        .split_whitespace()
        .filter(|w| !QUALIFIERS.contains(w))
        .map(singularize)
        .collect();
    if words.is_empty() {
        // Everything was a qualifier; fall back to the folded original.
        words = lower.split_whitespace().map(singularize).collect();
    }

    let mut joined = words.join(" ");
    for (from, to) in ALIASES {
        if joined.contains(from) {
            joined = joined.replace(from, to);
        }
    }
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Conservative singular form of one word.
fn singularize(word: &str) -> String {
    if word.len() > 3 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.len() > 3
        && (word.ends_with("oes")
            || word.ends_with("ches")
            || word.ends_with("shes")
            || word.ends_with("sses")
            || word.ends_with("xes"))
    {
        return word[..word.len() - 2].to_owned();
    }
    if word.len() > 2 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_owned();
    }
    word.to_owned()
}

/// Ask the backend to canonicalize a batch of raw names in one call.
///
/// Returns a raw-name -> canonical-name map, or `None` on any backend or
/// parse failure; the caller falls back to rule-based grouping. Mapped
/// values are untrusted and are re-normalized by the caller before use.
pub async fn llm_canonicalize(
    backend: &dyn ModelBackend,
    names: &[String],
    timeout: Duration,
) -> Option<HashMap<String, String>> {
    if names.is_empty() {
        return Some(HashMap::new());
    }

    let listed: Vec<String> = names.iter().map(|n| sanitize_term(n)).collect();
    let system = "You are a helpful assistant that normalizes grocery shopping lists.".to_owned();
    let user = format!(
        "Canonicalize the ingredient names below so that different spellings of the same \
         ingredient share one name (for example \"Tomatoes, chopped\" and \"tomato\" are both \
         \"tomato\").\n\nIngredient names:\n{}\n\nReply with a JSON object mapping every input \
         name to its canonical name, and nothing else.",
        listed.join("\n")
    );

    let request = GenerateRequest::new(system, user)
        .with_timeout(timeout)
        .with_temperature(0.2);

    let raw = match backend.generate(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "ingredient canonicalization call failed");
            return None;
        }
    };

    let payload = extract_json_payload(&raw)?;
    let mapping: HashMap<String, String> = match serde_json::from_str(payload) {
        Ok(mapping) => mapping,
        Err(e) => {
            warn!(error = %e, "ingredient canonicalization reply was not a name map");
            return None;
        }
    };

    // Only keep sane entries for names we actually asked about.
    let mapping: HashMap<String, String> = mapping
        .into_iter()
        .filter(|(k, v)| {
            !v.trim().is_empty() && v.len() <= MAX_TERM_CHARS && names.iter().any(|n| n == k)
        })
        .collect();

    debug!(mapped = mapping.len(), "ingredient canonicalization succeeded");
    Some(mapping)
}
