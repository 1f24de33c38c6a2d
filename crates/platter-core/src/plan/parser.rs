//! Structural parsing of raw model replies.
//!
//! A reply is untrusted free text that usually, but not always, contains a
//! JSON document: sometimes bare, sometimes fenced in markdown, sometimes
//! wrapped in prose. Extraction tries the whole text first, then the first
//! fenced block, then the first balanced brace span. Nothing in the reply is
//! ever executed or evaluated; it only ever feeds `serde_json`.

use thiserror::Error;

use super::schema::{PlanDocument, RecipeDocument};

/// Errors from turning a raw reply into a schema-level document.
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("reply contains no JSON payload")]
    NoPayload,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document failed schema checks: {detail}")]
    Schema { detail: String },
}

/// Extract the JSON-looking payload from a raw reply.
///
/// Returns the whole trimmed text if it starts with `{`, otherwise the
/// contents of the first ```json fenced block, otherwise the first balanced
/// `{`..`}` span.
pub fn extract_json_payload(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    if let Some(fenced) = extract_fenced_block(trimmed) {
        return Some(fenced);
    }

    extract_balanced_braces(trimmed)
}

fn extract_fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip an optional language tag on the fence line.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    let inner = body[..close].trim();
    (!inner.is_empty()).then_some(inner)
}

fn extract_balanced_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => in_string = false,
                _ => escaped = false,
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and schema-check a full plan reply.
///
/// Schema checks reject documents that cannot possibly be repaired into a
/// plan (no days at all, days with blank meal titles); everything softer --
/// wrong day count, missing flags, empty recipes -- is left to the invariant
/// checker and repair passes.
pub fn parse_plan_document(raw: &str) -> Result<PlanDocument, PlanParseError> {
    let payload = extract_json_payload(raw).ok_or(PlanParseError::NoPayload)?;
    let doc: PlanDocument = serde_json::from_str(payload)?;

    if doc.days.is_empty() {
        return Err(PlanParseError::Schema {
            detail: "document contains no days".to_owned(),
        });
    }
    for (i, day) in doc.days.iter().enumerate() {
        if day.meal.trim().is_empty() {
            return Err(PlanParseError::Schema {
                detail: format!("day at position {i} has a blank meal title"),
            });
        }
    }

    Ok(doc)
}

/// Parse a narrow single-recipe reply (completeness backfill).
pub fn parse_recipe_document(raw: &str) -> Result<RecipeDocument, PlanParseError> {
    let payload = extract_json_payload(raw).ok_or(PlanParseError::NoPayload)?;
    let doc: RecipeDocument = serde_json::from_str(payload)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_DOC: &str = r#"{"days":[{"day":"Day 1","meal":"Fish pie",
        "description":"","is_remixed":true,"contains_oily_fish":true,
        "ingredients":[{"name":"Salmon","quantity":2,"unit":"fillets","category":"Fish"}],
        "preparation_instructions":["Bake."]}]}"#;

    #[test]
    fn parses_bare_json() {
        let doc = parse_plan_document(VALID_DOC).unwrap();
        assert_eq!(doc.days.len(), 1);
    }

    #[test]
    fn parses_json_inside_markdown_fence() {
        let raw = format!("Here is your meal plan!\n```json\n{VALID_DOC}\n```\nEnjoy!");
        let doc = parse_plan_document(&raw).unwrap();
        assert_eq!(doc.days[0].meal, "Fish pie");
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let raw = format!("Sure thing. {VALID_DOC} Let me know if you need swaps.");
        let doc = parse_plan_document(&raw).unwrap();
        assert_eq!(doc.days[0].meal, "Fish pie");
    }

    #[test]
    fn balanced_extraction_ignores_braces_inside_strings() {
        let raw = r#"note: {"days":[{"meal":"Stew }{ surprise"}]} end"#;
        let doc = parse_plan_document(raw).unwrap();
        assert_eq!(doc.days[0].meal, "Stew }{ surprise");
    }

    #[test]
    fn rejects_reply_with_no_json() {
        let err = parse_plan_document("I'm sorry, I can't do that.").unwrap_err();
        assert!(matches!(err, PlanParseError::NoPayload), "got: {err}");
    }

    #[test]
    fn rejects_truncated_json() {
        let truncated = &VALID_DOC[..VALID_DOC.len() - 20];
        let err = parse_plan_document(truncated).unwrap_err();
        assert!(
            matches!(err, PlanParseError::NoPayload | PlanParseError::Json(_)),
            "got: {err}"
        );
    }

    #[test]
    fn rejects_empty_day_list() {
        let err = parse_plan_document(r#"{"days":[]}"#).unwrap_err();
        assert!(matches!(err, PlanParseError::Schema { .. }), "got: {err}");
    }

    #[test]
    fn rejects_blank_meal_title() {
        let err = parse_plan_document(r#"{"days":[{"meal":"  "}]}"#).unwrap_err();
        assert!(matches!(err, PlanParseError::Schema { .. }), "got: {err}");
    }

    #[test]
    fn recipe_document_parses_from_fence() {
        let raw = "```json\n{\"ingredients\":[\"2 eggs\"],\"instructions\":[\"Whisk.\"]}\n```";
        let doc = parse_recipe_document(raw).unwrap();
        assert_eq!(doc.instructions, vec!["Whisk."]);
    }
}
