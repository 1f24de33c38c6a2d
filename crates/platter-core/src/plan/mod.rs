//! Plan generation: wire schema, structural parsing, invariant checks, and
//! the retry/repair pipeline.

pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod validate;

pub use parser::{PlanParseError, extract_json_payload, parse_plan_document, parse_recipe_document};
pub use pipeline::{Planner, PlannerConfig};
pub use schema::{DayEntry, IngredientEntry, PlanDocument, RecipeDocument};
pub use validate::{InvariantViolation, check_invariants, describe_violations};
