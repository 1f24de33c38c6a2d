//! Deterministic repair: completeness backfill and the remix/oily-fish
//! policy engine.

pub mod backfill;
pub mod remix;

pub use backfill::{FALLBACK_SOURCE, complete_recipe, synthesize_recipe};
pub use remix::RemixPolicy;
