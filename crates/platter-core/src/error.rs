//! Terminal error taxonomy for the generation pipeline.
//!
//! Transient conditions (backend timeouts, parse failures, invariant
//! violations) are handled inside the pipeline's retry/repair ladder and
//! never escape it; what surfaces here is only what the caller can act on.

use platter_store::StoreError;
use thiserror::Error;

/// Errors surfaced by [`crate::plan::Planner::generate_plan`].
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Retries and deterministic repair both failed to produce a minimally
    /// valid plan. History is left untouched.
    #[error("meal plan generation failed after {attempts} attempt(s): {reason}")]
    Failed { attempts: u32, reason: String },

    /// Persisting to the preference/history store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
