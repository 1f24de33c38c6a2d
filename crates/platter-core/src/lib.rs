//! Core generation pipeline for platter.
//!
//! Control flow for one generation request:
//! history + preferences -> prompt builder -> model backend -> parser ->
//! (completeness backfill, remix policy as needed) -> finalized plan ->
//! history append -> shopping list aggregation on demand.
//!
//! The model is an untrusted, non-deterministic producer; everything it
//! returns is parsed defensively and repaired deterministically until the
//! plan invariants hold, or the request fails without touching history.

pub mod backend;
pub mod cart;
pub mod error;
pub mod plan;
pub mod prompt;
pub mod repair;
pub mod shopping;

pub use backend::{BackendError, BackendRegistry, GenerateRequest, ModelBackend};
pub use error::GenerationError;
pub use plan::{Planner, PlannerConfig};
pub use repair::RemixPolicy;
