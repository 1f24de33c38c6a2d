//! Plan-level invariant checks.
//!
//! Runs after structural parsing and after repair. Violations are collected
//! rather than short-circuited so the repair passes can see everything that
//! is wrong with a draft at once.

use platter_store::{DaySlot, MealPlan};
use thiserror::Error;

/// One violated plan invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("plan has {actual} day(s), expected exactly {expected}")]
    WrongDayCount { expected: usize, actual: usize },

    #[error("day slot {0} appears more than once")]
    DuplicateDay(DaySlot),

    #[error("no day contains oily fish")]
    NoOilyFishDay,

    #[error("no day is marked as remixed")]
    NoRemixedDay,

    #[error("{0} has no ingredients")]
    EmptyIngredients(DaySlot),

    #[error("{0} has no preparation steps")]
    EmptyInstructions(DaySlot),
}

/// Check every final-plan invariant, returning all violations found.
pub fn check_invariants(plan: &MealPlan, meal_count: usize) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if plan.days.len() != meal_count {
        violations.push(InvariantViolation::WrongDayCount {
            expected: meal_count,
            actual: plan.days.len(),
        });
    }

    let mut seen = [false; 7];
    for day in &plan.days {
        let idx = day.day.index();
        if seen[idx] {
            violations.push(InvariantViolation::DuplicateDay(day.day));
        }
        seen[idx] = true;
    }

    if !plan.days.iter().any(|d| d.contains_oily_fish) {
        violations.push(InvariantViolation::NoOilyFishDay);
    }

    if !plan.days.iter().any(|d| d.is_remixed) {
        violations.push(InvariantViolation::NoRemixedDay);
    }

    for day in &plan.days {
        if day.ingredients.is_empty() {
            violations.push(InvariantViolation::EmptyIngredients(day.day));
        }
        if !day.recipe.instructions.iter().any(|s| !s.trim().is_empty()) {
            violations.push(InvariantViolation::EmptyInstructions(day.day));
        }
    }

    violations
}

/// Render a violation list for error messages and logs.
pub fn describe_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
