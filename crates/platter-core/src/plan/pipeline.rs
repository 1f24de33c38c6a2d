//! Plan generation pipeline.
//!
//! One generation request walks a bounded ladder: prompt the backend, parse
//! the reply, retry with a corrective instruction on parse or schema
//! failure, then hand whatever was recovered to deterministic repair (day
//! count, completeness backfill, remix and oily-fish policy). The ladder
//! makes at most `1 + retry_limit` full-plan model calls plus one narrow
//! call per incomplete day, so every request terminates; and a plan is only
//! ever returned after the final invariant check passes. Failures leave
//! history untouched.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use platter_store::{
    DaySlot, Ingredient, MealDay, MealPlan, PlanStore, PreferenceSet, Recipe, ShoppingListItem,
    clamp_meal_count,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{GenerateRequest, ModelBackend};
use crate::error::GenerationError;
use crate::plan::parser::parse_plan_document;
use crate::plan::schema::PlanDocument;
use crate::plan::validate::{check_invariants, describe_violations};
use crate::prompt::{BuiltPrompt, PromptContext, build_plan_prompt};
use crate::repair::backfill::complete_recipe;
use crate::repair::remix::RemixPolicy;
use crate::shopping::aggregate::{AggregateOptions, shopping_list};

/// How many recent plans feed the "avoid repeating" prompt section and the
/// fallback meal filter.
const RECENT_PLAN_WINDOW: usize = 2;

/// Tunables for one planner instance.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Additional full-plan attempts after the first one.
    pub retry_limit: u32,
    /// Per-backend-call budget.
    pub request_timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub weekday_minutes: u32,
    pub weekend_minutes: u32,
    /// Let the backend canonicalize shopping-list names (one batched call).
    pub normalize_with_backend: bool,
    pub aggregate: AggregateOptions,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            retry_limit: 2,
            request_timeout: Duration::from_secs(60),
            max_tokens: 2000,
            temperature: 0.7,
            weekday_minutes: 30,
            weekend_minutes: 60,
            normalize_with_backend: true,
            aggregate: AggregateOptions::default(),
        }
    }
}

/// The pipeline owner: exclusive user of the store for the duration of one
/// generation request.
pub struct Planner {
    backend: Box<dyn ModelBackend>,
    store: Arc<PlanStore>,
    policy: RemixPolicy,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(backend: Box<dyn ModelBackend>, store: Arc<PlanStore>) -> Self {
        Self {
            backend,
            store,
            policy: RemixPolicy::default(),
            config: PlannerConfig::default(),
        }
    }

    pub fn with_policy(mut self, policy: RemixPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Generate one meal plan, append it to history, and cache its shopping
    /// list.
    ///
    /// On success the returned plan satisfies every plan invariant. On
    /// [`GenerationError::Failed`] nothing has been appended.
    pub async fn generate_plan(&self) -> Result<MealPlan, GenerationError> {
        let mut profile = self.store.profile().await;
        profile.meal_count = clamp_meal_count(profile.meal_count);
        let preferences = self.store.preferences().await;
        let history = self.store.history().await;
        let meal_count = usize::from(profile.meal_count);

        let recent_meals: Vec<String> = history
            .iter()
            .rev()
            .take(RECENT_PLAN_WINDOW)
            .flat_map(|p| p.meal_titles())
            .map(str::to_owned)
            .collect();

        let prompt = build_plan_prompt(&PromptContext {
            profile: profile.clone(),
            preferences: preferences.clone(),
            recent_meals: recent_meals.clone(),
            weekday_minutes: self.config.weekday_minutes,
            weekend_minutes: self.config.weekend_minutes,
        });

        let (document, attempts) = self.attempt_generation(&prompt).await;

        let draft = document
            .map(|doc| self.convert_days(doc))
            .unwrap_or_default();

        let days = match self
            .repair(draft, &preferences, &recent_meals, &history, meal_count)
            .await
        {
            Ok(days) => days,
            Err(reason) => {
                warn!(attempts, %reason, "generation failed; history left untouched");
                return Err(GenerationError::Failed { attempts, reason });
            }
        };

        let now = Utc::now();
        let plan = MealPlan {
            id: Uuid::new_v4(),
            week_starting: next_week_start(now),
            generated_at: now,
            days,
        };

        let violations = check_invariants(&plan, meal_count);
        if !violations.is_empty() {
            let reason = describe_violations(&violations);
            warn!(attempts, %reason, "repaired plan still invalid; history left untouched");
            return Err(GenerationError::Failed { attempts, reason });
        }

        self.store.append_plan(plan.clone()).await?;
        info!(plan_id = %plan.id, days = plan.days.len(), attempts, "meal plan generated");

        // Cache the shopping list; failure to cache never fails the
        // generation that already succeeded.
        let items = self.shopping_list_for(&plan).await;
        if let Err(e) = self.store.store_shopping_list(plan.id, items).await {
            warn!(plan_id = %plan.id, error = %e, "failed to cache shopping list");
        }

        Ok(plan)
    }

    /// Derive (or re-derive) the shopping list for a plan.
    pub async fn shopping_list_for(&self, plan: &MealPlan) -> Vec<ShoppingListItem> {
        let backend = self
            .config
            .normalize_with_backend
            .then_some(self.backend.as_ref());
        shopping_list(plan, backend, self.config.request_timeout, self.config.aggregate).await
    }

    // -- generation ladder ---------------------------------------------------

    /// Run the bounded full-plan attempt loop.
    ///
    /// Returns the last successfully parsed document (if any) and the number
    /// of attempts consumed. Backend errors and parse failures both consume
    /// an attempt; parse failures additionally switch to the corrective
    /// prompt.
    async fn attempt_generation(&self, prompt: &BuiltPrompt) -> (Option<PlanDocument>, u32) {
        let budget = 1 + self.config.retry_limit;
        let mut current = prompt.clone();
        let mut attempts = 0;

        while attempts < budget {
            attempts += 1;
            let request = GenerateRequest::new(current.system.clone(), current.user.clone())
                .with_timeout(self.config.request_timeout)
                .with_max_tokens(self.config.max_tokens)
                .with_temperature(self.config.temperature);

            let raw = match self.backend.generate(&request).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(attempt = attempts, backend = self.backend.name(), error = %e, "backend call failed");
                    continue;
                }
            };

            match parse_plan_document(&raw) {
                Ok(doc) => {
                    debug!(attempt = attempts, days = doc.days.len(), "parsed plan document");
                    return (Some(doc), attempts);
                }
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "reply failed structural parse");
                    current = prompt.corrective();
                }
            }
        }

        (None, attempts)
    }

    /// Convert a parsed document into draft days.
    ///
    /// Day labels from the model are honored when they parse and are unused;
    /// missing, duplicate, or unparseable labels fall back to the first free
    /// slot. At most seven days are taken and the result is slot-ordered.
    fn convert_days(&self, doc: PlanDocument) -> Vec<MealDay> {
        let mut used = [false; 7];
        let mut days: Vec<MealDay> = Vec::new();

        for entry in doc.days.into_iter().take(7) {
            let labeled = entry
                .day
                .as_deref()
                .and_then(|s| s.parse::<DaySlot>().ok())
                .filter(|s| !used[s.index()]);
            let Some(slot) = labeled.or_else(|| {
                DaySlot::ALL.iter().copied().find(|s| !used[s.index()])
            }) else {
                break;
            };
            used[slot.index()] = true;

            let minutes = entry
                .cooking_time
                .filter(|t| *t > 0)
                .unwrap_or_else(|| self.budget_minutes(slot));
            let ingredients: Vec<Ingredient> = entry
                .ingredients
                .into_iter()
                .filter(|i| !i.name.trim().is_empty())
                .map(|i| Ingredient::new(i.name.trim(), i.quantity, &i.unit, &i.category))
                .collect();
            let instructions: Vec<String> = entry
                .preparation_instructions
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect();

            days.push(MealDay {
                day: slot,
                meal: entry.meal.trim().to_owned(),
                description: entry.description.trim().to_owned(),
                is_remixed: entry.is_remixed,
                contains_oily_fish: entry.contains_oily_fish,
                ingredients,
                recipe: Recipe {
                    cooking_time_minutes: minutes,
                    instructions,
                    source: Some(self.backend.name().to_owned()),
                    url: None,
                },
            });
        }

        days.sort_by_key(|d| d.day.index());
        days
    }

    // -- deterministic repair ------------------------------------------------

    /// Repair a draft into a plan that satisfies every invariant, or explain
    /// why that is impossible.
    async fn repair(
        &self,
        mut days: Vec<MealDay>,
        preferences: &PreferenceSet,
        recent_meals: &[String],
        history: &[MealPlan],
        meal_count: usize,
    ) -> Result<Vec<MealDay>, String> {
        // Day count: trim the excess, synthesize the shortfall.
        days.truncate(meal_count);
        if days.len() < meal_count {
            let bases = fallback_bases(preferences, recent_meals, &days);
            if days.is_empty() && bases.is_empty() {
                return Err(
                    "no days were generated and there are no liked foods to build a fallback plan from"
                        .to_owned(),
                );
            }
            self.extend_days(&mut days, &bases, meal_count);
        }

        // Reassign slots positionally: repair may have reordered or added
        // days, and budgets key off the slot.
        days.sort_by_key(|d| d.day.index());
        for (i, day) in days.iter_mut().enumerate() {
            // meal_count <= 7, so every position has a slot.
            if let Some(slot) = DaySlot::from_index(i) {
                day.day = slot;
            }
        }

        // Completeness backfill: one narrow call per incomplete day, then
        // deterministic synthesis.
        for day in days.iter_mut() {
            let minutes = self.budget_minutes(day.day);
            complete_recipe(Some(self.backend.as_ref()), day, minutes, self.config.request_timeout)
                .await;
        }

        // Policy invariants.
        self.policy.ensure_remixed_day(&mut days, history);
        self.policy.ensure_oily_fish(&mut days);

        Ok(days)
    }

    /// Synthesize meals for missing days from the fallback base pool.
    fn extend_days(&self, days: &mut Vec<MealDay>, bases: &[String], meal_count: usize) {
        // The pool can be smaller than the shortfall; later cycles get a
        // remixed title so the plan is not a flat repeat.
        let pool: Vec<String> = if bases.is_empty() {
            days.iter().map(|d| d.meal.clone()).collect()
        } else {
            bases.to_vec()
        };

        let mut k = 0usize;
        while days.len() < meal_count {
            let base = &pool[k % pool.len()];
            let (meal, description) = if k < pool.len() {
                (
                    base.clone(),
                    format!("A family favourite built around {base}."),
                )
            } else {
                self.policy.remix_title(base)
            };

            let slot = DaySlot::ALL
                .iter()
                .copied()
                .find(|s| !days.iter().any(|d| d.day == *s))
                .unwrap_or(DaySlot::Day7);

            days.push(MealDay {
                day: slot,
                meal,
                description,
                is_remixed: false,
                contains_oily_fish: self.policy.is_oily_fish(base),
                ingredients: Vec::new(),
                recipe: Recipe {
                    cooking_time_minutes: 0,
                    instructions: Vec::new(),
                    source: None,
                    url: None,
                },
            });
            k += 1;
        }
        debug!(synthesized = k, "extended draft to target day count");
    }

    fn budget_minutes(&self, slot: DaySlot) -> u32 {
        if slot.is_weekend() {
            self.config.weekend_minutes
        } else {
            self.config.weekday_minutes
        }
    }
}

/// Liked foods usable as fallback meal bases: not served recently, not
/// already in the draft. Falls back to the full liked list when the filter
/// empties it.
fn fallback_bases(
    preferences: &PreferenceSet,
    recent_meals: &[String],
    days: &[MealDay],
) -> Vec<String> {
    let taken: Vec<String> = recent_meals
        .iter()
        .map(|m| m.to_lowercase())
        .chain(days.iter().map(|d| d.meal.to_lowercase()))
        .collect();

    let available: Vec<String> = preferences
        .liked
        .iter()
        .filter(|food| !taken.contains(&food.to_lowercase()))
        .cloned()
        .collect();

    if available.is_empty() {
        preferences.liked.clone()
    } else {
        available
    }
}

/// The Monday after `now` (always in the future, 1-7 days ahead).
fn next_week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_ahead = 7 - i64::from(now.weekday().num_days_from_monday());
    now + chrono::Duration::days(days_ahead)
}
