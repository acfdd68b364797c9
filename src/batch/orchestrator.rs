//! Batch orchestration over work lines
//!
//! Every principal and optional is an independent pricing job. Jobs run in
//! parallel and all of them settle: a failing item records `{error}` in its own
//! slot and never affects siblings. Only a rate problem stops a batch, and it
//! is detected before any job is dispatched.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use super::result::{BatchOutcome, BatchResult, LineRecord};
use crate::error::{PricingError, Result};
use crate::pricing::{CalculationResult, PricingEngine, StandardPricingEngine, YearSpan};
use crate::product::{ItemRole, ProductCostSnapshot, WorkLine};
use crate::profile::{CostProfile, ProfileId, ProfileSource};
use crate::rates::{fetch_rates, ExchangeRateProvider, ExchangeRateSet};

/// A line with its profile already resolved
struct LinePlan<'a> {
    line: &'a WorkLine,
    profile_id: &'a str,
    profile: Result<CostProfile>,
}

/// Runs the pricing engine over lines of principals and optionals
pub struct BatchOrchestrator<S: ProfileSource> {
    engine: Box<dyn PricingEngine>,
    profiles: S,
}

impl<S: ProfileSource> BatchOrchestrator<S> {
    /// Orchestrator using the standard engine with default policies
    pub fn new(profiles: S) -> Self {
        Self::with_engine(Box::new(StandardPricingEngine::default()), profiles)
    }

    /// Orchestrator using a substitute engine
    pub fn with_engine(engine: Box<dyn PricingEngine>, profiles: S) -> Self {
        Self { engine, profiles }
    }

    pub fn profiles(&self) -> &S {
        &self.profiles
    }

    /// Price every line. Lines without an override use `default_profile_id`.
    ///
    /// Returns `Err` only when the shared rates are unusable; per-item
    /// failures are recorded in the result.
    pub fn run_batch(
        &self,
        lines: &[WorkLine],
        default_profile_id: &str,
        rates: &ExchangeRateSet,
        current_year: i32,
    ) -> Result<BatchResult> {
        rates.validate()?;

        let plans: Vec<LinePlan> = lines
            .iter()
            .map(|line| self.plan_line(line, line.effective_profile_id(default_profile_id)))
            .collect();

        let mut result = BatchResult::new();
        for plan in &plans {
            let record = LineRecord::for_line(plan.line, plan.profile_id);
            if result.record_line(plan.line.line_id(), record).is_some() {
                log::warn!("Line {} appears more than once, later entry wins", plan.line.line_id());
            }
        }

        for (line_id, key, item) in self.price_plans(&plans, rates, current_year) {
            if result.insert_item(line_id, key.clone(), item).is_some() {
                log::warn!("Item key {} produced by more than one line, later entry wins", key);
            }
        }

        log_outcome(&result, lines.len());
        Ok(result)
    }

    /// Fetch rates from `provider` once, then price every line.
    ///
    /// Provider failure surfaces as `ProviderUnavailable` before any item is
    /// priced.
    pub fn run_batch_with_provider(
        &self,
        lines: &[WorkLine],
        default_profile_id: &str,
        provider: &dyn ExchangeRateProvider,
        current_year: i32,
    ) -> Result<BatchResult> {
        let rates = fetch_rates(provider)?;
        self.run_batch(lines, default_profile_id, &rates, current_year)
    }

    /// Re-price one line under `new_profile_id`, replacing only that line's
    /// entries in `result`.
    ///
    /// The line's override in `lines` is set to the new profile so later
    /// snapshots record what was applied.
    pub fn recompute_line(
        &self,
        result: &mut BatchResult,
        lines: &mut [WorkLine],
        line_id: &str,
        new_profile_id: &str,
        rates: &ExchangeRateSet,
        current_year: i32,
    ) -> Result<()> {
        rates.validate()?;

        let line = lines
            .iter_mut()
            .rev()
            .find(|l| l.line_id() == line_id)
            .ok_or_else(|| PricingError::invalid(format!("unknown line: {}", line_id)))?;
        line.profile_id_override = Some(new_profile_id.to_string());
        let line: &WorkLine = line;

        // Compute first, then swap in: readers of other keys see no change
        let plans = [self.plan_line(line, new_profile_id)];
        let items: Vec<_> = self
            .price_plans(&plans, rates, current_year)
            .into_iter()
            .map(|(_, key, item)| (key, item))
            .collect();

        log::debug!(
            "Recomputed line {} with profile {} ({} items)",
            line_id,
            new_profile_id,
            items.len()
        );
        result.replace_line(line_id, LineRecord::for_line(line, new_profile_id), items);
        Ok(())
    }

    /// Price the same lines under each profile in turn, ignoring line overrides
    pub fn compare_profiles(
        &self,
        lines: &[WorkLine],
        profile_ids: &[ProfileId],
        rates: &ExchangeRateSet,
        current_year: i32,
    ) -> Result<Vec<(ProfileId, BatchResult)>> {
        let plain: Vec<WorkLine> = lines
            .iter()
            .cloned()
            .map(|mut line| {
                line.profile_id_override = None;
                line
            })
            .collect();

        profile_ids
            .iter()
            .map(|id| {
                let result = self.run_batch(&plain, id, rates, current_year)?;
                Ok((id.clone(), result))
            })
            .collect()
    }

    /// Distinct profiles referenced by the lines, in first-use order.
    /// Ids that no longer resolve are skipped.
    pub fn profiles_used(&self, lines: &[WorkLine], default_profile_id: &str) -> Vec<CostProfile> {
        let mut seen = HashSet::new();
        lines
            .iter()
            .map(|line| line.effective_profile_id(default_profile_id))
            .filter(|id| seen.insert(id.to_string()))
            .filter_map(|id| self.profiles.get_profile(id))
            .collect()
    }

    fn plan_line<'a>(&self, line: &'a WorkLine, profile_id: &'a str) -> LinePlan<'a> {
        LinePlan {
            line,
            profile_id,
            profile: self.profiles.require_profile(profile_id),
        }
    }

    /// Fan out one job per item and collect every outcome, in line order,
    /// tagged with the id of the line that produced it
    fn price_plans<'p>(
        &self,
        plans: &'p [LinePlan],
        rates: &ExchangeRateSet,
        current_year: i32,
    ) -> Vec<(&'p str, String, CalculationResult)> {
        let jobs: Vec<(String, ItemRole, &LinePlan, &ProductCostSnapshot)> = plans
            .iter()
            .flat_map(|plan| {
                plan.line
                    .items()
                    .map(move |(key, role, product)| (key, role, plan, product))
            })
            .collect();

        jobs.into_par_iter()
            .map(|(key, role, plan, product)| {
                log::debug!("Pricing {:?} {} with profile {}", role, key, plan.profile_id);
                let item = self.price_item(plan, product, rates, current_year);
                (plan.line.line_id(), key, item)
            })
            .collect()
    }

    fn price_item(
        &self,
        plan: &LinePlan,
        product: &ProductCostSnapshot,
        rates: &ExchangeRateSet,
        current_year: i32,
    ) -> CalculationResult {
        let profile = match &plan.profile {
            Ok(profile) => profile,
            Err(e) => return CalculationResult::failure(e),
        };

        let quotation_year = match product.quotation_year() {
            Ok(year) => year,
            Err(e) => return CalculationResult::failure(&e),
        };
        let years = YearSpan::new(quotation_year, current_year);

        // A substituted engine that panics fails only its own item
        let computed = panic::catch_unwind(AssertUnwindSafe(|| {
            self.engine.compute(product, profile, years, rates)
        }));

        match computed {
            Ok(Ok(breakdown)) => CalculationResult::Success(breakdown),
            Ok(Err(e)) => {
                if !e.is_item_local() {
                    log::warn!("Unexpected engine error on {}: {}", product.code, e);
                }
                CalculationResult::failure(&e)
            }
            Err(_) => {
                log::warn!("Pricing engine panicked on {}", product.code);
                CalculationResult::Failure {
                    error: format!("pricing engine panicked on {}", product.code),
                }
            }
        }
    }
}

fn log_outcome(result: &BatchResult, line_count: usize) {
    match result.outcome() {
        BatchOutcome::AggregateFailure => log::warn!(
            "Every item failed: {} lines, {} items",
            line_count,
            result.len()
        ),
        _ => log::info!(
            "Priced {} lines: {} items ok, {} failed",
            line_count,
            result.success_count(),
            result.failure_count()
        ),
    }
}
