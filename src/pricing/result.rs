//! Calculation output records

use serde::{Deserialize, Serialize};

use super::stages::StageResults;
use super::YearSpan;
use crate::error::PricingError;
use crate::product::ProductCostSnapshot;
use crate::profile::{CostProfile, ProfileId};
use crate::rates::ExchangeRateSet;

/// Inputs echoed back with every successful calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationInputs {
    pub profile_id: ProfileId,
    pub product_code: String,
    pub quotation_year: i32,
    pub current_year: i32,
    #[serde(rename = "originalFactoryCostEUR")]
    pub original_factory_cost_eur: f64,
    pub eur_usd_base: f64,
    pub usd_local_base: f64,
}

impl CalculationInputs {
    pub fn new(
        product: &ProductCostSnapshot,
        profile: &CostProfile,
        years: YearSpan,
        rates: &ExchangeRateSet,
    ) -> Self {
        Self {
            profile_id: profile.id.clone(),
            product_code: product.code.clone(),
            quotation_year: years.quotation_year,
            current_year: years.current_year,
            original_factory_cost_eur: product.original_factory_cost_eur,
            eur_usd_base: rates.eur_usd_base,
            usd_local_base: rates.usd_local_base,
        }
    }
}

/// A successful pricing run: inputs plus all six stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub inputs: CalculationInputs,
    pub calculados: StageResults,
}

impl PricingBreakdown {
    /// Final price to the customer in local currency, VAT included
    pub fn headline_price(&self) -> f64 {
        self.calculados.client_price.total_client_price_local
    }
}

/// Outcome of pricing one item.
///
/// Serialises as `{inputs, calculados}` on success and `{error}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalculationResult {
    Success(PricingBreakdown),
    Failure { error: String },
}

impl CalculationResult {
    pub fn failure(error: &PricingError) -> Self {
        CalculationResult::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CalculationResult::Success(_))
    }

    pub fn breakdown(&self) -> Option<&PricingBreakdown> {
        match self {
            CalculationResult::Success(breakdown) => Some(breakdown),
            CalculationResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CalculationResult::Success(_) => None,
            CalculationResult::Failure { error } => Some(error),
        }
    }

    pub fn headline_price(&self) -> Option<f64> {
        self.breakdown().map(PricingBreakdown::headline_price)
    }
}

impl From<crate::error::Result<PricingBreakdown>> for CalculationResult {
    fn from(result: crate::error::Result<PricingBreakdown>) -> Self {
        match result {
            Ok(breakdown) => CalculationResult::Success(breakdown),
            Err(e) => CalculationResult::failure(&e),
        }
    }
}
