//! Pricing pipeline: factory cost in EUR to customer price in local currency
//!
//! The pipeline runs six ordered stages:
//! 1. **Factory cost**: time-value update, factory discount, EUR→USD with buffer
//! 2. **Logistics & insurance**: origin costs, freight, insurance premium
//! 3. **Import duties**: CIF value, ad valorem duty, import VAT, customs fees
//! 4. **Landed cost**: CIF + import costs + inland transport
//! 5. **Conversion & margin**: USD→local with buffer, commercial margin
//! 6. **Client price**: customer discount and sale VAT
//!
//! The pipeline sits behind the [`PricingEngine`] trait so a verified or
//! alternative implementation can replace [`StandardPricingEngine`] without
//! touching batch orchestration.

mod engine;
mod result;
mod stages;

pub use engine::{EngineConfig, ImportVatTreatment, NationalTransportRate, StandardPricingEngine};
pub use result::{CalculationInputs, CalculationResult, PricingBreakdown};
pub use stages::{
    ClientPriceStage, ConversionMarginStage, FactoryCostStage, ImportStage, LandedCostStage,
    LogisticsStage, StageResults,
};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::product::ProductCostSnapshot;
use crate::profile::CostProfile;
use crate::rates::ExchangeRateSet;

/// Quotation year and pricing year of one calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSpan {
    pub quotation_year: i32,
    pub current_year: i32,
}

impl YearSpan {
    pub fn new(quotation_year: i32, current_year: i32) -> Self {
        Self {
            quotation_year,
            current_year,
        }
    }

    /// Whole years to escalate the factory cost by; never negative
    pub fn elapsed_years(&self) -> u32 {
        self.current_year.saturating_sub(self.quotation_year).max(0) as u32
    }
}

/// A pure pricing function.
///
/// Implementations must be deterministic and side-effect free: identical
/// inputs always yield identical stage values.
pub trait PricingEngine: Send + Sync {
    fn compute(
        &self,
        product: &ProductCostSnapshot,
        profile: &CostProfile,
        years: YearSpan,
        rates: &ExchangeRateSet,
    ) -> Result<PricingBreakdown>;
}
