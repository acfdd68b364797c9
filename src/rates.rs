//! Exchange rates consumed by the pricing pipeline
//!
//! Rates come from an external provider. The core only validates them; a batch
//! whose rates are missing or unusable fails before any item is priced.

use std::error::Error;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Base market rates for one batch, before profile buffers are applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateSet {
    /// USD per EUR
    pub eur_usd_base: f64,

    /// Local currency units per USD
    pub usd_local_base: f64,

    /// When the EUR/USD rate was observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eur_usd_as_of: Option<DateTime<Utc>>,

    /// When the USD/local rate was observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_local_as_of: Option<DateTime<Utc>>,
}

impl ExchangeRateSet {
    pub fn new(eur_usd_base: f64, usd_local_base: f64) -> Self {
        Self {
            eur_usd_base,
            usd_local_base,
            eur_usd_as_of: None,
            usd_local_as_of: None,
        }
    }

    pub fn observed_at(mut self, eur_usd_as_of: DateTime<Utc>, usd_local_as_of: DateTime<Utc>) -> Self {
        self.eur_usd_as_of = Some(eur_usd_as_of);
        self.usd_local_as_of = Some(usd_local_as_of);
        self
    }

    /// Both rates must be finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        check_rate("eurUsdBase", self.eur_usd_base)?;
        check_rate("usdLocalBase", self.usd_local_base)
    }
}

fn check_rate(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PricingError::invalid(format!(
            "{} must be a finite positive rate, got {}",
            name, value
        )));
    }
    Ok(())
}

/// External source of base exchange rates.
///
/// Retry and timeout policy belong to the implementation; the core calls it
/// once per batch.
pub trait ExchangeRateProvider: Send + Sync {
    fn current_rates(&self) -> std::result::Result<ExchangeRateSet, Box<dyn Error + Send + Sync>>;
}

/// Fetch rates from a provider, mapping any failure or non-finite value to
/// `ProviderUnavailable`
pub fn fetch_rates(provider: &dyn ExchangeRateProvider) -> Result<ExchangeRateSet> {
    let rates = provider.current_rates().map_err(|e| {
        log::warn!("Exchange rate provider failed: {}", e);
        PricingError::ProviderUnavailable(e.to_string())
    })?;

    if !rates.eur_usd_base.is_finite() || !rates.usd_local_base.is_finite() {
        log::warn!(
            "Exchange rate provider returned non-finite rates: eur/usd={} usd/local={}",
            rates.eur_usd_base,
            rates.usd_local_base
        );
        return Err(PricingError::ProviderUnavailable(format!(
            "non-finite rates (eurUsdBase={}, usdLocalBase={})",
            rates.eur_usd_base, rates.usd_local_base
        )));
    }

    Ok(rates)
}

/// Provider returning a fixed rate pair, e.g. rates entered by hand on the CLI
#[derive(Debug, Clone)]
pub struct FixedRateProvider {
    rates: ExchangeRateSet,
}

impl FixedRateProvider {
    pub fn new(eur_usd_base: f64, usd_local_base: f64) -> Self {
        let now = Utc::now();
        Self {
            rates: ExchangeRateSet::new(eur_usd_base, usd_local_base).observed_at(now, now),
        }
    }

    pub fn from_rates(rates: ExchangeRateSet) -> Self {
        Self { rates }
    }
}

impl ExchangeRateProvider for FixedRateProvider {
    fn current_rates(&self) -> std::result::Result<ExchangeRateSet, Box<dyn Error + Send + Sync>> {
        Ok(self.rates)
    }
}
