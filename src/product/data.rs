//! Catalog product data relevant to pricing

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Earliest and latest quotation years accepted from a bare `YYYY` value
const MIN_QUOTATION_YEAR: i32 = 1900;
const MAX_QUOTATION_YEAR: i32 = 2999;

/// Subset of a catalog product needed to price it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCostSnapshot {
    /// Catalog code, unique within the catalog
    pub code: String,

    /// Free-text description for reports
    #[serde(default)]
    pub description: Option<String>,

    /// Factory cost in EUR at the quotation date (must be > 0 to price)
    #[serde(rename = "originalFactoryCostEUR")]
    pub original_factory_cost_eur: f64,

    /// Date of the factory quotation, as recorded in the catalog
    #[serde(default)]
    pub quotation_date: Option<String>,
}

impl ProductCostSnapshot {
    pub fn new(code: impl Into<String>, original_factory_cost_eur: f64) -> Self {
        Self {
            code: code.into(),
            description: None,
            original_factory_cost_eur,
            quotation_date: None,
        }
    }

    pub fn with_quotation_date(mut self, date: impl Into<String>) -> Self {
        self.quotation_date = Some(date.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Year of the factory quotation.
    ///
    /// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, RFC 3339 timestamps or a bare `YYYY`.
    /// A missing or unreadable date is an `InvalidInput` for this product only.
    pub fn quotation_year(&self) -> Result<i32> {
        let raw = self
            .quotation_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PricingError::invalid(format!("product {} has no quotation date", self.code))
            })?;

        parse_quotation_year(raw).ok_or_else(|| {
            PricingError::invalid(format!(
                "product {} has an unparseable quotation date: {}",
                self.code, raw
            ))
        })
    }
}

fn parse_quotation_year(raw: &str) -> Option<i32> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.year());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return Some(date.year());
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.year());
    }

    // Bare year
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = raw.parse().ok()?;
        if (MIN_QUOTATION_YEAR..=MAX_QUOTATION_YEAR).contains(&year) {
            return Some(year);
        }
    }

    None
}
