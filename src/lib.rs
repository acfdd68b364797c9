//! Equipment Pricing - landed-cost and sale price engine for imported equipment
//!
//! This library provides:
//! - Cost profiles: administrator-managed pricing parameters (CRUD, duplicate, CSV loading)
//! - A six-stage pricing pipeline from EUR factory cost to local-currency customer price
//! - Batch orchestration over principal items and their optionals, with per-line
//!   profile overrides, per-item failure isolation and single-line recompute
//! - Write-once history snapshots of a priced batch

pub mod error;
pub mod profile;
pub mod product;
pub mod rates;
pub mod pricing;
pub mod batch;
pub mod history;

// Re-export commonly used types
pub use error::{PricingError, Result};
pub use profile::{CostParameters, CostProfile, NewCostProfile, ProfileSource, ProfileStore};
pub use product::{ProductCostSnapshot, WorkLine};
pub use rates::{ExchangeRateProvider, ExchangeRateSet, FixedRateProvider};
pub use pricing::{CalculationResult, EngineConfig, PricingBreakdown, PricingEngine, StandardPricingEngine};
pub use batch::{BatchOrchestrator, BatchOutcome, BatchResult};
pub use history::{HistorySnapshot, HistorySnapshotBuilder};
