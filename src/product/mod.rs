//! Products and work lines submitted for pricing

mod data;
mod line;

pub use data::ProductCostSnapshot;
pub use line::{optional_key, principal_key, ItemRole, WorkLine};
