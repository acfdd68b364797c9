//! Cost profiles: reusable pricing parameter bundles and their store

mod data;
mod store;
pub mod loader;

pub use data::{CostParameters, CostProfile, NewCostProfile, ProfileId};
pub use store::{ProfileSource, ProfileStore, DUPLICATE_PREFIX};
pub use loader::{load_profiles, load_profiles_from_reader};
