//! Write-once history snapshots of a pricing batch

mod snapshot;

pub use snapshot::{HistorySnapshot, HistorySnapshotBuilder, MULTIPLE_PROFILES_LABEL, NO_PROFILE_LABEL};
