//! Frozen copies of a batch for later report regeneration
//!
//! A [`HistorySnapshot`] owns deep copies of the lines, the profiles and the
//! results it was built from. Later recomputation or edits of live state never
//! reach it, and it exposes no mutators.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::batch::BatchResult;
use crate::error::Result;
use crate::product::WorkLine;
use crate::profile::CostProfile;

/// Label recorded when lines were priced with more than one profile
pub const MULTIPLE_PROFILES_LABEL: &str = "multiple profiles applied";

/// Label recorded when the batch priced no lines
pub const NO_PROFILE_LABEL: &str = "no profile applied";

/// Timestamped, immutable record of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    created_at: DateTime<Utc>,
    profile_label: String,
    lines: Vec<WorkLine>,
    profiles_used: Vec<CostProfile>,
    results: BatchResult,
}

impl HistorySnapshot {
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Name of the profile every line shared, or a sentinel label
    pub fn profile_label(&self) -> &str {
        &self.profile_label
    }

    pub fn lines(&self) -> &[WorkLine] {
        &self.lines
    }

    pub fn profiles_used(&self) -> &[CostProfile] {
        &self.profiles_used
    }

    pub fn results(&self) -> &BatchResult {
        &self.results
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builds [`HistorySnapshot`]s from live batch state
#[derive(Debug, Default, Clone, Copy)]
pub struct HistorySnapshotBuilder;

impl HistorySnapshotBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Freeze the given state, stamped with the current time
    pub fn snapshot(
        &self,
        lines: &[WorkLine],
        profiles_used: &[CostProfile],
        batch_result: &BatchResult,
    ) -> HistorySnapshot {
        self.snapshot_at(lines, profiles_used, batch_result, Utc::now())
    }

    /// Freeze the given state with an explicit creation time
    pub fn snapshot_at(
        &self,
        lines: &[WorkLine],
        profiles_used: &[CostProfile],
        batch_result: &BatchResult,
        created_at: DateTime<Utc>,
    ) -> HistorySnapshot {
        let profile_label = profile_label(profiles_used, batch_result);
        log::debug!(
            "Snapshot of {} lines, {} items, label '{}'",
            lines.len(),
            batch_result.len(),
            profile_label
        );

        HistorySnapshot {
            created_at,
            profile_label,
            lines: lines.to_vec(),
            profiles_used: profiles_used.to_vec(),
            results: batch_result.clone(),
        }
    }
}

fn profile_label(profiles_used: &[CostProfile], batch_result: &BatchResult) -> String {
    let applied: BTreeSet<&str> = batch_result
        .lines()
        .map(|(_, record)| record.profile_id.as_str())
        .collect();

    let mut applied = applied.into_iter();
    match (applied.next(), applied.next()) {
        (None, _) => NO_PROFILE_LABEL.to_string(),
        (Some(id), None) => profiles_used
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            // Deleted since pricing; the id is all that is left
            .unwrap_or_else(|| id.to_string()),
        (Some(_), Some(_)) => MULTIPLE_PROFILES_LABEL.to_string(),
    }
}
