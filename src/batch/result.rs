//! Keyed results of a batch run
//!
//! Items are keyed `"principal-<code>"` / `"opcional-<code>"`. Keys are opaque
//! to consumers: line membership is tracked in [`LineRecord`] rather than
//! recovered by parsing keys.
//!
//! Two lines may claim the same key (the same optional on both). Every key
//! has exactly one owning line, the one whose result is stored; only the
//! owner writes the key on recompute.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pricing::CalculationResult;
use crate::product::WorkLine;
use crate::profile::ProfileId;

/// Which profile a line was priced with and which result keys it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub profile_id: ProfileId,
    pub principal_key: String,
    pub optional_keys: Vec<String>,
}

impl LineRecord {
    pub fn for_line(line: &WorkLine, profile_id: impl Into<ProfileId>) -> Self {
        let mut keys = line.item_keys().into_iter();
        let principal_key = keys.next().unwrap_or_default();
        Self {
            profile_id: profile_id.into(),
            principal_key,
            optional_keys: keys.collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.principal_key).chain(self.optional_keys.iter())
    }
}

/// Overall status of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOutcome {
    /// No items were submitted
    Empty,
    /// Every item priced successfully
    Complete,
    /// Some items priced, some failed
    Partial,
    /// Every item failed; the result is still structurally valid
    AggregateFailure,
}

/// Headline totals for one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSummary {
    pub line_id: String,
    pub profile_id: ProfileId,
    /// Principal price, if it priced successfully
    pub principal_price: Option<f64>,
    /// Sum over the optionals that priced successfully
    pub optionals_price: f64,
    /// Principal plus successful optionals
    pub total_price: f64,
    pub item_count: usize,
    pub failed_items: usize,
}

/// Results of a batch run, keyed by item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    items: BTreeMap<String, CalculationResult>,
    lines: BTreeMap<String, LineRecord>,
    /// Item key to the id of the line whose result is stored
    #[serde(default)]
    owners: BTreeMap<String, String>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CalculationResult> {
        self.items.get(key)
    }

    pub fn line(&self, line_id: &str) -> Option<&LineRecord> {
        self.lines.get(line_id)
    }

    pub fn items(&self) -> impl Iterator<Item = (&String, &CalculationResult)> {
        self.items.iter()
    }

    pub fn lines(&self) -> impl Iterator<Item = (&String, &LineRecord)> {
        self.lines.iter()
    }

    /// Line whose result is stored under `key`
    pub fn owner(&self, key: &str) -> Option<&str> {
        self.owners.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.items.values().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.items.len() - self.success_count()
    }

    pub fn outcome(&self) -> BatchOutcome {
        let successes = self.success_count();
        if self.items.is_empty() {
            BatchOutcome::Empty
        } else if successes == self.items.len() {
            BatchOutcome::Complete
        } else if successes == 0 {
            BatchOutcome::AggregateFailure
        } else {
            BatchOutcome::Partial
        }
    }

    /// Sum of headline prices over every successful item
    pub fn total_price(&self) -> f64 {
        self.items.values().filter_map(|r| r.headline_price()).sum()
    }

    /// Register a line, returning the record it replaced
    pub(crate) fn record_line(&mut self, line_id: &str, record: LineRecord) -> Option<LineRecord> {
        self.lines.insert(line_id.to_string(), record)
    }

    /// Store an item result owned by `line_id`, returning the result it replaced
    pub(crate) fn insert_item(
        &mut self,
        line_id: &str,
        key: String,
        result: CalculationResult,
    ) -> Option<CalculationResult> {
        self.owners.insert(key.clone(), line_id.to_string());
        self.items.insert(key, result)
    }

    /// Swap in fresh results for one line.
    ///
    /// Only keys this line owns, or that nobody owns, are written. A key the
    /// line no longer carries passes to another line still claiming it, or is
    /// dropped. No other entry is touched.
    pub(crate) fn replace_line(
        &mut self,
        line_id: &str,
        record: LineRecord,
        results: Vec<(String, CalculationResult)>,
    ) {
        if let Some(previous) = self.lines.remove(line_id) {
            for key in previous.keys() {
                if self.owner(key) != Some(line_id) || record.keys().any(|k| k == key) {
                    continue;
                }
                let heir = self
                    .lines
                    .iter()
                    .find(|(_, other)| other.keys().any(|k| k == key))
                    .map(|(id, _)| id.clone());
                match heir {
                    Some(heir) => {
                        self.owners.insert(key.clone(), heir);
                    }
                    None => {
                        self.owners.remove(key);
                        self.items.remove(key);
                    }
                }
            }
        }

        self.lines.insert(line_id.to_string(), record);
        for (key, result) in results {
            let other_owner = self
                .owner(&key)
                .filter(|owner| *owner != line_id)
                .map(str::to_string);
            match other_owner {
                Some(owner) => {
                    log::debug!("Keeping {} from line {}, not rewritten by {}", key, owner, line_id);
                }
                None => {
                    self.insert_item(line_id, key, result);
                }
            }
        }
    }

    /// Headline totals for a line
    pub fn line_summary(&self, line_id: &str) -> Option<LineSummary> {
        let record = self.lines.get(line_id)?;

        let principal = self.items.get(&record.principal_key);
        let principal_price = principal.and_then(|r| r.headline_price());

        let optionals: Vec<_> = record
            .optional_keys
            .iter()
            .filter_map(|k| self.items.get(k))
            .collect();
        let optionals_price: f64 = optionals.iter().filter_map(|r| r.headline_price()).sum();

        let item_count = principal.iter().count() + optionals.len();
        let failed_items = principal
            .into_iter()
            .chain(optionals.iter().copied())
            .filter(|r| !r.is_success())
            .count();

        Some(LineSummary {
            line_id: line_id.to_string(),
            profile_id: record.profile_id.clone(),
            principal_price,
            optionals_price,
            total_price: principal_price.unwrap_or(0.0) + optionals_price,
            item_count,
            failed_items,
        })
    }

    /// Summaries for every line, ordered by line id
    pub fn line_summaries(&self) -> Vec<LineSummary> {
        self.lines
            .keys()
            .filter_map(|id| self.line_summary(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PricingError;
    use crate::product::ProductCostSnapshot;

    fn failure(msg: &str) -> CalculationResult {
        CalculationResult::failure(&PricingError::invalid(msg))
    }

    #[test]
    fn test_empty_outcome() {
        let result = BatchResult::new();
        assert_eq!(result.outcome(), BatchOutcome::Empty);
        assert_eq!(result.total_price(), 0.0);
    }

    #[test]
    fn test_aggregate_failure_outcome() {
        let mut result = BatchResult::new();
        result.insert_item("A", "principal-A".into(), failure("a"));
        result.insert_item("B", "principal-B".into(), failure("b"));

        assert_eq!(result.outcome(), BatchOutcome::AggregateFailure);
        assert_eq!(result.failure_count(), 2);
        assert_eq!(result.success_count(), 0);
    }

    #[test]
    fn test_line_record_keys() {
        let line = WorkLine::new(ProductCostSnapshot::new("A", 1.0))
            .with_optional(ProductCostSnapshot::new("X", 1.0));
        let record = LineRecord::for_line(&line, "std");

        assert_eq!(record.principal_key, "principal-A");
        assert_eq!(record.optional_keys, vec!["opcional-X"]);
        assert_eq!(record.keys().count(), 2);
    }

    #[test]
    fn test_replace_line_keeps_shared_keys() {
        let a = WorkLine::new(ProductCostSnapshot::new("A", 1.0))
            .with_optional(ProductCostSnapshot::new("X", 1.0));
        let b = WorkLine::new(ProductCostSnapshot::new("B", 1.0))
            .with_optional(ProductCostSnapshot::new("X", 1.0));

        let mut result = BatchResult::new();
        result.record_line("A", LineRecord::for_line(&a, "std"));
        result.record_line("B", LineRecord::for_line(&b, "std"));
        result.insert_item("A", "principal-A".into(), failure("principal-A"));
        result.insert_item("A", "opcional-X".into(), failure("opcional-X"));
        result.insert_item("B", "principal-B".into(), failure("principal-B"));
        result.insert_item("B", "opcional-X".into(), failure("opcional-X"));

        // Line A now has no optionals
        let a_without = WorkLine::new(ProductCostSnapshot::new("A", 1.0));
        result.replace_line(
            "A",
            LineRecord::for_line(&a_without, "std"),
            vec![("principal-A".into(), failure("again"))],
        );

        assert!(result.get("opcional-X").is_some());
        assert_eq!(result.owner("opcional-X"), Some("B"));
        assert_eq!(result.get("principal-A").unwrap().error(), Some("invalid input: again"));
    }

    #[test]
    fn test_replace_line_drops_stale_keys() {
        let a = WorkLine::new(ProductCostSnapshot::new("A", 1.0))
            .with_optional(ProductCostSnapshot::new("X", 1.0));

        let mut result = BatchResult::new();
        result.record_line("A", LineRecord::for_line(&a, "std"));
        result.insert_item("A", "principal-A".into(), failure("a"));
        result.insert_item("A", "opcional-X".into(), failure("x"));

        let a_without = WorkLine::new(ProductCostSnapshot::new("A", 1.0));
        result.replace_line(
            "A",
            LineRecord::for_line(&a_without, "agro"),
            vec![("principal-A".into(), failure("a2"))],
        );

        assert!(result.get("opcional-X").is_none());
        assert!(result.owner("opcional-X").is_none());
        assert_eq!(result.line("A").unwrap().profile_id, "agro");
    }

    #[test]
    fn test_line_summary_counts_failures() {
        let line = WorkLine::new(ProductCostSnapshot::new("A", 1.0))
            .with_optional(ProductCostSnapshot::new("X", 1.0));

        let mut result = BatchResult::new();
        result.record_line("A", LineRecord::for_line(&line, "std"));
        result.insert_item("A", "principal-A".into(), failure("a"));
        result.insert_item("A", "opcional-X".into(), failure("x"));

        let summary = result.line_summary("A").unwrap();
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.failed_items, 2);
        assert_eq!(summary.principal_price, None);
        assert_eq!(summary.total_price, 0.0);
        assert!(result.line_summary("missing").is_none());
    }

    #[test]
    fn test_replace_line_leaves_key_owned_by_other_line() {
        let a = WorkLine::new(ProductCostSnapshot::new("A", 1.0))
            .with_optional(ProductCostSnapshot::new("X", 1.0));
        let b = WorkLine::new(ProductCostSnapshot::new("B", 1.0))
            .with_optional(ProductCostSnapshot::new("X", 1.0));

        let mut result = BatchResult::new();
        result.record_line("A", LineRecord::for_line(&a, "std"));
        result.record_line("B", LineRecord::for_line(&b, "std"));
        result.insert_item("A", "principal-A".into(), failure("a"));
        result.insert_item("B", "principal-B".into(), failure("b"));
        result.insert_item("B", "opcional-X".into(), failure("x from b"));

        result.replace_line(
            "A",
            LineRecord::for_line(&a, "agro"),
            vec![
                ("principal-A".into(), failure("a2")),
                ("opcional-X".into(), failure("x from a")),
            ],
        );

        assert_eq!(result.get("opcional-X").unwrap().error(), Some("invalid input: x from b"));
        assert_eq!(result.owner("opcional-X"), Some("B"));
        assert_eq!(result.get("principal-A").unwrap().error(), Some("invalid input: a2"));

        // The owner still rewrites its own key
        result.replace_line(
            "B",
            LineRecord::for_line(&b, "agro"),
            vec![("opcional-X".into(), failure("x from b again"))],
        );
        assert_eq!(
            result.get("opcional-X").unwrap().error(),
            Some("invalid input: x from b again")
        );
    }
}
