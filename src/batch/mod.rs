//! Batch pricing of work lines
//!
//! A batch is a list of [`WorkLine`](crate::product::WorkLine)s priced against
//! one set of exchange rates. Each line's principal and optionals are priced
//! independently and the outcomes land in a [`BatchResult`] keyed by item.
//! A single line can later be re-priced under another profile without
//! disturbing the rest of the result.

mod orchestrator;
mod result;

pub use orchestrator::BatchOrchestrator;
pub use result::{BatchOutcome, BatchResult, LineRecord, LineSummary};
