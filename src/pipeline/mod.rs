//! Pipeline entry points for collection runs.
//!
//! - `Collector`: fetch, map, filter and de-duplicate one source
//! - `Orchestrator`: run collectors in sequence and persist their records

pub mod collect;
pub mod run;

pub use collect::{Collector, DedupKey, Freshness, dedup};
pub use run::{Orchestrator, PersistMode, RunReport, SourceReport, distribution};
