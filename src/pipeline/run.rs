// src/pipeline/run.rs

//! Run orchestration across sources.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;

use crate::models::{Announcement, Source};
use crate::storage::AnnouncementSink;
use crate::utils::http::pause;

use super::collect::{Collector, DedupKey, dedup};

/// When collected records reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Write each source's records right after it is collected.
    PerSource,
    /// Gather everything, de-duplicate by title, write once.
    Combined,
}

/// Outcome for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: Source,
    pub collected: usize,
    pub saved: usize,
    pub error: Option<String>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    pub total_collected: usize,
    pub total_saved: usize,
    /// Sink failure of a combined write.
    pub error: Option<String>,
    pub records: Vec<Announcement>,
}

impl RunReport {
    /// Log totals per source and the top organizations and categories.
    pub fn log_summary(&self) {
        log::info!("========== collection summary ==========");
        for report in &self.sources {
            match &report.error {
                Some(e) => log::info!(
                    "  {}: {} collected, {} saved (error: {})",
                    report.source,
                    report.collected,
                    report.saved,
                    e
                ),
                None => log::info!(
                    "  {}: {} collected, {} saved",
                    report.source,
                    report.collected,
                    report.saved
                ),
            }
        }
        log::info!(
            "  total: {} collected, {} saved",
            self.total_collected,
            self.total_saved
        );

        if self.records.is_empty() {
            return;
        }
        log::info!("  top organizations:");
        for (name, count) in distribution(&self.records, |r| r.organization.as_str(), 10) {
            log::info!("    {name}: {count}");
        }
        log::info!("  top categories:");
        for (name, count) in distribution(&self.records, |r| r.category.as_str(), 10) {
            log::info!("    {name}: {count}");
        }
    }
}

/// The `n` most frequent non-empty values of `field`, most frequent first.
///
/// Ties are ordered by value so the output is stable.
pub fn distribution<'a>(
    records: &'a [Announcement],
    field: impl Fn(&'a Announcement) -> &'a str,
    n: usize,
) -> Vec<(&'a str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let value = field(record);
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked.truncate(n);
    ranked
}

/// Runs collectors one after another and hands their records to a sink.
pub struct Orchestrator {
    collectors: Vec<Collector>,
    source_delay: Duration,
}

impl Orchestrator {
    pub fn new(collectors: Vec<Collector>) -> Self {
        Self {
            collectors,
            source_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive sources.
    pub fn with_source_delay(mut self, delay: Duration) -> Self {
        self.source_delay = delay;
        self
    }

    pub async fn run(
        &self,
        sink: &dyn AnnouncementSink,
        mode: PersistMode,
        today: NaiveDate,
    ) -> RunReport {
        let mut report = RunReport::default();

        for (i, collector) in self.collectors.iter().enumerate() {
            if i > 0 {
                pause(self.source_delay).await;
            }

            let source = collector.source();
            log::info!("[{source}] collecting...");
            let records = collector.collect(today).await;

            let mut entry = SourceReport {
                source,
                collected: records.len(),
                saved: 0,
                error: None,
            };

            if mode == PersistMode::PerSource && !records.is_empty() {
                match sink.write(&records).await {
                    Ok(saved) => entry.saved = saved,
                    Err(e) => {
                        log::error!("[{source}] {} write failed: {e}", sink.name());
                        entry.error = Some(e.to_string());
                    }
                }
            }

            report.total_collected += entry.collected;
            report.total_saved += entry.saved;
            report.sources.push(entry);
            report.records.extend(records);
        }

        if mode == PersistMode::Combined {
            let records = std::mem::take(&mut report.records);
            let before = records.len();
            report.records = dedup(records, DedupKey::Title);
            if report.records.len() < before {
                log::info!(
                    "{} duplicate titles dropped across sources",
                    before - report.records.len()
                );
            }

            match sink.write(&report.records).await {
                Ok(saved) => report.total_saved = saved,
                Err(e) => {
                    log::error!("{} write failed: {e}", sink.name());
                    report.error = Some(e.to_string());
                }
            }
        }

        report
    }
}
