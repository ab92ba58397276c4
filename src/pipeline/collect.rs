// src/pipeline/collect.rs

//! Per-source collection: fetch, map, filter, de-duplicate.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::mapper::{map_item, parse_date};
use crate::models::{Announcement, Source};
use crate::services::SourceClient;

/// Key used to drop duplicate records within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupKey {
    /// `(source, source_id)`, or the title when the record has no id
    #[default]
    SourceId,
    /// The title alone
    Title,
}

impl DedupKey {
    fn key(&self, record: &Announcement) -> String {
        match self {
            DedupKey::SourceId if !record.source_id.is_empty() => {
                format!("{}\u{1f}{}", record.source, record.source_id)
            }
            _ => format!("title\u{1f}{}", record.title),
        }
    }
}

/// Which records are worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Keep everything
    #[default]
    Any,
    /// Title or content mentions the given year
    ContainsYear(i32),
    /// End date present and not before the collection day
    OpenOn,
}

impl Freshness {
    pub fn keeps(&self, record: &Announcement, today: NaiveDate) -> bool {
        match self {
            Freshness::Any => true,
            Freshness::ContainsYear(year) => {
                let token = year.to_string();
                record.title.contains(&token) || record.content.contains(&token)
            }
            Freshness::OpenOn => record
                .application_end
                .as_deref()
                .and_then(parse_date)
                .is_some_and(|end| end >= today),
        }
    }
}

/// Keep the first record for each key, preserving order.
pub fn dedup(records: Vec<Announcement>, key: DedupKey) -> Vec<Announcement> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(key.key(record)))
        .collect()
}

/// One source's client plus its mapping policy.
pub struct Collector {
    client: Box<dyn SourceClient>,
    dedup: DedupKey,
    freshness: Freshness,
}

impl Collector {
    pub fn new(client: impl SourceClient + 'static) -> Self {
        Self {
            client: Box::new(client),
            dedup: DedupKey::default(),
            freshness: Freshness::default(),
        }
    }

    pub fn dedup_by(mut self, key: DedupKey) -> Self {
        self.dedup = key;
        self
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn source(&self) -> Source {
        self.client.source()
    }

    /// Fetch and normalize this source's records as of `today`.
    pub async fn collect(&self, today: NaiveDate) -> Vec<Announcement> {
        let source = self.source();
        let raw = self.client.fetch(today).await;
        let fetched = raw.len();

        let fresh: Vec<Announcement> = raw
            .iter()
            .map(|item| map_item(source, item, today))
            .filter(|record| self.freshness.keeps(record, today))
            .collect();
        let kept = fresh.len();
        let records = dedup(fresh, self.dedup);

        log::info!(
            "[{source}] {} fetched, {} fresh, {} unique",
            fetched,
            kept,
            records.len()
        );
        records
    }
}
