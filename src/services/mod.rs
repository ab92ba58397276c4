//! Source clients for every upstream.
//!
//! This module contains the fetch logic for:
//! - 공공데이터포털 MSIT notices (`DataGoKrClient`)
//! - 나라장터 service bids (`NaraJangteoClient`)
//! - 기업마당 open API (`BizInfoClient`)
//! - 중소벤처24 period and paged APIs (`SmesRangeClient`, `SmesPagedClient`)
//! - HTML boards (`WebBoardClient`)
//!
//! Every client returns raw records and never fails: transport, parse and
//! configuration problems are logged and become an empty result.

mod bizinfo;
mod data_go_kr;
mod narajangteo;
mod smes;
pub mod transport;
mod web;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{RawItem, Source, lookup};

pub use bizinfo::BizInfoClient;
pub use data_go_kr::DataGoKrClient;
pub use narajangteo::NaraJangteoClient;
pub use smes::{SmesPagedClient, SmesRangeClient};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
pub use web::{WebBoardClient, parse_board};

/// A fetcher for one upstream.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Tag stamped on every record from this client.
    fn source(&self) -> Source;

    /// Fetch raw records relative to `today`. Never fails; problems are
    /// logged and yield an empty sequence.
    async fn fetch(&self, today: NaiveDate) -> Vec<RawItem>;
}

/// Inclusive date window for range-based APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window from `before` days ago to `after` days ahead of `today`.
    pub fn around(today: NaiveDate, before: i64, after: i64) -> Self {
        Self {
            start: today - TimeDelta::days(before),
            end: today + TimeDelta::days(after),
        }
    }

    /// Both ends as `YYYYMMDD`.
    pub fn compact(&self) -> (String, String) {
        (
            self.start.format("%Y%m%d").to_string(),
            self.end.format("%Y%m%d").to_string(),
        )
    }
}

/// Return the credential or a "not configured" error naming it.
pub(crate) fn require<'a>(credential: Option<&'a str>, name: &str) -> Result<&'a str> {
    credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::not_configured(name))
}

/// Check a result-code field against the source's success code.
///
/// A missing code counts as failure.
pub(crate) fn check_result_code(
    doc: &Value,
    code_path: &[&str],
    message_path: &[&str],
    expected: &str,
    context: &str,
) -> Result<()> {
    let code = lookup(doc, code_path).map(value_text);
    if code.as_deref() == Some(expected) {
        return Ok(());
    }
    let message = lookup(doc, message_path)
        .map(value_text)
        .unwrap_or_else(|| "Unknown error".to_string());
    Err(AppError::parse(
        context,
        format!(
            "result code {} (expected {expected}): {message}",
            code.as_deref().unwrap_or("<missing>")
        ),
    ))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Log the outcome of a fetch and collapse failures into an empty result.
pub(crate) fn settle(source: Source, result: Result<Vec<RawItem>>) -> Vec<RawItem> {
    match result {
        Ok(items) => {
            log::info!("[{source}] fetched {} items", items.len());
            items
        }
        Err(e) if e.is_not_configured() => {
            log::warn!("[{source}] not configured, skipping: {e}");
            Vec::new()
        }
        Err(e) => {
            log::error!("[{source}] fetch failed: {e}");
            Vec::new()
        }
    }
}
