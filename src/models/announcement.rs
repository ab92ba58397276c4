//! Canonical announcement record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upstream system an announcement was collected from.
///
/// Serialized as the tag string stored in the `source` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// 공공데이터포털 (MSIT notice API)
    #[serde(rename = "datagoKr")]
    DataGoKr,
    /// 나라장터 service bid API
    #[serde(rename = "narajangteo")]
    NaraJangteo,
    /// 기업마당 open API
    #[serde(rename = "bizinfo")]
    BizInfo,
    /// 중소벤처24 announcement API
    #[serde(rename = "smes24")]
    Smes,
    /// 중소벤처기업부 board page
    #[serde(rename = "mss.go.kr")]
    MssWeb,
    /// 기업마당 list page
    #[serde(rename = "bizinfo.go.kr")]
    BizInfoWeb,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::DataGoKr => "datagoKr",
            Source::NaraJangteo => "narajangteo",
            Source::BizInfo => "bizinfo",
            Source::Smes => "smes24",
            Source::MssWeb => "mss.go.kr",
            Source::BizInfoWeb => "bizinfo.go.kr",
        }
    }

    /// Whether records of this source come from scraped HTML rather than an API.
    pub fn is_scraped(&self) -> bool {
        matches!(self, Source::MssWeb | Source::BizInfoWeb)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an announcement is still accepting applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Closed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Closed => "closed",
        }
    }
}

/// A support-program announcement normalized from any upstream.
///
/// `(source, source_id)` is the unique key in the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    pub source: Source,
    pub source_id: String,
    pub title: String,
    pub organization: String,
    pub category: String,
    pub support_type: String,

    /// `YYYY-MM-DD` when the upstream gave an 8-digit date
    pub application_start: Option<String>,
    pub application_end: Option<String>,

    /// Body text or a URL pointing to it
    pub content: String,
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_company: Option<String>,
}

impl Announcement {
    /// Empty record for a source; mappers fill in what they find.
    pub fn new(source: Source) -> Self {
        Self {
            source,
            source_id: String::new(),
            title: String::new(),
            organization: String::new(),
            category: String::new(),
            support_type: String::new(),
            application_start: None,
            application_end: None,
            content: String::new(),
            status: Status::Active,
            support_amount: None,
            target_company: None,
        }
    }

    /// Column headers used by the spreadsheet and CSV exports.
    pub const COLUMNS: [&'static str; 12] = [
        "source",
        "source_id",
        "title",
        "organization",
        "category",
        "support_type",
        "application_start",
        "application_end",
        "status",
        "support_amount",
        "target_company",
        "content",
    ];

    /// Values in the same order as [`Announcement::COLUMNS`].
    pub fn row(&self) -> [&str; 12] {
        [
            self.source.as_str(),
            self.source_id.as_str(),
            self.title.as_str(),
            self.organization.as_str(),
            self.category.as_str(),
            self.support_type.as_str(),
            self.application_start.as_deref().unwrap_or(""),
            self.application_end.as_deref().unwrap_or(""),
            self.status.as_str(),
            self.support_amount.as_deref().unwrap_or(""),
            self.target_company.as_deref().unwrap_or(""),
            self.content.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_serializes_as_tag() {
        let json = serde_json::to_string(&Source::DataGoKr).unwrap();
        assert_eq!(json, "\"datagoKr\"");
        let parsed: Source = serde_json::from_str("\"mss.go.kr\"").unwrap();
        assert_eq!(parsed, Source::MssWeb);
    }

    #[test]
    fn test_optional_extras_are_omitted() {
        let mut record = Announcement::new(Source::BizInfo);
        record.title = "2025 수출바우처".to_string();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["status"], "active");
        assert_eq!(value["source"], "bizinfo");
        assert!(value.get("support_amount").is_none());
        assert!(value["application_end"].is_null());
    }

    #[test]
    fn test_row_matches_columns() {
        let mut record = Announcement::new(Source::Smes);
        record.application_end = Some("2025-03-31".to_string());
        let row = record.row();
        assert_eq!(row.len(), Announcement::COLUMNS.len());
        assert_eq!(row[7], "2025-03-31");
        assert_eq!(row[8], "active");
    }
}
