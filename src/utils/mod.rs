//! Utility functions and helpers.

pub mod http;

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use url::Url;

use crate::error::{AppError, Result};

static RE_NOTICE_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&](?:nttId|bcIdx|pblancId|seq|no|idx|articleNo)=([A-Za-z0-9_]+)")
        .expect("notice query pattern")
});
static RE_NOTICE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:view|notice|article|board)/(\d+)").expect("notice path pattern")
});
static RE_KNOWN_AGENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(중소벤처기업부|중소벤처기업진흥공단|창업진흥원|기술보증기금)")
        .expect("agency pattern")
});
static RE_AGENCY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣]+진흥원|[가-힣]+공단|[가-힣]+협회)").expect("agency suffix pattern")
});
static RE_DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})[-.](\d{2})[-.](\d{2})\s*~\s*(\d{4})[-.](\d{2})[-.](\d{2})")
        .expect("date range pattern")
});

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract an announcement ID from a URL (looks for common board patterns).
pub fn extract_notice_id(url: &str) -> Option<String> {
    // Common patterns: ?nttId=123, &bcIdx=123, ?pblancId=PBLN_000001, /view/123
    [&*RE_NOTICE_QUERY, &*RE_NOTICE_PATH]
        .iter()
        .find_map(|pattern| pattern.captures(url)?.get(1))
        .map(|id| id.as_str().to_string())
}

/// Pull a known agency name out of free text.
///
/// Well-known agencies are tried first, then generic suffixes
/// (…진흥원, …공단, …협회).
pub fn extract_organization(text: &str) -> Option<String> {
    [&*RE_KNOWN_AGENCY, &*RE_AGENCY_SUFFIX]
        .iter()
        .find_map(|pattern| pattern.captures(text)?.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Find the first `date ~ date` range in free text.
///
/// Accepts `-` or `.` separators and returns both ends as `YYYY-MM-DD`.
pub fn extract_date_range(text: &str) -> Option<(String, String)> {
    let caps = RE_DATE_RANGE.captures(text)?;
    let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    Some((
        format!("{}-{}-{}", part(1), part(2), part(3)),
        format!("{}-{}-{}", part(4), part(5), part(6)),
    ))
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a CSS selector, keeping the offending text in the error.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
