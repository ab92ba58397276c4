//! Field-level normalization shared by every source mapper.

use chrono::NaiveDate;

use crate::models::Status;

/// Category used when a policy code is unknown or missing.
pub const FALLBACK_CATEGORY: &str = "기타";

/// 기업마당 policy-area codes.
const CATEGORY_CODES: [(&str, &str); 7] = [
    ("01", "금융"),
    ("02", "R&D"),
    ("03", "인력"),
    ("04", "수출"),
    ("05", "창업"),
    ("06", "경영"),
    ("07", "기타"),
];

/// Normalize an upstream date.
///
/// Exactly eight ASCII digits (`YYYYMMDD`) become `YYYY-MM-DD`. Any other
/// non-empty value is returned unchanged. Empty or missing is `None`.
pub fn normalize_date(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return Some(format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..]));
    }
    Some(raw.to_string())
}

/// Keep the date part of an upstream datetime, then normalize it.
///
/// `2025-01-15 10:00:00` becomes `2025-01-15`; shorter values go through
/// [`normalize_date`].
pub fn date_part(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    match raw.char_indices().nth(10) {
        Some((cut, _)) => Some(raw[..cut].to_string()),
        None => normalize_date(Some(raw)),
    }
}

/// Split a `"start ~ end"` range into normalized halves.
///
/// Without a separator both halves are the whole value.
pub fn split_range(raw: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return (None, None);
    };
    let mut parts = raw.split('~').map(str::trim);
    let start = parts.next();
    let end = parts.last().or(start);
    (normalize_date(start), normalize_date(end))
}

/// Resolve a policy code to its category bucket.
///
/// Only the first two characters of the code are significant.
pub fn map_category(code: &str) -> String {
    let prefix: String = code.trim().chars().take(2).collect();
    CATEGORY_CODES
        .iter()
        .find(|(key, _)| *key == prefix)
        .map_or(FALLBACK_CATEGORY, |(_, name)| name)
        .to_string()
}

/// Parse the date part of an end date in any of the shapes upstreams use.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head: String = raw.chars().take(10).collect();

    ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&head, fmt).ok())
        .or_else(|| {
            let digits = raw.get(..8).filter(|d| d.bytes().all(|b| b.is_ascii_digit()))?;
            NaiveDate::from_ymd_opt(
                digits[..4].parse().ok()?,
                digits[4..6].parse().ok()?,
                digits[6..].parse().ok()?,
            )
        })
}

/// Derive status from the end date relative to `today`.
///
/// Closed only when the end date parses and lies strictly before `today`.
pub fn compute_status(end: Option<&str>, today: NaiveDate) -> Status {
    match end.and_then(parse_date) {
        Some(end) if end < today => Status::Closed,
        _ => Status::Active,
    }
}
