//! Source-to-canonical record mapping.
//!
//! Every upstream shape is translated into an [`Announcement`] by a pure,
//! total function selected by the [`Source`] tag. Missing or malformed
//! fields become empty strings or `None`; mapping never fails.

mod fields;

use chrono::NaiveDate;

use crate::models::{Announcement, RawItem, Source};
use crate::utils::{extract_date_range, extract_notice_id};

pub use fields::{
    FALLBACK_CATEGORY, compute_status, date_part, map_category, normalize_date, parse_date,
    split_range,
};

/// Map one raw upstream record to the canonical shape.
pub fn map_item(source: Source, raw: &RawItem, today: NaiveDate) -> Announcement {
    let mut record = match source {
        Source::DataGoKr => map_data_go_kr(raw),
        Source::NaraJangteo => map_narajangteo(raw),
        Source::BizInfo => map_bizinfo(raw),
        Source::Smes => map_smes(raw),
        Source::MssWeb | Source::BizInfoWeb => map_scraped(source, raw),
    };
    record.status = compute_status(record.application_end.as_deref(), today);
    record
}

/// 공공데이터포털 MSIT notice.
fn map_data_go_kr(raw: &RawItem) -> Announcement {
    Announcement {
        source_id: raw.text_or_default("pblancId"),
        title: raw.text_or_default("pblancNm"),
        organization: raw.text_or_default("insttNm"),
        category: raw.text_or_default("pblancClNm"),
        support_type: "일반".to_string(),
        application_start: normalize_date(raw.raw_str("rcptBgngDt")),
        application_end: normalize_date(raw.raw_str("rcptEndDt")),
        content: raw.text_or_default("pblancCn"),
        ..Announcement::new(Source::DataGoKr)
    }
}

/// 나라장터 service bid.
fn map_narajangteo(raw: &RawItem) -> Announcement {
    Announcement {
        source_id: raw.text_or_default("bidNtceNo"),
        title: raw.text_or_default("bidNtceNm"),
        organization: raw.text_or_default("ntceInsttNm"),
        category: "용역".to_string(),
        support_type: "입찰".to_string(),
        support_amount: raw.text("presmptPrce"),
        application_start: date_part(raw.raw_str("bidNtceDt")),
        application_end: date_part(raw.raw_str("bidClseDt")),
        content: raw.text_or_default("ntceSpecDocUrl1"),
        ..Announcement::new(Source::NaraJangteo)
    }
}

/// 기업마당 open API program.
fn map_bizinfo(raw: &RawItem) -> Announcement {
    let (application_start, application_end) = split_range(raw.raw_str("reqstBeginEndDe"));

    Announcement {
        source_id: raw.text_or_default("pblancId"),
        title: raw.text_or_default("pblancNm"),
        organization: raw.text_or_default("jrsdInsttNm"),
        category: map_category(&raw.text_or_default("polyBizSecd")),
        support_type: raw.text_or_default("sportCn"),
        target_company: raw.text("trgetNm"),
        application_start,
        application_end,
        content: raw.text_or_default("bsnsSumryCn"),
        ..Announcement::new(Source::BizInfo)
    }
}

/// 중소벤처24 announcement.
fn map_smes(raw: &RawItem) -> Announcement {
    Announcement {
        source_id: raw.text_or_default("pblancSeq"),
        title: raw.text_or_default("pblancNm"),
        organization: raw.text_or_default("sportInsttNm"),
        category: raw.text_or_default("bizType"),
        support_type: raw.text_or_default("sportType"),
        target_company: raw.text("cmpScale"),
        application_start: normalize_date(raw.raw_str("pblancBgnDt")),
        application_end: normalize_date(raw.raw_str("pblancEndDt")),
        content: raw.text_or_default("pblancDtlUrl"),
        ..Announcement::new(Source::Smes)
    }
}

/// A row scraped from an HTML board.
///
/// Rows carry no upstream id; the id is read from the detail link when the
/// link has one, otherwise the link itself is used.
fn map_scraped(source: Source, raw: &RawItem) -> Announcement {
    let link = raw.text_or_default("link");
    let content = raw.text_or_default("content");
    let (application_start, application_end) = extract_date_range(&content).unzip();

    Announcement {
        source_id: extract_notice_id(&link).unwrap_or(link),
        title: raw.text_or_default("title"),
        organization: raw.text_or_default("organization"),
        application_start,
        application_end,
        content,
        ..Announcement::new(source)
    }
}
