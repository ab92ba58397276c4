// src/services/web.rs

//! HTML board crawler.
//!
//! Fetches a board list page and reads one raw record per row using the
//! board's configured CSS selectors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{HttpConfig, RawItem, RequestMethod, Source, WebBoardConfig};
use crate::services::transport::{HttpTransport, params};
use crate::services::{SourceClient, settle};
use crate::utils::http::{delay, pause};
use crate::utils::{extract_organization, normalize_whitespace, parse_selector, resolve_url};

/// Service for crawling one HTML announcement board.
pub struct WebBoardClient {
    transport: Arc<dyn HttpTransport>,
    board: WebBoardConfig,
    retries: u32,
    retry_delay: Duration,
}

impl WebBoardClient {
    /// Create a crawler for `board` with the configured retry policy.
    pub fn new(transport: Arc<dyn HttpTransport>, board: WebBoardConfig, http: &HttpConfig) -> Self {
        Self {
            transport,
            board,
            retries: http.retry_count.max(1),
            retry_delay: delay(http.retry_delay_ms),
        }
    }

    /// Fetch the list page HTML, retrying a fixed number of times.
    pub async fn fetch_html(&self, year: i32) -> Result<String> {
        let form = params(
            self.board
                .form
                .iter()
                .map(|f| (f.name.clone(), f.value.replace("{year}", &year.to_string()))),
        );
        let url = &self.board.list_url;

        let mut attempt = 1;
        loop {
            let response = match self.board.method {
                RequestMethod::Get => self.transport.get(url, &form).await,
                RequestMethod::Post => self.transport.post_form(url, &form).await,
            }
            .and_then(|r| r.error_for_status(url));

            match response {
                Ok(response) => return Ok(response.body),
                Err(e) if attempt < self.retries => {
                    log::debug!(
                        "[{}] attempt {}/{} failed: {}",
                        self.board.source,
                        attempt,
                        self.retries,
                        e
                    );
                    attempt += 1;
                    pause(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn crawl(&self, today: NaiveDate) -> Result<Vec<RawItem>> {
        log::info!("[{}] crawling {}", self.board.source, self.board.list_url);
        let html = self.fetch_html(today.year()).await?;
        let items = parse_board(&self.board, &html)?;
        if items.is_empty() {
            log::warn!(
                "[{}] no rows matched '{}'; the page structure may have changed",
                self.board.source,
                self.board.row_selector
            );
        }
        Ok(items)
    }
}

#[async_trait]
impl SourceClient for WebBoardClient {
    fn source(&self) -> Source {
        self.board.source
    }

    async fn fetch(&self, today: NaiveDate) -> Vec<RawItem> {
        settle(self.source(), self.crawl(today).await)
    }
}

/// Parse every row of a board page.
///
/// Only invalid selectors are an error; rows without a usable title are
/// skipped one by one.
pub fn parse_board(board: &WebBoardConfig, html: &str) -> Result<Vec<RawItem>> {
    let row_sel = parse_selector(&board.row_selector)?;
    let title_sel = parse_selector(&board.title_selector)?;
    let base_url = Url::parse(&board.list_url).ok();
    let scraped_at = Utc::now().to_rfc3339();

    let document = Html::parse_document(html);
    let items = document
        .select(&row_sel)
        .filter_map(|row| parse_row(board, &row, &title_sel, base_url.as_ref()))
        .map(|item| item.with("scraped_at", scraped_at.clone()))
        .collect();

    Ok(items)
}

fn parse_row(
    board: &WebBoardConfig,
    row: &ElementRef,
    title_sel: &Selector,
    base_url: Option<&Url>,
) -> Option<RawItem> {
    let title_elem = row.select(title_sel).next()?;
    let title = normalize_whitespace(&title_elem.text().collect::<String>());
    if title.is_empty() {
        return None;
    }

    let content = row
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let content = normalize_whitespace(&content);

    let link = title_elem
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| board.keep_links && !href.is_empty() && !href.starts_with("javascript:"))
        .map(|href| match base_url {
            Some(base) => resolve_url(base, href),
            None => href.to_string(),
        })
        .unwrap_or_default();

    let organization =
        extract_organization(&content).unwrap_or_else(|| board.default_organization.clone());

    Some(
        RawItem::new()
            .with("title", title)
            .with("content", content)
            .with("link", link)
            .with("organization", organization),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use crate::services::HttpResponse;
    use crate::testutil::{MockTransport, today};

    fn mss_board() -> WebBoardConfig {
        Config::default().sources.web[0].clone()
    }

    fn bizinfo_board() -> WebBoardConfig {
        Config::default().sources.web[1].clone()
    }

    fn fast_http() -> HttpConfig {
        HttpConfig {
            retry_delay_ms: 0,
            ..HttpConfig::default()
        }
    }

    const MSS_PAGE: &str = r#"
        <table><tbody>
          <tr>
            <td>1052</td>
            <td class="subject"><a href="View.do?cbIdx=310&bcIdx=1052">2025년 창업도약패키지
                 참여기업 모집</a></td>
            <td>창업진흥원</td><td>2025.05.01 ~ 2025.05.15</td>
          </tr>
          <tr><td>공지 없음</td></tr>
          <tr>
            <td>1051</td>
            <td class="subject"><a href="View.do?cbIdx=310&bcIdx=1051">수출 지원 안내</a></td>
            <td>2025-04-30</td>
          </tr>
        </tbody></table>
    "#;

    #[test]
    fn test_parse_mss_rows() {
        let items = parse_board(&mss_board(), MSS_PAGE).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(
            first.text("title").as_deref(),
            Some("2025년 창업도약패키지 참여기업 모집")
        );
        assert_eq!(
            first.text("link").as_deref(),
            Some("https://www.mss.go.kr/site/smba/ex/bbs/View.do?cbIdx=310&bcIdx=1052")
        );
        assert_eq!(first.text("organization").as_deref(), Some("창업진흥원"));
        assert!(first.text("content").unwrap().contains("2025.05.01 ~ 2025.05.15"));

        assert_eq!(items[1].text("organization").as_deref(), Some("중소벤처기업부"));
    }

    #[test]
    fn test_changed_structure_is_zero_rows() {
        let items = parse_board(&mss_board(), "<div class='new-layout'>공고</div>").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_bizinfo_list_items_drop_links() {
        let html = r#"
            <ul class="biz_list">
              <li><a href="javascript:fnDetail('PBLN_1')">2025 스마트공장 지원</a> 중소기업기술정보진흥원</li>
              <li><span>제목 없음</span></li>
            </ul>
        "#;
        let items = parse_board(&bizinfo_board(), html).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text("link"), None);
        assert_eq!(
            items[0].text("organization").as_deref(),
            Some("중소기업기술정보진흥원")
        );
    }

    #[tokio::test]
    async fn test_post_board_sends_year_keyword() {
        let transport = Arc::new(MockTransport::new());
        transport.push(Ok(HttpResponse::new(200, "<html></html>")));
        let client = WebBoardClient::new(
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            bizinfo_board(),
            &fast_http(),
        );

        assert!(client.fetch(today()).await.is_empty());

        let request = &transport.requests()[0];
        assert_eq!(request.method, "POST");
        assert!(request.params.contains(&("searchKwrd".to_string(), "2025".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_retries_then_succeeds() {
        let transport = Arc::new(MockTransport::new());
        transport.push_timeout();
        transport.push(Ok(HttpResponse::new(502, "bad gateway")));
        transport.push(Ok(HttpResponse::new(200, MSS_PAGE)));
        let client = WebBoardClient::new(
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            mss_board(),
            &fast_http(),
        );

        let items = client.fetch(today()).await;
        assert_eq!(items.len(), 2);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_retries() {
        let transport = Arc::new(MockTransport::new());
        for _ in 0..3 {
            transport.push_timeout();
        }
        let client = WebBoardClient::new(
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            mss_board(),
            &fast_http(),
        );

        assert!(client.fetch(today()).await.is_empty());
        assert_eq!(transport.requests().len(), 3);
    }
}
