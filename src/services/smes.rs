// src/services/smes.rs

//! 중소벤처24 announcement API clients.
//!
//! Two endpoints serve the same records: a period query that answers with
//! result code `0`, and a paged query that answers with `00` and sometimes
//! only accepts POST. Their success codes are configured separately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{RawItem, SmesConfig, Source, coerce_items};
use crate::services::transport::{HttpResponse, HttpTransport, params};
use crate::services::{FetchWindow, SourceClient, check_result_code, require, settle};
use crate::utils::http::pause;

const TOKEN: &str = "SMES_API_TOKEN";

/// Parse a SMES response body into items, checking the result code.
fn read_items(
    response: HttpResponse,
    url: &str,
    success_code: &str,
) -> Result<Vec<RawItem>> {
    let doc = response.json(url)?;
    check_result_code(&doc, &["resultCd"], &["resultMsg"], success_code, url)?;
    Ok(coerce_items(doc.get("data")))
}

/// Period query: everything registered in a window around today.
pub struct SmesRangeClient {
    transport: Arc<dyn HttpTransport>,
    config: SmesConfig,
    token: Option<String>,
}

impl SmesRangeClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: SmesConfig, token: Option<String>) -> Self {
        Self {
            transport,
            config,
            token,
        }
    }

    /// Fetch announcements between `start` and `end` (`YYYYMMDD`).
    pub async fn fetch_range(&self, start: &str, end: &str) -> Result<Vec<RawItem>> {
        let token = require(self.token.as_deref(), TOKEN)?;
        let query = params([
            ("token", token.to_string()),
            ("strDt", start.to_string()),
            ("endDt", end.to_string()),
        ]);

        log::info!("[{}] requesting {} ~ {}", Source::Smes, start, end);
        let url = &self.config.range_url;
        let response = self.transport.get(url, &query).await?;
        read_items(response, url, &self.config.range_success_code)
    }
}

#[async_trait]
impl SourceClient for SmesRangeClient {
    fn source(&self) -> Source {
        Source::Smes
    }

    async fn fetch(&self, today: NaiveDate) -> Vec<RawItem> {
        let window = FetchWindow::around(
            today,
            self.config.lookback_days,
            self.config.lookahead_days,
        );
        let (start, end) = window.compact();
        settle(self.source(), self.fetch_range(&start, &end).await)
    }
}

/// Paged query with a single GET → POST fallback per page.
pub struct SmesPagedClient {
    transport: Arc<dyn HttpTransport>,
    config: SmesConfig,
    token: Option<String>,
    page_delay: Duration,
}

impl SmesPagedClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: SmesConfig,
        token: Option<String>,
        page_delay: Duration,
    ) -> Self {
        Self {
            transport,
            config,
            token,
            page_delay,
        }
    }

    /// Fetch one page. A failed GET (transport error, non-2xx, malformed
    /// JSON or unexpected result code) is retried exactly once via POST
    /// with the same parameters.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<RawItem>> {
        let token = require(self.token.as_deref(), TOKEN)?;
        let form = params([
            ("token", token.to_string()),
            ("pageNo", page.to_string()),
            ("numOfRows", self.config.page_size.to_string()),
        ]);
        let url = &self.config.paged_url;
        let code = &self.config.paged_success_code;

        let via_get = match self.transport.get(url, &form).await {
            Ok(response) => read_items(response, url, code),
            Err(e) => Err(e),
        };

        match via_get {
            Ok(items) => Ok(items),
            Err(e) => {
                log::warn!("[{}] GET page {} failed ({}), retrying via POST", Source::Smes, page, e);
                let response = self.transport.post_form(url, &form).await?;
                read_items(response, url, code)
            }
        }
    }

    /// Fetch pages `1..=max_pages`, stopping at the first empty or failed page.
    pub async fn fetch_all(&self) -> Result<Vec<RawItem>> {
        require(self.token.as_deref(), TOKEN)?;
        let mut all = Vec::new();

        for page in 1..=self.config.max_pages {
            log::info!("[{}] page {}/{}", Source::Smes, page, self.config.max_pages);
            let items = match self.fetch_page(page).await {
                Ok(items) => items,
                Err(e) => {
                    log::error!("[{}] page {} failed: {}", Source::Smes, page, e);
                    break;
                }
            };
            if items.is_empty() {
                break;
            }
            all.extend(items);
            if page < self.config.max_pages {
                pause(self.page_delay).await;
            }
        }

        Ok(all)
    }
}

#[async_trait]
impl SourceClient for SmesPagedClient {
    fn source(&self) -> Source {
        Source::Smes
    }

    async fn fetch(&self, _today: NaiveDate) -> Vec<RawItem> {
        settle(self.source(), self.fetch_all().await)
    }
}
