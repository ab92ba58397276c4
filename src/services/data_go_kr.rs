// src/services/data_go_kr.rs

//! 공공데이터포털 MSIT notice list client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{DataGoKrConfig, RawItem, Source, coerce_items, lookup};
use crate::services::transport::{HttpTransport, params};
use crate::services::{FetchWindow, SourceClient, check_result_code, require, settle};

/// Client for `NtceInfoService/getNtceInfoList`.
pub struct DataGoKrClient {
    transport: Arc<dyn HttpTransport>,
    config: DataGoKrConfig,
    api_key: Option<String>,
    window: Option<FetchWindow>,
}

impl DataGoKrClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: DataGoKrConfig,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            config,
            api_key,
            window: None,
        }
    }

    /// Use an explicit window instead of the configured lookback.
    pub fn with_window(mut self, window: Option<FetchWindow>) -> Self {
        self.window = window;
        self
    }

    /// Fetch notices registered between `start` and `end` (`YYYYMMDD`).
    pub async fn fetch_range(&self, start: &str, end: &str) -> Result<Vec<RawItem>> {
        let key = require(self.api_key.as_deref(), "DATA_GO_KR_API_KEY")?;
        let query = params([
            ("serviceKey", key.to_string()),
            ("numOfRows", self.config.rows.to_string()),
            ("pageNo", "1".to_string()),
            ("type", "json".to_string()),
            ("bgngDt", start.to_string()),
            ("endDt", end.to_string()),
        ]);

        log::info!("[{}] requesting {} ~ {}", Source::DataGoKr, start, end);
        let doc = self
            .transport
            .get(&self.config.url, &query)
            .await?
            .json(&self.config.url)?;

        // The header is optional on this API; only check it when present.
        if lookup(&doc, &["response", "header", "resultCode"]).is_some() {
            check_result_code(
                &doc,
                &["response", "header", "resultCode"],
                &["response", "header", "resultMsg"],
                &self.config.success_code,
                &self.config.url,
            )?;
        }

        Ok(coerce_items(lookup(
            &doc,
            &["response", "body", "items", "item"],
        )))
    }
}

#[async_trait]
impl SourceClient for DataGoKrClient {
    fn source(&self) -> Source {
        Source::DataGoKr
    }

    async fn fetch(&self, today: NaiveDate) -> Vec<RawItem> {
        let window = self
            .window
            .unwrap_or_else(|| FetchWindow::around(today, self.config.lookback_days, 0));
        let (start, end) = window.compact();
        settle(self.source(), self.fetch_range(&start, &end).await)
    }
}
