// src/services/narajangteo.rs

//! 나라장터 (조달청) service bid client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{NaraJangteoConfig, RawItem, Source, coerce_items, lookup};
use crate::services::transport::{HttpTransport, params};
use crate::services::{FetchWindow, SourceClient, require, settle};

/// Client for `getBidPblancListInfoServcPPSSrch`.
pub struct NaraJangteoClient {
    transport: Arc<dyn HttpTransport>,
    config: NaraJangteoConfig,
    api_key: Option<String>,
    window: Option<FetchWindow>,
}

impl NaraJangteoClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: NaraJangteoConfig,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            config,
            api_key,
            window: None,
        }
    }

    pub fn with_window(mut self, window: Option<FetchWindow>) -> Self {
        self.window = window;
        self
    }

    /// Fetch bids posted between two `YYYYMMDDHHMM` instants.
    pub async fn fetch_range(&self, start: &str, end: &str) -> Result<Vec<RawItem>> {
        let key = require(self.api_key.as_deref(), "DATA_GO_KR_API_KEY")?;
        let query = params([
            ("serviceKey", key.to_string()),
            ("numOfRows", self.config.rows.to_string()),
            ("pageNo", "1".to_string()),
            ("type", "json".to_string()),
            ("inqryBgnDt", start.to_string()),
            ("inqryEndDt", end.to_string()),
        ]);

        log::info!("[{}] requesting {} ~ {}", Source::NaraJangteo, start, end);
        let doc = self
            .transport
            .get(&self.config.url, &query)
            .await?
            .json(&self.config.url)?;

        Ok(coerce_items(lookup(&doc, &["response", "body", "items"])))
    }
}

#[async_trait]
impl SourceClient for NaraJangteoClient {
    fn source(&self) -> Source {
        Source::NaraJangteo
    }

    async fn fetch(&self, today: NaiveDate) -> Vec<RawItem> {
        let window = self
            .window
            .unwrap_or_else(|| FetchWindow::around(today, self.config.lookback_days, 0));
        let (start, end) = window.compact();
        let result = self
            .fetch_range(&format!("{start}0000"), &format!("{end}2359"))
            .await;
        settle(self.source(), result)
    }
}
