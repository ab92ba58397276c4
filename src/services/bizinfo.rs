// src/services/bizinfo.rs

//! 기업마당 open API client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{BizInfoConfig, RawItem, Source, coerce_items};
use crate::services::transport::{HttpTransport, params};
use crate::services::{SourceClient, require, settle};

/// Client for `bizinfoApi.do`.
pub struct BizInfoClient {
    transport: Arc<dyn HttpTransport>,
    config: BizInfoConfig,
    api_key: Option<String>,
}

impl BizInfoClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: BizInfoConfig,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            config,
            api_key,
        }
    }

    /// Fetch one page of support programs.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<RawItem>> {
        let key = require(self.api_key.as_deref(), "BIZINFO_API_KEY")?;
        let query = params([
            ("crtfcKey", key.to_string()),
            ("dataType", "json".to_string()),
            ("pageUnit", self.config.page_unit.to_string()),
            ("pageIndex", page.to_string()),
        ]);

        log::info!("[{}] requesting page {}", Source::BizInfo, page);
        let doc = self
            .transport
            .get(&self.config.url, &query)
            .await?
            .json(&self.config.url)?;

        Ok(coerce_items(doc.get("jsonArray")))
    }
}

#[async_trait]
impl SourceClient for BizInfoClient {
    fn source(&self) -> Source {
        Source::BizInfo
    }

    async fn fetch(&self, _today: NaiveDate) -> Vec<RawItem> {
        settle(self.source(), self.fetch_page(1).await)
    }
}
