//! Remote table upsert over a PostgREST-style REST interface.
//!
//! Each record is POSTed individually with `Prefer: resolution=merge-duplicates`
//! against the `(source, source_id)` unique constraint, so a re-run
//! overwrites rather than duplicates.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Announcement, Credentials, RemoteConfig};
use crate::services::HttpTransport;
use crate::services::transport::params;
use crate::storage::AnnouncementSink;

/// Sink writing to `{base_url}/rest/v1/{table}`.
pub struct RemoteUpsertSink {
    transport: Arc<dyn HttpTransport>,
    base_url: Option<String>,
    api_key: Option<String>,
    table: String,
}

impl RemoteUpsertSink {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        remote: &RemoteConfig,
        credentials: &Credentials,
    ) -> Self {
        Self {
            transport,
            base_url: remote
                .base_url
                .clone()
                .or_else(|| credentials.supabase_url.clone()),
            api_key: credentials.supabase_key.clone(),
            table: remote.table.clone(),
        }
    }

    /// Upsert URL for the configured table.
    pub fn endpoint(base_url: &str, table: &str) -> String {
        format!(
            "{}/rest/v1/{}?on_conflict=source,source_id",
            base_url.trim_end_matches('/'),
            table
        )
    }

    fn target(&self) -> Result<(String, &str)> {
        let base = self
            .base_url
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| AppError::not_configured("SUPABASE_URL"))?;
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::not_configured("SUPABASE_SERVICE_ROLE_KEY"))?;
        Ok((Self::endpoint(base, &self.table), key))
    }

    async fn upsert(&self, url: &str, key: &str, record: &Announcement) -> Result<()> {
        let headers = params([
            ("apikey", key.to_string()),
            ("Authorization", format!("Bearer {key}")),
            ("Prefer", "resolution=merge-duplicates".to_string()),
        ]);
        let body = serde_json::to_value(record)?;
        let response = self.transport.post_json(url, &headers, &body).await?;

        if response.is_success() {
            Ok(())
        } else {
            Err(AppError::persistence(
                format!("{}/{}", record.source, record.source_id),
                format!("HTTP {}: {}", response.status, response.body),
            ))
        }
    }
}

#[async_trait]
impl AnnouncementSink for RemoteUpsertSink {
    fn name(&self) -> &str {
        "remote"
    }

    async fn write(&self, records: &[Announcement]) -> Result<usize> {
        let (url, key) = match self.target() {
            Ok(target) => target,
            Err(e) => {
                log::warn!("[remote] {e}; {} records not saved", records.len());
                return Ok(0);
            }
        };

        let mut saved = 0;
        for record in records {
            match self.upsert(&url, key, record).await {
                Ok(()) => saved += 1,
                Err(e) => log::error!("[remote] failed to save: {e}"),
            }
        }

        log::info!("[remote] saved {}/{} records", saved, records.len());
        Ok(saved)
    }
}
