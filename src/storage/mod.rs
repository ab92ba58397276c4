//! Persistence sinks for collected announcements.
//!
//! Two interchangeable backends:
//! - `RemoteUpsertSink`: one merge-on-conflict POST per record
//! - `FileExportSink`: spreadsheet + JSON files, CSV when the spreadsheet fails

pub mod export;
pub mod remote;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Announcement;

// Re-export for convenience
pub use export::FileExportSink;
pub use remote::RemoteUpsertSink;

/// Something that accepts announcements and reports how many it kept.
#[async_trait]
pub trait AnnouncementSink: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &str;

    /// Persist `records`, returning the number written.
    ///
    /// Per-record failures are logged and excluded from the count; an `Err`
    /// means the whole batch could not be handled.
    async fn write(&self, records: &[Announcement]) -> Result<usize>;
}
