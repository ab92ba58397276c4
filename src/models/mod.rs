// src/models/mod.rs

//! Domain models for the collector.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod announcement;
mod config;
mod raw;

// Re-export all public types
pub use announcement::{Announcement, Source, Status};
pub use config::{
    BizInfoConfig, Config, Credentials, DataGoKrConfig, ExportConfig, FormField, HttpConfig,
    NaraJangteoConfig, RemoteConfig, RequestMethod, SmesConfig, SourcesConfig, WebBoardConfig,
};
pub use raw::{RawItem, coerce_items, lookup};
