//! Application configuration structures.
//!
//! Loaded once at process start and passed into every client and sink.
//! Credentials are never read from the TOML file; they come from the
//! environment via [`Credentials::from_env`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Source;
use crate::utils::parse_selector;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP behavior shared by every client
    #[serde(default)]
    pub http: HttpConfig,

    /// Per-source endpoints and windows
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Remote upsert target
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local export paths
    #[serde(default)]
    pub export: ExportConfig,

    /// Secrets from the environment
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Attach credentials read from the environment.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.retry_count == 0 {
            return Err(AppError::validation("http.retry_count must be > 0"));
        }
        if self.sources.smes.max_pages == 0 {
            return Err(AppError::validation("sources.smes.max_pages must be > 0"));
        }
        if self.remote.table.trim().is_empty() {
            return Err(AppError::validation("remote.table is empty"));
        }
        for board in &self.sources.web {
            if !board.source.is_scraped() {
                return Err(AppError::validation(format!(
                    "web board {} uses non-web source tag {}",
                    board.list_url, board.source
                )));
            }
            parse_selector(&board.row_selector)?;
            parse_selector(&board.title_selector)?;
        }
        Ok(())
    }
}

/// HTTP client and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Pause between sources in milliseconds
    #[serde(default = "defaults::source_delay")]
    pub source_delay_ms: u64,

    /// Pause between pages of one source in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    /// Attempts per HTML page fetch
    #[serde(default = "defaults::retry_count")]
    pub retry_count: u32,

    /// Pause between HTML fetch attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            source_delay_ms: defaults::source_delay(),
            page_delay_ms: defaults::page_delay(),
            retry_count: defaults::retry_count(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Endpoints for every upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub data_go_kr: DataGoKrConfig,

    #[serde(default)]
    pub narajangteo: NaraJangteoConfig,

    #[serde(default)]
    pub bizinfo: BizInfoConfig,

    #[serde(default)]
    pub smes: SmesConfig,

    /// HTML boards crawled directly
    #[serde(default = "defaults::web_boards")]
    pub web: Vec<WebBoardConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            data_go_kr: DataGoKrConfig::default(),
            narajangteo: NaraJangteoConfig::default(),
            bizinfo: BizInfoConfig::default(),
            smes: SmesConfig::default(),
            web: defaults::web_boards(),
        }
    }
}

/// 공공데이터포털 MSIT notice list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataGoKrConfig {
    #[serde(default = "defaults::data_go_kr_url")]
    pub url: String,

    #[serde(default = "defaults::rows")]
    pub rows: u32,

    /// Window start, in days before today
    #[serde(default = "defaults::data_go_kr_lookback")]
    pub lookback_days: i64,

    /// Expected `response.header.resultCode` when the header is present
    #[serde(default = "defaults::code_00")]
    pub success_code: String,
}

impl Default for DataGoKrConfig {
    fn default() -> Self {
        Self {
            url: defaults::data_go_kr_url(),
            rows: defaults::rows(),
            lookback_days: defaults::data_go_kr_lookback(),
            success_code: defaults::code_00(),
        }
    }
}

/// 나라장터 service bid list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaraJangteoConfig {
    #[serde(default = "defaults::narajangteo_url")]
    pub url: String,

    #[serde(default = "defaults::rows")]
    pub rows: u32,

    #[serde(default = "defaults::narajangteo_lookback")]
    pub lookback_days: i64,
}

impl Default for NaraJangteoConfig {
    fn default() -> Self {
        Self {
            url: defaults::narajangteo_url(),
            rows: defaults::rows(),
            lookback_days: defaults::narajangteo_lookback(),
        }
    }
}

/// 기업마당 open API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BizInfoConfig {
    #[serde(default = "defaults::bizinfo_url")]
    pub url: String,

    #[serde(default = "defaults::rows")]
    pub page_unit: u32,
}

impl Default for BizInfoConfig {
    fn default() -> Self {
        Self {
            url: defaults::bizinfo_url(),
            page_unit: defaults::rows(),
        }
    }
}

/// 중소벤처24 announcement APIs.
///
/// The period API and the paged API report success with different codes,
/// so each carries its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmesConfig {
    #[serde(default = "defaults::smes_range_url")]
    pub range_url: String,

    #[serde(default = "defaults::code_0")]
    pub range_success_code: String,

    #[serde(default = "defaults::smes_lookback")]
    pub lookback_days: i64,

    #[serde(default = "defaults::smes_lookahead")]
    pub lookahead_days: i64,

    #[serde(default = "defaults::smes_paged_url")]
    pub paged_url: String,

    #[serde(default = "defaults::code_00")]
    pub paged_success_code: String,

    #[serde(default = "defaults::rows")]
    pub page_size: u32,

    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

impl Default for SmesConfig {
    fn default() -> Self {
        Self {
            range_url: defaults::smes_range_url(),
            range_success_code: defaults::code_0(),
            lookback_days: defaults::smes_lookback(),
            lookahead_days: defaults::smes_lookahead(),
            paged_url: defaults::smes_paged_url(),
            paged_success_code: defaults::code_00(),
            page_size: defaults::rows(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// How a board list page is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
}

/// A form field sent with a board list request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    /// `{year}` is replaced with the current year
    #[serde(default)]
    pub value: String,
}

/// An HTML board crawled with CSS selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebBoardConfig {
    /// Source tag for records from this board
    pub source: Source,

    /// List page URL
    pub list_url: String,

    #[serde(default)]
    pub method: RequestMethod,

    #[serde(default)]
    pub form: Vec<FormField>,

    /// CSS selector for one announcement row
    pub row_selector: String,

    /// CSS selector for the title element inside a row
    pub title_selector: String,

    /// Organization used when none can be read from the row text
    pub default_organization: String,

    /// Whether row links are kept (some boards only have script links)
    #[serde(default = "defaults::yes")]
    pub keep_links: bool,
}

/// Remote PostgREST-style table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Overrides the base URL from the environment
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "defaults::table")]
    pub table: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            table: defaults::table(),
        }
    }
}

/// Local export targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "defaults::xlsx_path")]
    pub xlsx_path: PathBuf,

    #[serde(default = "defaults::json_path")]
    pub json_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            xlsx_path: defaults::xlsx_path(),
            json_path: defaults::json_path(),
        }
    }
}

/// Secrets and endpoints supplied through the environment.
///
/// Blank values are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub data_go_kr_key: Option<String>,
    pub bizinfo_key: Option<String>,
    pub smes_token: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl Credentials {
    /// Read credentials from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup (used by tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).and_then(non_blank);
        let data_go_kr_key = get("DATA_GO_KR_API_KEY");

        Self {
            bizinfo_key: get("BIZINFO_API_KEY").or_else(|| data_go_kr_key.clone()),
            data_go_kr_key,
            smes_token: get("SMES_API_TOKEN"),
            supabase_url: get("SUPABASE_URL").or_else(|| get("NEXT_PUBLIC_SUPABASE_URL")),
            supabase_key: get("SUPABASE_SERVICE_ROLE_KEY"),
        }
    }

    /// Human-readable presence report; never prints secret values.
    pub fn status(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("DATA_GO_KR_API_KEY", self.data_go_kr_key.is_some()),
            ("BIZINFO_API_KEY", self.bizinfo_key.is_some()),
            ("SMES_API_TOKEN", self.smes_token.is_some()),
            ("SUPABASE_URL", self.supabase_url.is_some()),
            ("SUPABASE_SERVICE_ROLE_KEY", self.supabase_key.is_some()),
        ]
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

mod defaults {
    use std::path::PathBuf;

    use super::{FormField, RequestMethod, WebBoardConfig};
    use crate::models::Source;

    // HTTP defaults
    pub fn user_agent() -> String {
        "GovHelper/1.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn source_delay() -> u64 {
        1000
    }
    pub fn page_delay() -> u64 {
        1000
    }
    pub fn retry_count() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        2000
    }
    pub fn yes() -> bool {
        true
    }

    // Source defaults
    pub fn rows() -> u32 {
        100
    }
    pub fn code_0() -> String {
        "0".into()
    }
    pub fn code_00() -> String {
        "00".into()
    }
    pub fn data_go_kr_url() -> String {
        "http://apis.data.go.kr/1360000/NtceInfoService/getNtceInfoList".into()
    }
    pub fn data_go_kr_lookback() -> i64 {
        30
    }
    pub fn narajangteo_url() -> String {
        "http://apis.data.go.kr/1230000/BidPublicInfoService04/getBidPblancListInfoServcPPSSrch"
            .into()
    }
    pub fn narajangteo_lookback() -> i64 {
        7
    }
    pub fn bizinfo_url() -> String {
        "https://www.bizinfo.go.kr/uss/rss/bizinfoApi.do".into()
    }
    pub fn smes_range_url() -> String {
        "https://www.smes.go.kr/main/fnct/apiReqst/extPblancInfo".into()
    }
    pub fn smes_paged_url() -> String {
        "https://www.smes.go.kr/fnct/apiReqst/extPblancInfo".into()
    }
    pub fn smes_lookback() -> i64 {
        180
    }
    pub fn smes_lookahead() -> i64 {
        90
    }
    pub fn max_pages() -> u32 {
        5
    }

    pub fn web_boards() -> Vec<WebBoardConfig> {
        vec![
            WebBoardConfig {
                source: Source::MssWeb,
                list_url: "https://www.mss.go.kr/site/smba/ex/bbs/List.do?cbIdx=310".into(),
                method: RequestMethod::Get,
                form: Vec::new(),
                row_selector: "tbody tr".into(),
                title_selector: "td.subject a, td a".into(),
                default_organization: "중소벤처기업부".into(),
                keep_links: true,
            },
            WebBoardConfig {
                source: Source::BizInfoWeb,
                list_url: "https://www.bizinfo.go.kr/see/seea/selectSEEA120List.do".into(),
                method: RequestMethod::Post,
                form: [
                    ("pageIndex", "1"),
                    ("recordCountPerPage", "100"),
                    ("pblancSe", ""),
                    ("bizPldirCode", ""),
                    ("bsnsSportSe", ""),
                    ("areaNm", ""),
                    ("jrsdInsttNm", ""),
                    ("searchKwrd", "{year}"),
                ]
                .into_iter()
                .map(|(name, value)| FormField {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
                row_selector: ".tbl_list tbody tr, .list_item, .biz_list li".into(),
                title_selector: "a, .title, .subject".into(),
                default_organization: "기업마당".into(),
                keep_links: false,
            },
        ]
    }

    // Persistence defaults
    pub fn table() -> String {
        "announcements".into()
    }
    pub fn xlsx_path() -> PathBuf {
        PathBuf::from("announcements.xlsx")
    }
    pub fn json_path() -> PathBuf {
        PathBuf::from("announcements.json")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.sources.web[0].row_selector = "[[invalid".to_string();
        assert!(matches!(config.validate(), Err(AppError::Selector { .. })));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [http]
            timeout_secs = 15

            [sources.smes]
            paged_success_code = "0"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.timeout_secs, 15);
        assert_eq!(config.http.user_agent, "GovHelper/1.0");
        assert_eq!(config.sources.smes.paged_success_code, "0");
        assert_eq!(config.sources.smes.range_success_code, "0");
        assert_eq!(config.sources.web.len(), 2);
    }

    #[test]
    fn bundled_config_loads_and_validates() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("collector.toml");
        let config = Config::load(&path).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.sources.web.len(), 2);
        assert_eq!(config.sources.web[1].method, RequestMethod::Post);
        assert!(!config.sources.web[1].keep_links);
        assert_eq!(config.sources.web[1].form[7].value, "{year}");
    }

    #[test]
    fn credentials_treat_blank_as_absent() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATA_GO_KR_API_KEY", "key-1"),
            ("SMES_API_TOKEN", "   "),
            ("NEXT_PUBLIC_SUPABASE_URL", "https://db.example.com"),
        ]);
        let creds = Credentials::from_lookup(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(creds.data_go_kr_key.as_deref(), Some("key-1"));
        assert_eq!(creds.bizinfo_key.as_deref(), Some("key-1"));
        assert!(creds.smes_token.is_none());
        assert_eq!(creds.supabase_url.as_deref(), Some("https://db.example.com"));
        assert!(creds.supabase_key.is_none());
    }
}
