//! GovHelper collector CLI
//!
//! Local execution entry point for scheduled collection runs.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use collector::{
    error::{AppError, Result},
    mapper::parse_date,
    models::{Config, Credentials},
    pipeline::{Collector, DedupKey, Freshness, Orchestrator, PersistMode},
    services::{
        BizInfoClient, DataGoKrClient, FetchWindow, HttpTransport, NaraJangteoClient,
        ReqwestTransport, SmesPagedClient, SmesRangeClient, WebBoardClient,
    },
    storage::{FileExportSink, RemoteUpsertSink},
    utils::http::delay,
};

/// GovHelper - Government Support Announcement Collector
#[derive(Parser, Debug)]
#[command(
    name = "collector",
    version,
    about = "Collects government support-program announcements"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "collector.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect from the open-data APIs and upsert into the remote table
    Collect {
        /// First registration day (YYYYMMDD); requires --end
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Last registration day (YYYYMMDD); requires --start
        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Export currently open 중소벤처24 announcements to files
    Smes {
        /// Spreadsheet output path
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// JSON output path
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Crawl the paged API and web boards, export the combined result
    Crawl {
        /// Override sources.smes.max_pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Spreadsheet output path
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// JSON output path
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Validate configuration and report credential status
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    parse_date(value)
        .ok_or_else(|| AppError::config(format!("invalid date '{value}', expected YYYYMMDD")))
}

fn http_transport(config: &Config) -> Result<Arc<dyn HttpTransport>> {
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config.http)?);
    Ok(transport)
}

/// Check the configuration and report which credentials are present.
fn validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("✓ Config OK ({} web boards)", config.sources.web.len());

    for (name, present) in config.credentials.status() {
        let mark = if present { "set" } else { "missing" };
        log::info!("  {name}: {mark}");
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config).with_credentials(Credentials::from_env());
    log::info!("Loaded configuration from {}", cli.config.display());

    let today = Local::now().date_naive();
    let source_delay = delay(config.http.source_delay_ms);
    let credentials = &config.credentials;

    let report = match cli.command {
        Command::Validate => return validate(&config),

        Command::Collect { start, end } => {
            let transport = http_transport(&config)?;
            let window = match (start, end) {
                (Some(start), Some(end)) => {
                    Some(FetchWindow::new(parse_day(&start)?, parse_day(&end)?))
                }
                _ => None,
            };

            let sources = &config.sources;
            let collectors = vec![
                Collector::new(
                    DataGoKrClient::new(
                        Arc::clone(&transport),
                        sources.data_go_kr.clone(),
                        credentials.data_go_kr_key.clone(),
                    )
                    .with_window(window),
                ),
                Collector::new(
                    NaraJangteoClient::new(
                        Arc::clone(&transport),
                        sources.narajangteo.clone(),
                        credentials.data_go_kr_key.clone(),
                    )
                    .with_window(window),
                ),
                Collector::new(BizInfoClient::new(
                    Arc::clone(&transport),
                    sources.bizinfo.clone(),
                    credentials.bizinfo_key.clone(),
                )),
            ];

            let sink = RemoteUpsertSink::new(Arc::clone(&transport), &config.remote, credentials);
            Orchestrator::new(collectors)
                .with_source_delay(source_delay)
                .run(&sink, PersistMode::PerSource, today)
                .await
        }

        Command::Smes { xlsx, json } => {
            let transport = http_transport(&config)?;
            let client = SmesRangeClient::new(
                Arc::clone(&transport),
                config.sources.smes.clone(),
                credentials.smes_token.clone(),
            );
            let collectors = vec![Collector::new(client).with_freshness(Freshness::OpenOn)];

            let sink = FileExportSink::new(
                Some(xlsx.unwrap_or_else(|| config.export.xlsx_path.clone())),
                Some(json.unwrap_or_else(|| config.export.json_path.clone())),
            );
            Orchestrator::new(collectors)
                .run(&sink, PersistMode::Combined, today)
                .await
        }

        Command::Crawl {
            max_pages,
            xlsx,
            json,
        } => {
            let transport = http_transport(&config)?;
            let mut smes = config.sources.smes.clone();
            if let Some(max_pages) = max_pages {
                smes.max_pages = max_pages.max(1);
            }

            let mut collectors = vec![Collector::new(SmesPagedClient::new(
                Arc::clone(&transport),
                smes,
                credentials.smes_token.clone(),
                delay(config.http.page_delay_ms),
            ))];
            for board in &config.sources.web {
                let client = WebBoardClient::new(Arc::clone(&transport), board.clone(), &config.http);
                collectors.push(
                    Collector::new(client)
                        .dedup_by(DedupKey::Title)
                        .with_freshness(Freshness::ContainsYear(today.year())),
                );
            }

            let sink = FileExportSink::new(
                Some(xlsx.unwrap_or_else(|| config.export.xlsx_path.clone())),
                Some(json.unwrap_or_else(|| config.export.json_path.clone())),
            );
            Orchestrator::new(collectors)
                .with_source_delay(source_delay)
                .run(&sink, PersistMode::Combined, today)
                .await
        }
    };

    report.log_summary();
    log::info!("Done!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_subcommand_parses() {
        let cli = Cli::try_parse_from(["collector", "validate", "--config", "alt.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Validate));
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
    }

    #[test]
    fn test_collect_requires_both_bounds() {
        assert!(Cli::try_parse_from(["collector", "collect", "--start", "20250101"]).is_err());
        assert!(
            Cli::try_parse_from(["collector", "collect", "--start", "20250101", "--end", "20250131"])
                .is_ok()
        );
    }

    #[test]
    fn test_validate_reports_bad_config() {
        assert!(validate(&Config::default()).is_ok());

        let mut config = Config::default();
        config.sources.smes.max_pages = 0;
        assert!(validate(&config).is_err());
    }
}
