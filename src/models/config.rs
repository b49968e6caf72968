//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Listing pages fetched per crawl unless configured otherwise.
pub const DEFAULT_PAGE_COUNT: u32 = 5;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// CSS selectors for listing and detail pages
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Recurring job settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Bulk read listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,
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

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.source_url.trim().is_empty() {
            return Err(AppError::validation("crawler.source_url is empty"));
        }
        url::Url::parse(&self.crawler.site_root)
            .map_err(|e| AppError::validation(format!("crawler.site_root: {e}")))?;
        if self.crawler.page_count == 0 {
            return Err(AppError::validation("crawler.page_count must be > 0"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(AppError::validation("scheduler.interval_secs must be > 0"));
        }
        self.selectors.validate()?;
        self.database.validate()?;
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Listing URL prefix; the page number is appended to it
    #[serde(default = "defaults::source_url")]
    pub source_url: String,

    /// Site root that relative vacancy links are resolved against
    #[serde(default = "defaults::site_root")]
    pub site_root: String,

    /// Number of listing pages fetched per crawl
    #[serde(default = "defaults::page_count")]
    pub page_count: u32,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between requests in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            source_url: defaults::source_url(),
            site_root: defaults::site_root(),
            page_count: defaults::page_count(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: 0,
        }
    }
}

impl CrawlerConfig {
    /// URL of the listing page with the given 1-based number.
    pub fn page_url(&self, base_url: &str, page: u32) -> String {
        format!("{base_url}{page}")
    }
}

/// CSS selectors describing the vacancy markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// One vacancy card per match on a listing page
    #[serde(default = "defaults::row_selector")]
    pub row: String,

    /// Title element inside a card; its first child is the anchor
    #[serde(default = "defaults::title_selector")]
    pub title: String,

    /// Date element inside a card; its first child carries `datetime`
    #[serde(default = "defaults::date_selector")]
    pub date: String,

    /// Description element on the detail page
    #[serde(default = "defaults::description_selector")]
    pub description: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            row: defaults::row_selector(),
            title: defaults::title_selector(),
            date: defaults::date_selector(),
            description: defaults::description_selector(),
        }
    }
}

impl SelectorConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("row", &self.row),
            ("title", &self.title),
            ("date", &self.date),
            ("description", &self.description),
        ] {
            scraper::Selector::parse(value)
                .map_err(|e| AppError::validation(format!("selectors.{name}: {e:?}")))?;
        }
        Ok(())
    }
}

/// Recurring job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between two firings of the crawl job
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Bulk read listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

impl ServerConfig {
    /// Address the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Driver identifier; only PostgreSQL is supported
    #[serde(default = "defaults::driver")]
    pub driver: String,

    /// Connection URL, e.g. `postgres://localhost:5432/grabber`
    #[serde(default = "defaults::database_url")]
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Create the `post` table on startup if it is missing
    #[serde(default)]
    pub init_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: defaults::driver(),
            url: defaults::database_url(),
            username: None,
            password: None,
            init_schema: false,
        }
    }
}

impl DatabaseConfig {
    const SUPPORTED_DRIVERS: [&'static str; 2] = ["postgres", "postgresql"];

    /// Check the driver identifier and URL.
    pub fn validate(&self) -> Result<()> {
        let driver = self.driver.to_lowercase();
        if !Self::SUPPORTED_DRIVERS.contains(&driver.as_str()) {
            return Err(AppError::config(format!(
                "Unsupported database driver '{}'",
                self.driver
            )));
        }
        if self.url.trim().is_empty() {
            return Err(AppError::config("database.url is empty"));
        }
        Ok(())
    }
}

mod defaults {
    // Crawler defaults
    pub fn source_url() -> String {
        "https://career.habr.com/vacancies/java_developer?page=".into()
    }
    pub fn site_root() -> String {
        "https://career.habr.com".into()
    }
    pub fn page_count() -> u32 {
        super::DEFAULT_PAGE_COUNT
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; vacancy-grabber/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Selector defaults
    pub fn row_selector() -> String {
        ".vacancy-card__inner".into()
    }
    pub fn title_selector() -> String {
        ".vacancy-card__title".into()
    }
    pub fn date_selector() -> String {
        ".vacancy-card__date".into()
    }
    pub fn description_selector() -> String {
        ".job_show_description__vacancy_description".into()
    }

    // Scheduler defaults
    pub fn interval() -> u64 {
        300
    }

    // Server defaults
    pub fn host() -> String {
        "0.0.0.0".into()
    }
    pub fn port() -> u16 {
        9000
    }

    // Database defaults
    pub fn driver() -> String {
        "postgres".into()
    }
    pub fn database_url() -> String {
        "postgres://localhost:5432/grabber".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_page_count_is_five() {
        assert_eq!(Config::default().crawler.page_count, DEFAULT_PAGE_COUNT);
        assert_eq!(DEFAULT_PAGE_COUNT, 5);
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.scheduler.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_pages() {
        let mut config = Config::default();
        config.crawler.page_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_driver() {
        let mut config = Config::default();
        config.database.driver = "org.h2.Driver".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn validate_rejects_broken_selector() {
        let mut config = Config::default();
        config.selectors.row = "[[invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn page_url_appends_number() {
        let crawler = CrawlerConfig::default();
        assert_eq!(
            crawler.page_url(&crawler.source_url, 3),
            "https://career.habr.com/vacancies/java_developer?page=3"
        );
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[scheduler]
interval_secs = 10

[server]
port = 9100

[database]
url = "postgres://db:5432/grabber"
username = "grabber"
password = "secret"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.scheduler.interval(), Duration::from_secs(10));
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:9100");
        assert_eq!(config.database.username.as_deref(), Some("grabber"));
        assert_eq!(config.crawler.page_count, 5);
        assert_eq!(config.selectors.row, ".vacancy-card__inner");
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/nonexistent/grabber.toml");
        assert_eq!(config.server.port, 9000);
    }
}
