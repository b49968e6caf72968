// src/services/posts.rs

//! Vacancy crawler service.
//!
//! Walks a fixed number of listing pages, extracts one summary per vacancy
//! card and follows each card's link to fetch the full description.
//! Everything runs sequentially: listing page, then its detail pages, then
//! the next listing page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, Post, SelectorConfig};
use crate::services::datetime::DateTimeParser;
use crate::utils::http::PageFetcher;
use crate::utils::{normalize_whitespace, resolve_url};

/// Produces the posts found under a listing URL prefix.
#[async_trait]
pub trait Parse: Send + Sync {
    async fn list(&self, base_url: &str) -> Result<Vec<Post>>;
}

/// Summary of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub posts: Vec<Post>,
    pub page_total: usize,
    pub page_failures: usize,
    pub row_total: usize,
    pub row_failures: usize,
}

/// Fields read from one vacancy card on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowSummary {
    title: String,
    link: String,
    date: String,
}

/// Compiled selectors.
struct Selectors {
    row: Selector,
    title: Selector,
    date: Selector,
    description: Selector,
}

impl Selectors {
    fn compile(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            row: parse_selector(&config.row)?,
            title: parse_selector(&config.title)?,
            date: parse_selector(&config.date)?,
            description: parse_selector(&config.description)?,
        })
    }
}

/// Crawler for career.habr.com vacancy listings.
pub struct HabrCareerParse {
    config: CrawlerConfig,
    site_root: Url,
    selectors: Selectors,
    fetcher: Arc<dyn PageFetcher>,
    date_parser: Arc<dyn DateTimeParser>,
}

impl HabrCareerParse {
    /// Create a crawler; fails if the site root or a selector is invalid.
    pub fn new(
        config: CrawlerConfig,
        selectors: &SelectorConfig,
        fetcher: Arc<dyn PageFetcher>,
        date_parser: Arc<dyn DateTimeParser>,
    ) -> Result<Self> {
        let site_root = Url::parse(&config.site_root)?;
        Ok(Self {
            config,
            site_root,
            selectors: Selectors::compile(selectors)?,
            fetcher,
            date_parser,
        })
    }

    /// Crawl every listing page and report what succeeded.
    ///
    /// A page that cannot be fetched is skipped whole; a card whose fields
    /// or detail page cannot be read is skipped alone.
    pub async fn crawl(&self, base_url: &str) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();

        for page in 1..=self.config.page_count {
            let url = self.config.page_url(base_url, page);
            outcome.page_total += 1;

            let rows = match self.fetch_listing(&url).await {
                Ok(rows) => rows,
                Err(error) => {
                    outcome.page_failures += 1;
                    log::warn!("Failed to fetch listing page {}: {}", url, error);
                    continue;
                }
            };
            log::debug!("Listing page {} has {} rows", url, rows.len());

            for row in rows {
                outcome.row_total += 1;
                let result = match row {
                    Ok(summary) => self.build_post(summary).await,
                    Err(error) => Err(error),
                };
                match result {
                    Ok(post) => outcome.posts.push(post),
                    Err(error) => {
                        outcome.row_failures += 1;
                        log::warn!("Skipping vacancy on {}: {}", url, error);
                    }
                }
            }
        }

        outcome
    }

    async fn fetch_listing(&self, url: &str) -> Result<Vec<Result<RowSummary>>> {
        let html = self.fetcher.fetch(url).await?;
        self.pause().await;
        Ok(self.parse_listing(&html))
    }

    fn parse_listing(&self, html: &str) -> Vec<Result<RowSummary>> {
        let document = Html::parse_document(html);
        document
            .select(&self.selectors.row)
            .map(|row| self.parse_row(row))
            .collect()
    }

    fn parse_row(&self, row: ElementRef<'_>) -> Result<RowSummary> {
        let title_elem = row
            .select(&self.selectors.title)
            .next()
            .ok_or_else(|| AppError::parse("listing row", "title element not found"))?;
        let anchor = first_child_element(title_elem)
            .ok_or_else(|| AppError::parse("listing row", "title has no link element"))?;
        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| AppError::parse("listing row", "link has no href"))?;

        let date = row
            .select(&self.selectors.date)
            .next()
            .and_then(first_child_element)
            .and_then(|e| e.value().attr("datetime"))
            .ok_or_else(|| AppError::parse("listing row", "datetime attribute not found"))?;

        Ok(RowSummary {
            title: element_text(title_elem),
            link: resolve_url(&self.site_root, href),
            date: date.to_string(),
        })
    }

    async fn build_post(&self, summary: RowSummary) -> Result<Post> {
        let created = self.date_parser.parse(&summary.date)?;
        let description = self.fetch_description(&summary.link).await?;
        Ok(Post::new(summary.title, summary.link, description, created))
    }

    /// Fetch the detail page and return the description text.
    async fn fetch_description(&self, link: &str) -> Result<String> {
        let html = self.fetcher.fetch(link).await?;
        self.pause().await;
        self.parse_description(&html)
            .ok_or_else(|| AppError::parse(link, "vacancy description not found"))
    }

    fn parse_description(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.selectors.description)
            .next()
            .map(element_text)
    }

    async fn pause(&self) {
        if self.config.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }
    }
}

#[async_trait]
impl Parse for HabrCareerParse {
    /// Returns every post that could be read. Fails only when no listing
    /// page at all could be fetched.
    async fn list(&self, base_url: &str) -> Result<Vec<Post>> {
        let outcome = self.crawl(base_url).await;
        log::info!(
            "Crawled {} posts from {} pages ({} page failures, {} of {} rows skipped)",
            outcome.posts.len(),
            outcome.page_total,
            outcome.page_failures,
            outcome.row_failures,
            outcome.row_total
        );
        if outcome.page_total > 0 && outcome.page_failures == outcome.page_total {
            return Err(AppError::fetch(
                base_url,
                format!("all {} listing pages failed", outcome.page_total),
            ));
        }
        Ok(outcome.posts)
    }
}

fn first_child_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.children().find_map(ElementRef::wrap)
}

/// Elements whose boundaries separate words in rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section",
    "table", "td", "th", "tr", "ul",
];

/// Text content with whitespace normalized.
///
/// Inline markup adds nothing between its text nodes, so `Java<b>Script</b>`
/// reads `JavaScript`. Block elements start a new word.
fn element_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(chunk) => text.push_str(chunk),
            Node::Element(e) if BLOCK_TAGS.contains(&e.name()) => text.push(' '),
            _ => {}
        }
    }
    normalize_whitespace(&text)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
