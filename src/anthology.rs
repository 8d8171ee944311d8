//! ACL Anthology event page fetcher.
//!
//! Each conference year has one event page at `{base}/events/{short}-{year}/`
//! listing every volume. Only main-track papers (`long`, `short`, `main`)
//! are kept; workshops and demos are dropped.

use crate::config::ScraperConfig;
use crate::error::{PaperError, Result};
use crate::fetcher::PaperFetcher;
use crate::http::HttpClient;
use crate::pacing::RequestPacer;
use crate::paper::{clean_text, Paper, META_SOURCE};
use crate::resolver::VenueKey;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::HeaderMap;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

/// Volume tracks that make up the main conference
const MAIN_TRACKS: &[&str] = &["long", "short", "main"];

pub struct AnthologyFetcher {
    http: HttpClient,
    base_url: String,
    fetch_abstracts: bool,
}

impl AnthologyFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let pacer = RequestPacer::new(config.request_delay());
        Ok(Self::with_client(
            HttpClient::new(config, pacer, HeaderMap::new())?,
            &config.anthology_base_url,
        )
        .with_abstracts(config.anthology_abstracts))
    }

    pub fn with_client(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            fetch_abstracts: false,
        }
    }

    /// Also visit every paper's landing page for its abstract
    pub fn with_abstracts(mut self, enabled: bool) -> Self {
        self.fetch_abstracts = enabled;
        self
    }

    pub fn event_url(&self, short: &str, year: i32) -> String {
        format!("{}/events/{}-{}/", self.base_url, short, year)
    }

    /// Abstract from a paper's landing page, if it shows one
    pub async fn paper_abstract(&self, anthology_id: &str) -> Result<Option<String>> {
        let url = format!("{}/{}/", self.base_url, anthology_id);
        let html = self.http.get_text(&url, &[]).await?;
        parse_abstract(&html)
    }
}

#[async_trait]
impl PaperFetcher for AnthologyFetcher {
    async fn fetch(&self, venue: &VenueKey, year: i32) -> Result<Vec<Paper>> {
        let url = self.event_url(&venue.short, year);
        info!(venue_key = %venue.key, year = year, url = %url, "Fetching ACL Anthology event");

        let html = self.http.get_text(&url, &[]).await?;
        let mut papers = parse_event_page(&html, &self.base_url, year)?;
        debug!(venue_key = %venue.key, year = year, count = papers.len(), "Parsed event page");

        if self.fetch_abstracts {
            for paper in &mut papers {
                let Some(id) = paper.meta_str("acl_id").map(str::to_string) else {
                    continue;
                };
                match self.paper_abstract(&id).await {
                    Ok(text) => paper.abstract_text = text,
                    Err(e) => warn!(acl_id = %id, error = %e, "Abstract unavailable"),
                }
            }
        }
        Ok(papers)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PaperError::Parse(e.to_string()))
}

/// Parse an event page into main-track papers
pub fn parse_event_page(html: &str, base_url: &str, year: i32) -> Result<Vec<Paper>> {
    let document = Html::parse_document(html);
    let entry_selector = selector("p.d-sm-flex.align-items-stretch")?;
    let title_selector = selector("strong")?;
    let link_selector = selector("strong a")?;
    let author_selector = selector("a[href*='/people/']")?;
    let pages_regex =
        Regex::new(r"(?i)pages?\s*(\d+[-–]\d+)").map_err(|e| PaperError::Parse(e.to_string()))?;
    let base = Url::parse(&format!("{}/", base_url))
        .map_err(|e| PaperError::Config(format!("Invalid base URL: {}", e)))?;

    let mut papers = Vec::new();
    for entry in document.select(&entry_selector) {
        let Some(title_elem) = entry.select(&title_selector).next() else {
            continue;
        };

        let link = entry.select(&link_selector).next();
        let title = text_of(link.unwrap_or(title_elem));
        let paper_url = link
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string());

        let anthology_id = paper_url.as_deref().map(anthology_id);
        if let Some(id) = anthology_id.as_deref() {
            if !is_main_track(id) {
                continue;
            }
        }

        let Some(mut paper) = Paper::titled(&title) else {
            continue;
        };
        let authors: Vec<String> = entry.select(&author_selector).map(text_of).collect();
        paper = paper.with_authors(authors).with_year(year);
        paper.venue_type = Some("conference".to_string());
        paper.url = paper_url;
        paper.pages = pages_regex
            .captures(&text_of(entry))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        paper.set_meta(META_SOURCE, "acl_anthology");
        if let Some(id) = anthology_id.filter(|id| !id.is_empty()) {
            paper.pdf_url = Some(format!("{}/{}.pdf", base_url, id));
            paper.set_meta("acl_id", id);
        }
        papers.push(paper);
    }

    Ok(papers)
}

fn parse_abstract(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let abstract_selector = selector("div.card-body.acl-abstract span")?;
    Ok(document
        .select(&abstract_selector)
        .next()
        .map(text_of)
        .filter(|s| !s.is_empty()))
}

fn text_of(elem: ElementRef<'_>) -> String {
    clean_text(&elem.text().collect::<String>())
}

/// `https://aclanthology.org/2020.acl-main.1/` -> `2020.acl-main.1`
fn anthology_id(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_end_matches(".html")
        .to_string()
}

/// New-style ids (`2020.acl-main.1`) encode the volume; old ids (`P19-1001`)
/// carry no track and are kept.
fn is_main_track(id: &str) -> bool {
    if !(id.contains('.') && id.contains('-')) {
        return true;
    }
    match id.split('-').nth(1) {
        Some(rest) => {
            let track = rest.split('.').next().unwrap_or_default();
            MAIN_TRACKS.contains(&track)
        }
        None => true,
    }
}
