//! Google Scholar scraping.
//!
//! The last-resort citation source. A quoted-title search finds the paper;
//! its "Cited by" page supplies citing papers and its "Related articles"
//! page supplies reference candidates. Requests are spaced 2-5 s apart and
//! carry the stored session cookies. A CAPTCHA page fails the call with
//! [`PaperError::Captcha`].

use crate::aggregator::CitationSource;
use crate::config::ScraperConfig;
use crate::cookies::CookieJar;
use crate::error::{PaperError, Result};
use crate::http::HttpClient;
use crate::matching::best_title_match;
use crate::pacing::RequestPacer;
use crate::paper::{clean_text, Paper, META_SOURCE};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Page phrases that mean we hit the bot wall instead of results
const BLOCK_MARKERS: &[&str] = &[
    "solving the above captcha",
    "unusual traffic",
    "automated queries",
    "verify you are human",
    "gs_captcha",
];

/// A single search result from Google Scholar
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScholarResult {
    pub title: String,
    pub authors: Vec<String>,
    /// Raw "authors - venue, year - host" line
    pub byline: String,
    pub year: Option<i32>,
    pub venue: String,
    pub article_url: Option<String>,
    pub citations: Option<u64>,
    pub snippet: String,
    /// Absolute "Cited by" page URL
    pub cite_url: Option<String>,
    /// Absolute "Related articles" page URL
    pub related_url: Option<String>,
}

pub struct GoogleScholarClient {
    http: HttpClient,
    base_url: String,
}

impl GoogleScholarClient {
    pub fn new(config: &ScraperConfig, cookies: &CookieJar) -> Result<Self> {
        let mut headers = browser_headers();
        match cookies.header() {
            Some(header) => {
                info!(cookies = cookies.len(), "Replaying Google Scholar cookies");
                let value = HeaderValue::from_str(&header)
                    .map_err(|e| PaperError::Config(format!("Unusable cookie value: {}", e)))?;
                headers.insert(COOKIE, value);
            }
            None => warn!(
                "No usable cookies. Run 'paperhelper cookies import <file>' to add browser cookies."
            ),
        }

        let pacer = RequestPacer::randomized(Duration::from_secs(2), Duration::from_secs(5));
        Ok(Self::with_client(
            HttpClient::new(config, pacer, headers)?,
            &config.scholar_base_url,
        ))
    }

    pub fn with_client(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_results(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<ScholarResult>> {
        let html = self.http.get_text(url, query).await?;
        if is_blocked(&html) {
            warn!(url = url, "CAPTCHA detected");
            return Err(PaperError::Captcha);
        }
        parse_result_items(&html, &self.base_url)
    }

    async fn linked_results(&self, link: Option<&str>, limit: usize) -> Result<Vec<ScholarResult>> {
        let Some(link) = link else {
            return Ok(Vec::new());
        };
        let mut results = self.fetch_results(link, &[]).await?;
        results.truncate(limit);
        Ok(results)
    }
}

#[async_trait]
impl CitationSource for GoogleScholarClient {
    type Record = ScholarResult;

    fn name(&self) -> &'static str {
        "google_scholar"
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<ScholarResult>> {
        let url = format!("{}/scholar", self.base_url);
        let quoted = format!("\"{}\"", title.trim());
        let results = self
            .fetch_results(&url, &[("q", quoted.as_str()), ("hl", "en"), ("as_sdt", "0,5")])
            .await?;

        info!(title = title, count = results.len(), "Scholar search");
        Ok(best_title_match(title, results, |r| r.title.as_str()))
    }

    async fn citations_of(&self, record: &ScholarResult, limit: usize) -> Result<Vec<ScholarResult>> {
        self.linked_results(record.cite_url.as_deref(), limit).await
    }

    async fn references_of(&self, record: &ScholarResult, limit: usize) -> Result<Vec<ScholarResult>> {
        self.linked_results(record.related_url.as_deref(), limit).await
    }

    fn normalize(&self, record: &ScholarResult) -> Option<Paper> {
        to_paper(record)
    }
}

/// Convert a scraped result into a paper
pub fn to_paper(result: &ScholarResult) -> Option<Paper> {
    let mut paper = Paper::titled(&result.title)?.with_authors(&result.authors);
    paper.year = result.year;
    paper.venue = Some(result.venue.clone()).filter(|v| !v.is_empty());
    paper.url = result.article_url.clone();
    paper.citation_count = result.citations;
    paper.abstract_text = Some(result.snippet.clone()).filter(|s| !s.is_empty());

    paper.set_meta(META_SOURCE, "google_scholar");
    paper.set_meta("authors_venue_text", result.byline.as_str());
    Some(paper)
}

fn browser_headers() -> HeaderMap {
    let pairs = [
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        ("accept-language", "en-US,en;q=0.9"),
        ("cache-control", "no-cache"),
        ("pragma", "no-cache"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("upgrade-insecure-requests", "1"),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

fn is_blocked(html: &str) -> bool {
    let lower = html.to_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PaperError::Parse(e.to_string()))
}

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PaperError::Parse(e.to_string()))
}

fn text_of(elem: ElementRef<'_>) -> String {
    clean_text(&elem.text().collect::<String>())
}

/// Parse a Scholar results page. Relative links are resolved against `base_url`.
pub fn parse_result_items(html: &str, base_url: &str) -> Result<Vec<ScholarResult>> {
    let document = Html::parse_document(html);

    let item_selector = selector("div.gs_r.gs_or.gs_scl")?;
    let title_selector = selector("h3.gs_rt")?;
    let link_selector = selector("h3.gs_rt a")?;
    let meta_selector = selector("div.gs_a")?;
    let snippet_selector = selector("div.gs_rs")?;
    let footer_selector = selector("div.gs_fl a")?;

    let year_regex = regex(r"\b(19|20)\d{2}\b")?;
    let cite_regex = regex(r"Cited by\s*(\d+)")?;
    let tag_regex = regex(r"^(\[[A-Z]+\]\s*)+")?;
    let base = Url::parse(&format!("{}/", base_url))
        .map_err(|e| PaperError::Config(format!("Invalid base URL: {}", e)))?;
    let absolute = |href: &str| base.join(href).ok().map(|u| u.to_string());

    let mut results = Vec::new();

    for item in document.select(&item_selector) {
        let mut data = ScholarResult::default();

        if let Some(link) = item.select(&link_selector).next() {
            data.title = text_of(link);
            data.article_url = link.value().attr("href").and_then(absolute);
        } else if let Some(title_elem) = item.select(&title_selector).next() {
            data.title = tag_regex.replace(&text_of(title_elem), "").trim().to_string();
        }

        if let Some(meta_elem) = item.select(&meta_selector).next() {
            data.byline = text_of(meta_elem);
            let parts: Vec<&str> = data.byline.split(" - ").collect();

            data.authors = parse_authors(parts.first().copied().unwrap_or_default());
            if let Some(venue_year) = parts.get(1) {
                match year_regex.find(venue_year) {
                    Some(m) => {
                        data.year = m.as_str().parse().ok();
                        data.venue = venue_year[..m.start()].trim().trim_end_matches(',').to_string();
                    }
                    None => data.venue = venue_year.trim().to_string(),
                }
            }
        }

        if let Some(snippet_elem) = item.select(&snippet_selector).next() {
            data.snippet = text_of(snippet_elem);
        }

        for link in item.select(&footer_selector) {
            let href = link.value().attr("href").unwrap_or_default();
            if href.contains("cites=") {
                data.cite_url = absolute(href);
                data.citations = cite_regex
                    .captures(&text_of(link))
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse().ok());
            } else if href.contains("q=related:") {
                data.related_url = absolute(href);
            }
        }

        if !data.title.is_empty() {
            results.push(data);
        }
    }

    Ok(results)
}

/// Split a byline author list; truncated lists end in an ellipsis
fn parse_authors(text: &str) -> Vec<String> {
    text.split(',')
        .map(|name| name.trim().trim_end_matches('…').trim().to_string())
        .filter(|name| name.chars().count() > 1)
        .collect()
}
