//! Crossref API client.
//!
//! Secondary citation source. Crossref does not expose citing papers, so it
//! only contributes details for the central paper: DOI, venue, authors,
//! date, abstract and citation count.

use crate::aggregator::CitationSource;
use crate::config::ScraperConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::matching::best_title_match;
use crate::pacing::RequestPacer;
use crate::paper::{clean_text, Author, Paper, META_SOURCE};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Rows requested per title search
const SEARCH_ROWS: &str = "10";

const SELECT: &str = "DOI,title,author,published-print,published-online,container-title,is-referenced-by-count,references-count,abstract,URL,type,page,volume,issue,publisher";

/// Crossref client with polite-pool identification
pub struct CrossrefClient {
    http: HttpClient,
    base_url: String,
    mailto: String,
}

impl CrossrefClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut config = config.clone();
        config.user_agent = format!("paperhelper/0.1 (mailto:{})", config.crossref_mailto);
        let pacer = RequestPacer::new(config.request_delay());

        Ok(Self::with_client(
            HttpClient::new(&config, pacer, HeaderMap::new())?,
            &config.crossref_base_url,
            &config.crossref_mailto,
        ))
    }

    pub fn with_client(http: HttpClient, base_url: &str, mailto: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            mailto: mailto.to_string(),
        }
    }
}

#[async_trait]
impl CitationSource for CrossrefClient {
    type Record = CrossrefItem;

    fn name(&self) -> &'static str {
        "crossref"
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<CrossrefItem>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/works", self.base_url);
        let data: CrossrefResponse = self
            .http
            .get_json(
                &url,
                &[
                    ("query.title", title),
                    ("rows", SEARCH_ROWS),
                    ("select", SELECT),
                    ("mailto", self.mailto.as_str()),
                ],
            )
            .await?;

        debug!(title = title, hits = data.message.items.len(), "Crossref search");
        Ok(best_title_match(title, data.message.items, |item| {
            item.title.first().map(String::as_str).unwrap_or_default()
        }))
    }

    async fn citations_of(&self, _record: &CrossrefItem, _limit: usize) -> Result<Vec<CrossrefItem>> {
        Ok(Vec::new())
    }

    async fn references_of(&self, _record: &CrossrefItem, _limit: usize) -> Result<Vec<CrossrefItem>> {
        Ok(Vec::new())
    }

    fn normalize(&self, record: &CrossrefItem) -> Option<Paper> {
        to_paper(record)
    }
}

// === Crossref API Response Types ===

#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    message: CrossrefMessage,
}

#[derive(Debug, Deserialize)]
struct CrossrefMessage {
    #[serde(default)]
    items: Vec<CrossrefItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrossrefItem {
    #[serde(rename = "DOI", default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub author: Vec<CrossrefAuthor>,
    #[serde(default)]
    pub container_title: Vec<String>,
    pub published_print: Option<CrossrefDate>,
    pub published_online: Option<CrossrefDate>,
    pub is_referenced_by_count: Option<u64>,
    pub references_count: Option<u64>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub publisher: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrossrefAuthor {
    #[serde(default)]
    pub given: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub affiliation: Vec<CrossrefAffiliation>,
    /// `https://orcid.org/0000-...` URL
    #[serde(rename = "ORCID", default)]
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrossrefAffiliation {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrossrefDate {
    #[serde(rename = "date-parts", default)]
    pub date_parts: Vec<Vec<Option<i32>>>,
}

impl CrossrefDate {
    fn year(&self) -> Option<i32> {
        self.date_parts.first()?.first().copied().flatten()
    }
}

/// Convert a Crossref work into a paper
pub fn to_paper(item: &CrossrefItem) -> Option<Paper> {
    let mut paper = Paper::titled(item.title.first()?)?;

    paper.authors = item
        .author
        .iter()
        .filter_map(|a| {
            let name = format!("{} {}", a.given, a.family).trim().to_string();
            if name.is_empty() {
                return None;
            }
            let mut author = Author::new(name);
            author.affiliation = a.affiliation.first().and_then(|af| af.name.clone());
            author.orcid = a
                .orcid
                .as_deref()
                .and_then(|url| url.trim_end_matches('/').rsplit('/').next())
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            Some(author)
        })
        .collect();

    paper.year = item
        .published_print
        .as_ref()
        .or(item.published_online.as_ref())
        .and_then(CrossrefDate::year);
    paper.venue = item.container_title.first().cloned();
    paper.venue_type = match item.kind.as_deref() {
        Some("proceedings-article") => Some("conference".to_string()),
        Some("journal-article") => Some("journal".to_string()),
        _ => None,
    };
    paper.doi = item.doi.clone();
    paper.url = item.url.clone();
    paper.citation_count = item.is_referenced_by_count;
    paper.abstract_text = item.abstract_text.as_deref().map(strip_html_tags);
    paper.pages = item.page.clone();
    paper.volume = item.volume.clone();
    paper.issue = item.issue.clone();
    paper.publisher = item.publisher.clone();

    paper.set_meta(META_SOURCE, "crossref");
    if let Some(kind) = &item.kind {
        paper.set_meta("crossref_type", kind.as_str());
    }
    if let Some(count) = item.references_count {
        paper.metadata.insert("reference_count".to_string(), Value::from(count));
    }
    Some(paper)
}

/// Strip JATS/HTML tags from an abstract
fn strip_html_tags(text: &str) -> String {
    match Regex::new(r"<[^>]+>") {
        Ok(re) => clean_text(&re.replace_all(text, " ")),
        Err(_) => clean_text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<jats:p>Hello</jats:p>"), "Hello");
        assert_eq!(strip_html_tags("No tags"), "No tags");
        assert_eq!(
            strip_html_tags("<b>Bold</b> and <i>italic</i>"),
            "Bold and italic"
        );
    }

    #[test]
    fn test_to_paper() {
        let item: CrossrefItem = serde_json::from_value(serde_json::json!({
            "DOI": "10.1234/test",
            "title": ["Test Title"],
            "author": [
                {"given": "John", "family": "Doe", "affiliation": [{"name": "MIT"}],
                 "ORCID": "http://orcid.org/0000-0002-1825-0097"},
                {"given": "Jane", "family": "Roe"}
            ],
            "container-title": ["ICSE"],
            "published-print": {"date-parts": [[2023, 6, 15]]},
            "abstract": "<jats:p>This is abstract</jats:p>",
            "is-referenced-by-count": 12,
            "type": "proceedings-article"
        }))
        .expect("valid item");

        let paper = to_paper(&item).expect("titled");
        assert_eq!(paper.doi.as_deref(), Some("10.1234/test"));
        assert_eq!(paper.author_names().collect::<Vec<_>>(), vec!["John Doe", "Jane Roe"]);
        assert_eq!(paper.authors[0].affiliation.as_deref(), Some("MIT"));
        assert_eq!(paper.authors[0].orcid.as_deref(), Some("0000-0002-1825-0097"));
        assert!(paper.authors[1].orcid.is_none());
        assert_eq!(paper.year, Some(2023));
        assert_eq!(paper.venue_type.as_deref(), Some("conference"));
        assert_eq!(paper.abstract_text.as_deref(), Some("This is abstract"));
        assert_eq!(paper.citation_count, Some(12));
    }

    #[tokio::test]
    async fn test_search_by_title() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/works"))
            .and(query_param("rows", "10"))
            .and(query_param("mailto", "me@example.org"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"items": [
                    {"DOI": "10.1/other", "title": ["Something Different"]},
                    {"DOI": "10.1/match", "title": ["Program Repair with Deep Learning"]}
                ]}
            })))
            .mount(&server)
            .await;

        let http = HttpClient::from_parts(
            reqwest::Client::new(),
            RequestPacer::unpaced(),
            1,
            Duration::from_millis(10),
        );
        let source = CrossrefClient::with_client(http, &server.uri(), "me@example.org");

        let item = source
            .search_by_title("Program repair with deep learning")
            .await?
            .expect("a hit");
        assert_eq!(item.doi.as_deref(), Some("10.1/match"));
        assert!(source.citations_of(&item, 10).await?.is_empty());
        Ok(())
    }
}
