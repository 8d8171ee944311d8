//! Semantic Scholar Graph API client
//!
//! The primary citation source. Endpoints used:
//! - `GET /paper/search?query=` (10 hits, best title match)
//! - `GET /paper/{id}/citations`
//! - `GET /paper/{id}/references`
//!
//! Rate limit: 1 req/s unauthenticated, higher with an `x-api-key`.

use crate::aggregator::CitationSource;
use crate::config::ScraperConfig;
use crate::error::{PaperError, Result};
use crate::http::HttpClient;
use crate::matching::best_title_match;
use crate::pacing::RequestPacer;
use crate::paper::{Author, Paper, META_SOURCE};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Search hits considered when matching a title
const SEARCH_LIMIT: usize = 10;

/// Largest page the citations/references endpoints accept
const MAX_PAGE: usize = 1000;

const SEARCH_FIELDS: &str = "paperId,title,authors,year,venue,citationCount,referenceCount,externalIds,url";
const LINK_FIELDS: &str = "paperId,title,authors,year,venue,citationCount,externalIds,url,abstract";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsPaper {
    pub paper_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<SsAuthor>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub citation_count: Option<u64>,
    pub reference_count: Option<u64>,
    pub external_ids: Option<SsExternalIds>,
    pub url: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsAuthor {
    pub author_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SsExternalIds {
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SsPaper>,
}

#[derive(Debug, Deserialize)]
struct LinkResponse {
    #[serde(default)]
    data: Vec<LinkEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkEntry {
    citing_paper: Option<SsPaper>,
    cited_paper: Option<SsPaper>,
}

pub struct SemanticScholarClient {
    http: HttpClient,
    base_url: String,
}

impl SemanticScholarClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.semantic_scholar_api_key.as_deref() {
            let value = HeaderValue::from_str(key)
                .map_err(|e| PaperError::Config(format!("Invalid API key: {}", e)))?;
            headers.insert("x-api-key", value);
        }
        let pacer = RequestPacer::new(config.request_delay());

        Ok(Self::with_client(
            HttpClient::new(config, pacer, headers)?,
            &config.semantic_scholar_base_url,
        ))
    }

    pub fn with_client(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn linked_papers(&self, paper_id: &str, endpoint: &str, limit: usize) -> Result<Vec<SsPaper>> {
        let url = format!("{}/paper/{}/{}", self.base_url, paper_id, endpoint);
        let limit = limit.min(MAX_PAGE).to_string();

        let response: LinkResponse = self
            .http
            .get_json(&url, &[("limit", limit.as_str()), ("fields", LINK_FIELDS)])
            .await?;

        let papers: Vec<SsPaper> = response
            .data
            .into_iter()
            .filter_map(|entry| entry.citing_paper.or(entry.cited_paper))
            .collect();
        debug!(paper_id = paper_id, endpoint = endpoint, count = papers.len(), "Linked papers");
        Ok(papers)
    }
}

#[async_trait]
impl CitationSource for SemanticScholarClient {
    type Record = SsPaper;

    fn name(&self) -> &'static str {
        "semantic_scholar"
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<SsPaper>> {
        let url = format!("{}/paper/search", self.base_url);
        let limit = SEARCH_LIMIT.to_string();

        let response: SearchResponse = self
            .http
            .get_json(
                &url,
                &[("query", title), ("limit", limit.as_str()), ("fields", SEARCH_FIELDS)],
            )
            .await?;

        Ok(best_title_match(title, response.data, |p| {
            p.title.as_deref().unwrap_or_default()
        }))
    }

    async fn citations_of(&self, record: &SsPaper, limit: usize) -> Result<Vec<SsPaper>> {
        match record.paper_id.as_deref() {
            Some(id) => self.linked_papers(id, "citations", limit).await,
            None => Ok(Vec::new()),
        }
    }

    async fn references_of(&self, record: &SsPaper, limit: usize) -> Result<Vec<SsPaper>> {
        match record.paper_id.as_deref() {
            Some(id) => self.linked_papers(id, "references", limit).await,
            None => Ok(Vec::new()),
        }
    }

    fn normalize(&self, record: &SsPaper) -> Option<Paper> {
        to_paper(record)
    }
}

/// Convert a Graph API paper; untitled entries are dropped
pub fn to_paper(record: &SsPaper) -> Option<Paper> {
    let mut paper = Paper::titled(record.title.as_deref()?)?;

    paper.authors = record
        .authors
        .iter()
        .filter_map(|a| {
            let name = a.name.as_deref().filter(|n| !n.is_empty())?;
            let mut author = Author::new(name);
            author.semantic_scholar_id = a.author_id.clone();
            Some(author)
        })
        .collect();
    paper.year = record.year;
    paper.venue = record.venue.clone().filter(|v| !v.is_empty());
    paper.citation_count = record.citation_count;
    paper.doi = record.external_ids.as_ref().and_then(|ids| ids.doi.clone());
    paper.url = record.url.clone();
    paper.abstract_text = record.abstract_text.clone();

    paper.set_meta(META_SOURCE, "semantic_scholar");
    if let Some(id) = &record.paper_id {
        paper.set_meta("semantic_scholar_id", id.as_str());
    }
    if let Some(count) = record.reference_count {
        paper.metadata.insert("reference_count".to_string(), Value::from(count));
    }
    Some(paper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SemanticScholarClient {
        let http = HttpClient::from_parts(
            reqwest::Client::new(),
            RequestPacer::unpaced(),
            1,
            Duration::from_millis(10),
        );
        SemanticScholarClient::with_client(http, &server.uri())
    }

    #[tokio::test]
    async fn test_search_picks_matching_title() -> Result<()> {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "total": 2,
            "data": [
                {"paperId": "zzz", "title": "A Survey of Something Else"},
                {"paperId": "abc", "title": "Attention Is All You Need", "year": 2017,
                 "venue": "NeurIPS", "citationCount": 90000, "referenceCount": 40,
                 "externalIds": {"DOI": "10.5555/3295222"},
                 "authors": [{"authorId": "1", "name": "Ashish Vaswani"}]}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/paper/search"))
            .and(query_param("query", "Attention is all you need"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let source = client(&server);
        let record = source
            .search_by_title("Attention is all you need")
            .await?
            .expect("a hit");
        assert_eq!(record.paper_id.as_deref(), Some("abc"));

        let paper = source.normalize(&record).expect("titled");
        assert_eq!(paper.year, Some(2017));
        assert_eq!(paper.doi.as_deref(), Some("10.5555/3295222"));
        assert_eq!(paper.citation_count, Some(90000));
        assert_eq!(paper.meta_str("semantic_scholar_id"), Some("abc"));
        assert_eq!(paper.metadata["reference_count"], Value::from(40u64));
        assert_eq!(paper.authors[0].semantic_scholar_id.as_deref(), Some("1"));
        assert!(paper.authors[0].orcid.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_citations_and_references() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paper/abc/citations"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"citingPaper": {"paperId": "c1", "title": "Citer One", "year": 2021}},
                    {"citingPaper": {"paperId": null, "title": null}}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/paper/abc/references"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"citedPaper": {"paperId": "r1", "title": "Ref One", "year": 2015}}]
            })))
            .mount(&server)
            .await;

        let source = client(&server);
        let central = SsPaper {
            paper_id: Some("abc".to_string()),
            ..SsPaper::default()
        };

        let citations = source.citations_of(&central, 5).await?;
        let papers: Vec<Paper> = citations.iter().filter_map(|c| source.normalize(c)).collect();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "Citer One");

        let references = source.references_of(&central, 5).await?;
        assert_eq!(references[0].title.as_deref(), Some("Ref One"));

        let orphan = SsPaper::default();
        assert!(source.citations_of(&orphan, 5).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_api_key_header() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paper/search"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let config = ScraperConfig {
            semantic_scholar_base_url: server.uri(),
            semantic_scholar_api_key: Some("secret".to_string()),
            request_delay: 0.0,
            ..ScraperConfig::default()
        };
        let source = SemanticScholarClient::new(&config)?;
        assert!(source.search_by_title("anything").await?.is_none());
        Ok(())
    }
}
