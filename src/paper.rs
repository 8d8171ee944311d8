//! Normalized paper records and one-hop citation networks.
//!
//! Every source adapter converts its own payload into [`Paper`]. A paper's
//! identity for deduplication is its DOI, else its URL, else its normalized
//! title.

use crate::error::{PaperError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata key naming the source that produced a record
pub const META_SOURCE: &str = "source";

/// A paper author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
    /// Semantic Scholar `authorId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_scholar_id: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: None,
            email: None,
            orcid: None,
            semantic_scholar_id: None,
        }
    }
}

/// Normalized paper record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub venue: Option<String>,
    /// conference, journal, workshop
    #[serde(default)]
    pub venue_type: Option<String>,
    /// oral, spotlight, poster, main...
    #[serde(default)]
    pub track_type: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub citation_count: Option<u64>,
    #[serde(default)]
    pub pages: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    /// DOIs/URLs of papers this one cites
    #[serde(default)]
    pub references: Vec<String>,
    /// DOIs/URLs of papers citing this one
    #[serde(default)]
    pub cited_by: Vec<String>,
    /// Free-form provenance and source-specific fields
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default = "Local::now")]
    pub scraped_at: DateTime<Local>,
}

impl Paper {
    /// Create a paper from a raw title.
    ///
    /// The title is whitespace-normalized; an empty result is rejected.
    pub fn new(title: &str) -> Result<Self> {
        let title = clean_text(title);
        if title.is_empty() {
            return Err(PaperError::Validation("paper title is empty".to_string()));
        }

        Ok(Self {
            title,
            authors: Vec::new(),
            abstract_text: None,
            keywords: Vec::new(),
            year: None,
            venue: None,
            venue_type: None,
            track_type: None,
            doi: None,
            url: None,
            pdf_url: None,
            citation_count: None,
            pages: None,
            volume: None,
            issue: None,
            publisher: None,
            references: Vec::new(),
            cited_by: Vec::new(),
            metadata: BTreeMap::new(),
            scraped_at: Local::now(),
        })
    }

    /// Like [`Paper::new`] but for parsers that skip untitled entries.
    pub fn titled(title: &str) -> Option<Self> {
        Self::new(title).ok()
    }

    pub fn with_authors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.authors = names
            .into_iter()
            .map(|n| clean_text(n.as_ref()))
            .filter(|n| !n.is_empty())
            .map(Author::new)
            .collect();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_citation_count(mut self, count: u64) -> Self {
        self.citation_count = Some(count);
        self
    }

    /// Set a string metadata entry
    pub fn set_meta(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(key.to_string(), Value::String(value.into()));
    }

    /// Read a string metadata entry
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Deduplication identity: DOI, else URL, else normalized title.
    pub fn identity(&self) -> String {
        if let Some(doi) = self.doi.as_deref().filter(|d| !d.is_empty()) {
            return doi.to_lowercase();
        }
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }
        normalize_title(&self.title)
    }

    pub fn author_names(&self) -> impl Iterator<Item = &str> {
        self.authors.iter().map(|a| a.name.as_str())
    }

    /// BibTeX entry for this paper.
    pub fn to_bibtex(&self) -> String {
        let entry_type = if self.venue_type.as_deref() == Some("conference") {
            "inproceedings"
        } else {
            "article"
        };

        let mut out = format!("@{}{{{},\n", entry_type, self.bibtex_key());
        out.push_str(&format!("  title={{{}}},\n", self.title));

        if !self.authors.is_empty() {
            let names: Vec<&str> = self.author_names().collect();
            out.push_str(&format!("  author={{{}}},\n", names.join(" and ")));
        }
        if let Some(venue) = &self.venue {
            let field = if entry_type == "inproceedings" { "booktitle" } else { "journal" };
            out.push_str(&format!("  {}={{{}}},\n", field, venue));
        }
        if let Some(year) = self.year {
            out.push_str(&format!("  year={{{}}},\n", year));
        }
        if let Some(pages) = &self.pages {
            out.push_str(&format!("  pages={{{}}},\n", pages));
        }
        if let Some(doi) = &self.doi {
            out.push_str(&format!("  doi={{{}}},\n", doi));
        }
        if let Some(url) = &self.url {
            out.push_str(&format!("  url={{{}}},\n", url));
        }
        out.push('}');
        out
    }

    /// `lastname + year + firstword`, lowercased
    fn bibtex_key(&self) -> String {
        let mut key = self
            .authors
            .first()
            .and_then(|a| a.name.split_whitespace().last())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "unknown".to_string());

        if let Some(year) = self.year {
            key.push_str(&year.to_string());
        }
        if let Some(word) = self.title.split_whitespace().next() {
            key.extend(word.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase));
        }
        key
    }
}

/// One-hop citation graph around a central paper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationNetwork {
    pub central_paper: Paper,
    /// Papers cited by the central paper
    pub references: Vec<Paper>,
    /// Papers citing the central paper
    pub citations: Vec<Paper>,
    pub depth: u32,
}

impl CitationNetwork {
    /// Build a depth-1 network. Entries sharing the central paper's identity
    /// are dropped from both lists.
    pub fn new(central_paper: Paper, references: Vec<Paper>, citations: Vec<Paper>) -> Self {
        let central_id = central_paper.identity();
        let references = references
            .into_iter()
            .filter(|p| p.identity() != central_id)
            .collect();
        let citations = citations
            .into_iter()
            .filter(|p| p.identity() != central_id)
            .collect();

        Self {
            central_paper,
            references,
            citations,
            depth: 1,
        }
    }

    pub fn total_papers(&self) -> usize {
        1 + self.references.len() + self.citations.len()
    }

    /// Adjacency list keyed by paper identity: central -> references,
    /// each citing paper -> central.
    pub fn citation_graph(&self) -> BTreeMap<String, Vec<String>> {
        let central_id = self.central_paper.identity();
        let mut graph = BTreeMap::new();
        graph.insert(
            central_id.clone(),
            self.references.iter().map(Paper::identity).collect::<Vec<_>>(),
        );

        for citation in &self.citations {
            graph
                .entry(citation.identity())
                .or_insert_with(Vec::new)
                .push(central_id.clone());
        }
        graph
    }
}

/// Collapse runs of whitespace and trim
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased, whitespace-normalized title used as a fallback identity
pub fn normalize_title(title: &str) -> String {
    clean_text(title).to_lowercase()
}
