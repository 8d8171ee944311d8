//! Filtering, ranked search and summary statistics over paper lists.

use crate::analysis::{rank, Tally};
use crate::error::{PaperError, Result};
use crate::matching::jaccard_similarity;
use crate::paper::Paper;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// === Filters ===
//
// Each filter takes any iterator of paper references so they can be chained.

pub fn by_year<'a>(papers: impl IntoIterator<Item = &'a Paper>, year: i32) -> Vec<&'a Paper> {
    papers.into_iter().filter(|p| p.year == Some(year)).collect()
}

/// Inclusive year range; undated papers never match
pub fn by_year_range<'a>(
    papers: impl IntoIterator<Item = &'a Paper>,
    start: i32,
    end: i32,
) -> Vec<&'a Paper> {
    papers
        .into_iter()
        .filter(|p| p.year.is_some_and(|y| (start..=end).contains(&y)))
        .collect()
}

/// Case-insensitive substring match on the venue
pub fn by_venue<'a>(papers: impl IntoIterator<Item = &'a Paper>, venue: &str) -> Vec<&'a Paper> {
    let venue = venue.to_lowercase();
    papers
        .into_iter()
        .filter(|p| p.venue.as_deref().is_some_and(|v| v.to_lowercase().contains(&venue)))
        .collect()
}

/// Case-insensitive substring match on any author name
pub fn by_author<'a>(papers: impl IntoIterator<Item = &'a Paper>, name: &str) -> Vec<&'a Paper> {
    let name = name.to_lowercase();
    papers
        .into_iter()
        .filter(|p| p.author_names().any(|a| a.to_lowercase().contains(&name)))
        .collect()
}

/// Case-insensitive match in title, abstract or keywords
pub fn by_keyword<'a>(papers: impl IntoIterator<Item = &'a Paper>, keyword: &str) -> Vec<&'a Paper> {
    let keyword = keyword.to_lowercase();
    let hit = |text: &str| text.to_lowercase().contains(&keyword);
    papers
        .into_iter()
        .filter(|p| {
            hit(&p.title)
                || p.abstract_text.as_deref().is_some_and(hit)
                || p.keywords.iter().any(|k| hit(k))
        })
        .collect()
}

pub fn by_min_citations<'a>(papers: impl IntoIterator<Item = &'a Paper>, min: u64) -> Vec<&'a Paper> {
    papers
        .into_iter()
        .filter(|p| p.citation_count.is_some_and(|c| c >= min))
        .collect()
}

pub fn has_pdf<'a>(papers: impl IntoIterator<Item = &'a Paper>) -> Vec<&'a Paper> {
    papers.into_iter().filter(|p| p.pdf_url.is_some()).collect()
}

pub fn has_doi<'a>(papers: impl IntoIterator<Item = &'a Paper>) -> Vec<&'a Paper> {
    papers.into_iter().filter(|p| p.doi.is_some()).collect()
}

/// Case-insensitive regex over title and abstract
pub fn by_regex<'a>(papers: impl IntoIterator<Item = &'a Paper>, pattern: &str) -> Result<Vec<&'a Paper>> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| PaperError::Validation(format!("invalid pattern {:?}: {}", pattern, e)))?;

    Ok(papers
        .into_iter()
        .filter(|p| re.is_match(&p.title) || p.abstract_text.as_deref().is_some_and(|a| re.is_match(a)))
        .collect())
}

/// Every criterion that is set must hold. Deserializes from a query string
/// (`?year=2020&venue=icse&has_pdf=true`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, clap::Args)]
#[serde(default)]
pub struct PaperFilter {
    #[arg(long)]
    pub year: Option<i32>,
    /// Inclusive lower bound
    #[arg(long)]
    pub from_year: Option<i32>,
    /// Inclusive upper bound
    #[arg(long)]
    pub to_year: Option<i32>,
    #[arg(long)]
    pub venue: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    /// Matched in title, abstract and keywords
    #[arg(long)]
    pub keyword: Option<String>,
    #[arg(long)]
    pub min_citations: Option<u64>,
    #[arg(long)]
    pub has_pdf: bool,
    #[arg(long)]
    pub has_doi: bool,
    /// Case-insensitive, over title and abstract
    #[arg(long)]
    pub regex: Option<String>,
}

impl PaperFilter {
    pub fn apply<'a>(&self, papers: &'a [Paper]) -> Result<Vec<&'a Paper>> {
        let mut kept: Vec<&Paper> = papers.iter().collect();

        if let Some(year) = self.year {
            kept = by_year(kept, year);
        }
        if self.from_year.is_some() || self.to_year.is_some() {
            let start = self.from_year.unwrap_or(i32::MIN);
            let end = self.to_year.unwrap_or(i32::MAX);
            kept = by_year_range(kept, start, end);
        }
        if let Some(venue) = &self.venue {
            kept = by_venue(kept, venue);
        }
        if let Some(author) = &self.author {
            kept = by_author(kept, author);
        }
        if let Some(keyword) = &self.keyword {
            kept = by_keyword(kept, keyword);
        }
        if let Some(min) = self.min_citations {
            kept = by_min_citations(kept, min);
        }
        if self.has_pdf {
            kept = has_pdf(kept);
        }
        if self.has_doi {
            kept = has_doi(kept);
        }
        if let Some(pattern) = &self.regex {
            kept = by_regex(kept, pattern)?;
        }
        Ok(kept)
    }
}

// === Search ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Keywords,
    Abstract,
    Authors,
}

impl SearchField {
    pub const DEFAULT: [SearchField; 3] = [Self::Title, Self::Abstract, Self::Keywords];

    pub fn weight(self) -> f64 {
        match self {
            Self::Title => 3.0,
            Self::Keywords => 2.0,
            Self::Abstract => 1.0,
            Self::Authors => 0.5,
        }
    }

    fn text(self, paper: &Paper) -> String {
        match self {
            Self::Title => paper.title.to_lowercase(),
            Self::Keywords => paper.keywords.join(" ").to_lowercase(),
            Self::Abstract => paper.abstract_text.as_deref().unwrap_or_default().to_lowercase(),
            Self::Authors => paper.author_names().collect::<Vec<_>>().join(" ").to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    pub paper: &'a Paper,
    pub score: f64,
}

/// Weighted term-frequency search. Each query term counts its substring
/// occurrences per field, times the field weight. Papers scoring zero are
/// dropped; the rest are sorted by score, best first.
pub fn search<'a>(papers: &'a [Paper], query: &str, fields: &[SearchField]) -> Vec<SearchHit<'a>> {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = papers
        .iter()
        .map(|paper| {
            let score = fields
                .iter()
                .map(|field| {
                    let text = field.text(paper);
                    let count: usize = terms.iter().map(|t| text.matches(t.as_str()).count()).sum();
                    count as f64 * field.weight()
                })
                .sum();
            SearchHit { paper, score }
        })
        .filter(|hit| hit.score > 0.0)
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits
}

/// Papers whose abstracts share words with the reference abstract, by
/// Jaccard similarity at or above `threshold`, most similar first
pub fn search_similar<'a>(papers: &'a [Paper], reference: &Paper, threshold: f64) -> Vec<SearchHit<'a>> {
    let Some(wanted) = reference.abstract_text.as_deref() else {
        return Vec::new();
    };
    let reference_id = reference.identity();

    let mut hits: Vec<SearchHit> = papers
        .iter()
        .filter(|p| p.identity() != reference_id)
        .filter_map(|paper| {
            let score = jaccard_similarity(wanted, paper.abstract_text.as_deref()?);
            (score >= threshold).then_some(SearchHit { paper, score })
        })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits
}

// === Statistics ===

#[derive(Debug, Clone, Serialize)]
pub struct CitationSummary {
    pub papers_with_citations: usize,
    pub total_citations: u64,
    pub average_citations: f64,
    pub median_citations: u64,
    pub max_citations: u64,
    pub min_citations: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub total_papers: usize,
    pub yearly_distribution: BTreeMap<i32, usize>,
    pub venue_distribution: Vec<Tally>,
    pub top_authors: Vec<Tally>,
    pub common_keywords: Vec<Tally>,
    pub citations: Option<CitationSummary>,
}

impl CollectionStats {
    pub fn from_papers(papers: &[Paper], top_authors: usize, top_keywords: usize) -> Self {
        let mut yearly_distribution = BTreeMap::new();
        for year in papers.iter().filter_map(|p| p.year) {
            *yearly_distribution.entry(year).or_insert(0) += 1;
        }

        let mut top = rank(papers.iter().flat_map(Paper::author_names));
        top.truncate(top_authors);
        let mut keywords = rank(papers.iter().flat_map(|p| p.keywords.iter().map(String::as_str)));
        keywords.truncate(top_keywords);

        Self {
            total_papers: papers.len(),
            yearly_distribution,
            venue_distribution: rank(papers.iter().filter_map(|p| p.venue.as_deref())),
            top_authors: top,
            common_keywords: keywords,
            citations: citation_summary(papers),
        }
    }
}

fn citation_summary(papers: &[Paper]) -> Option<CitationSummary> {
    let mut counts: Vec<u64> = papers.iter().filter_map(|p| p.citation_count).collect();
    if counts.is_empty() {
        return None;
    }
    counts.sort_unstable();

    let total: u64 = counts.iter().sum();
    Some(CitationSummary {
        papers_with_citations: counts.len(),
        total_citations: total,
        average_citations: total as f64 / counts.len() as f64,
        median_citations: *counts.get(counts.len() / 2)?,
        max_citations: *counts.last()?,
        min_citations: *counts.first()?,
    })
}
