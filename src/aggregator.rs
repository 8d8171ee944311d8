//! Multi-source citation lookup.
//!
//! Sources are consulted in trust order and merged best-effort:
//! 1. Semantic Scholar: central paper, citations and references.
//! 2. Crossref, while citations are below `max / 2`: central paper details only.
//! 3. Google Scholar, when enabled and citations are below `max / 3`: central
//!    paper, citing papers, and related papers as reference candidates.
//!
//! Every source call is isolated. A failing source is logged and skipped,
//! so a lookup never fails. Lists are not deduplicated across sources.

use crate::config::ScraperConfig;
use crate::cookies::CookieJar;
use crate::crossref::CrossrefClient;
use crate::error::Result;
use crate::gscholar::GoogleScholarClient;
use crate::paper::{CitationNetwork, Paper};
use crate::semanticscholar::SemanticScholarClient;
use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use tracing::{info, warn};

/// A metadata service that can find a paper and its citation links.
///
/// Each source keeps its own record type; [`CitationSource::normalize`]
/// turns records into [`Paper`]s.
#[async_trait]
pub trait CitationSource: Send + Sync {
    type Record: Send + Sync;

    fn name(&self) -> &'static str;

    async fn search_by_title(&self, title: &str) -> Result<Option<Self::Record>>;

    /// Papers citing `record`
    async fn citations_of(&self, record: &Self::Record, limit: usize) -> Result<Vec<Self::Record>>;

    /// Papers cited by `record`, or the closest thing the source offers
    async fn references_of(&self, record: &Self::Record, limit: usize)
        -> Result<Vec<Self::Record>>;

    fn normalize(&self, record: &Self::Record) -> Option<Paper>;

    /// Citing papers of whatever a fresh title search finds
    async fn citations_by_title(&self, title: &str, limit: usize) -> Result<Vec<Self::Record>> {
        match self.search_by_title(title).await? {
            Some(record) => self.citations_of(&record, limit).await,
            None => Ok(Vec::new()),
        }
    }

    /// Reference candidates of whatever a fresh title search finds
    async fn references_by_title(&self, title: &str, limit: usize) -> Result<Vec<Self::Record>> {
        match self.search_by_title(title).await? {
            Some(record) => self.references_of(&record, limit).await,
            None => Ok(Vec::new()),
        }
    }
}

/// Result of a citation lookup
#[derive(Debug, Clone, Default, Serialize)]
pub struct CitationLookup {
    pub central: Option<Paper>,
    pub citations: Vec<Paper>,
    pub references: Vec<Paper>,
}

pub struct CitationAggregator<A, B, C> {
    primary: A,
    details: B,
    scraper: C,
}

impl CitationAggregator<SemanticScholarClient, CrossrefClient, GoogleScholarClient> {
    /// Aggregator over the live Semantic Scholar, Crossref and Scholar clients
    pub fn from_config(config: &ScraperConfig, cookies: &CookieJar) -> Result<Self> {
        Ok(Self::new(
            SemanticScholarClient::new(config)?,
            CrossrefClient::new(config)?,
            GoogleScholarClient::new(config, cookies)?,
        ))
    }
}

impl<A, B, C> CitationAggregator<A, B, C>
where
    A: CitationSource,
    B: CitationSource,
    C: CitationSource,
{
    pub fn new(primary: A, details: B, scraper: C) -> Self {
        Self {
            primary,
            details,
            scraper,
        }
    }

    /// Find the paper titled `title` with up to `max_results` citations and
    /// references. `use_scraper` enables the Google Scholar step.
    pub async fn find_citations(
        &self,
        title: &str,
        max_results: usize,
        use_scraper: bool,
    ) -> CitationLookup {
        let mut lookup = CitationLookup::default();

        self.from_primary(title, max_results, &mut lookup).await;

        if lookup.citations.len() < max_results / 2 {
            let source = &self.details;
            if let Some(Some(record)) = guarded(source.name(), title, source.search_by_title(title)).await {
                if lookup.central.is_none() {
                    lookup.central = source.normalize(&record);
                    info!(source = source.name(), "Central paper details found");
                }
            }
        }

        if use_scraper && lookup.citations.len() < max_results / 3 {
            self.from_scraper(title, max_results, &mut lookup).await;
        }

        info!(
            title = title,
            found = lookup.central.is_some(),
            citations = lookup.citations.len(),
            references = lookup.references.len(),
            "Citation lookup complete"
        );
        lookup
    }

    /// Lookup wrapped into a depth-1 network; `None` when no source found
    /// the paper
    pub async fn get_enriched_citation_network(
        &self,
        title: &str,
        max_papers: usize,
        use_scraper: bool,
    ) -> Option<CitationNetwork> {
        let lookup = self.find_citations(title, max_papers, use_scraper).await;
        match lookup.central {
            Some(central) => Some(CitationNetwork::new(
                central,
                lookup.references,
                lookup.citations,
            )),
            None => {
                warn!(title = title, "Could not find paper");
                None
            }
        }
    }

    async fn from_primary(&self, title: &str, max_results: usize, lookup: &mut CitationLookup) {
        let source = &self.primary;
        let Some(Some(record)) = guarded(source.name(), title, source.search_by_title(title)).await
        else {
            return;
        };
        let Some(central) = source.normalize(&record) else {
            return;
        };
        lookup.central = Some(central);

        let citations = guarded(source.name(), title, source.citations_of(&record, max_results))
            .await
            .unwrap_or_default();
        let references = guarded(source.name(), title, source.references_of(&record, max_results))
            .await
            .unwrap_or_default();

        lookup
            .citations
            .extend(citations.iter().filter_map(|r| source.normalize(r)).take(max_results));
        lookup
            .references
            .extend(references.iter().filter_map(|r| source.normalize(r)).take(max_results));

        info!(
            source = source.name(),
            citations = lookup.citations.len(),
            references = lookup.references.len(),
            "Primary source answered"
        );
    }

    /// A missed or failed first search does not end the step: citations and
    /// related papers are then each looked up by title again.
    async fn from_scraper(&self, title: &str, max_results: usize, lookup: &mut CitationLookup) {
        let source = &self.scraper;
        let record = guarded(source.name(), title, source.search_by_title(title))
            .await
            .flatten();

        if lookup.central.is_none() {
            lookup.central = record.as_ref().and_then(|r| source.normalize(r));
        }

        let citations = match &record {
            Some(record) => guarded(source.name(), title, source.citations_of(record, max_results)).await,
            None => guarded(source.name(), title, source.citations_by_title(title, max_results)).await,
        }
        .unwrap_or_default();
        let before = lookup.citations.len();
        lookup
            .citations
            .extend(citations.iter().filter_map(|r| source.normalize(r)));

        let related = match &record {
            Some(record) => {
                guarded(source.name(), title, source.references_of(record, max_results / 2)).await
            }
            None => {
                guarded(source.name(), title, source.references_by_title(title, max_results / 2)).await
            }
        }
        .unwrap_or_default();
        let before_refs = lookup.references.len();
        lookup
            .references
            .extend(related.iter().filter_map(|r| source.normalize(r)));

        info!(
            source = source.name(),
            citations = lookup.citations.len() - before,
            related = lookup.references.len() - before_refs,
            "Scraper source answered"
        );
    }
}

/// Await a source call, logging and swallowing its error
async fn guarded<T, F>(source: &str, title: &str, call: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match call.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(source = source, title = title, error = %e, "Citation source failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaperError;
    use std::sync::Mutex;

    /// Serves a fixed paper and `n` generated citations/references
    struct MockSource {
        name: &'static str,
        found: Option<&'static str>,
        citations: usize,
        references: usize,
        fail: bool,
        failing_searches: Mutex<usize>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockSource {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                found: None,
                citations: 0,
                references: 0,
                fail: false,
                failing_searches: Mutex::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn finding(mut self, title: &'static str, citations: usize, references: usize) -> Self {
            self.found = Some(title);
            self.citations = citations;
            self.references = references;
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        /// The first `n` searches fail, later ones succeed
        fn flaky_search(self, n: usize) -> Self {
            *self.failing_searches.lock().expect("lock") = n;
            self
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().expect("lock").clone()
        }

        fn record(&self, call: &'static str) -> Result<()> {
            self.calls.lock().expect("lock").push(call);
            if self.fail {
                return Err(PaperError::Api {
                    code: 500,
                    message: format!("{} down", self.name),
                });
            }
            Ok(())
        }

        fn generated(&self, kind: &str, n: usize, limit: usize) -> Vec<Paper> {
            (0..n.min(limit))
                .filter_map(|i| Paper::titled(&format!("{} {} {}", self.name, kind, i)))
                .collect()
        }
    }

    #[async_trait]
    impl CitationSource for MockSource {
        type Record = Paper;

        fn name(&self) -> &'static str {
            self.name
        }

        async fn search_by_title(&self, _title: &str) -> Result<Option<Paper>> {
            self.record("search")?;
            {
                let mut remaining = self.failing_searches.lock().expect("lock");
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(PaperError::Captcha);
                }
            }
            Ok(self
                .found
                .and_then(Paper::titled)
                .map(|p| p.with_doi(format!("10.1/{}", self.name))))
        }

        async fn citations_of(&self, _record: &Paper, limit: usize) -> Result<Vec<Paper>> {
            self.record("citations")?;
            Ok(self.generated("citation", self.citations, limit))
        }

        async fn references_of(&self, _record: &Paper, limit: usize) -> Result<Vec<Paper>> {
            self.record("references")?;
            Ok(self.generated("reference", self.references, limit))
        }

        fn normalize(&self, record: &Paper) -> Option<Paper> {
            Some(record.clone())
        }
    }

    #[tokio::test]
    async fn test_fully_degraded_lookup() {
        let aggregator = CitationAggregator::new(
            MockSource::new("s2").failing(),
            MockSource::new("crossref").failing(),
            MockSource::new("scholar").failing(),
        );

        let lookup = aggregator.find_citations("Anything", 50, true).await;
        assert!(lookup.central.is_none());
        assert!(lookup.citations.is_empty());
        assert!(lookup.references.is_empty());
        assert!(aggregator
            .get_enriched_citation_network("Anything", 50, true)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_primary_enough_skips_fallbacks() {
        let aggregator = CitationAggregator::new(
            MockSource::new("s2").finding("Central", 80, 30),
            MockSource::new("crossref").finding("Central", 0, 0),
            MockSource::new("scholar").finding("Central", 5, 5),
        );

        let lookup = aggregator.find_citations("Central", 50, true).await;
        assert_eq!(lookup.citations.len(), 50);
        assert_eq!(lookup.references.len(), 30);
        assert!(aggregator.details.calls().is_empty());
        assert!(aggregator.scraper.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sparse_primary_consults_all_sources() {
        let aggregator = CitationAggregator::new(
            MockSource::new("s2").finding("Central", 10, 4),
            MockSource::new("crossref").finding("Central", 0, 0),
            MockSource::new("scholar").finding("Central", 7, 40),
        );

        let lookup = aggregator.find_citations("Central", 50, true).await;
        let central = lookup.central.expect("central found");
        assert_eq!(central.doi.as_deref(), Some("10.1/s2"));

        assert_eq!(aggregator.details.calls(), vec!["search"]);
        assert_eq!(lookup.citations.len(), 17);
        // related papers are capped at max / 2
        assert_eq!(lookup.references.len(), 4 + 25);
    }

    #[tokio::test]
    async fn test_thresholds_between_fallbacks() {
        let aggregator = CitationAggregator::new(
            MockSource::new("s2").finding("Central", 20, 0),
            MockSource::new("crossref").finding("Central", 0, 0),
            MockSource::new("scholar").finding("Central", 5, 5),
        );

        aggregator.find_citations("Central", 50, true).await;
        assert_eq!(aggregator.details.calls(), vec!["search"]);
        assert!(aggregator.scraper.calls().is_empty());
    }

    #[tokio::test]
    async fn test_details_fill_central_when_primary_fails() {
        let aggregator = CitationAggregator::new(
            MockSource::new("s2").failing(),
            MockSource::new("crossref").finding("Central", 0, 0),
            MockSource::new("scholar").finding("Central", 5, 5),
        );

        let network = aggregator
            .get_enriched_citation_network("Central", 50, false)
            .await
            .expect("crossref supplied the paper");
        assert_eq!(network.central_paper.doi.as_deref(), Some("10.1/crossref"));
        assert!(network.citations.is_empty());
        assert!(aggregator.scraper.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scraper_failure_keeps_earlier_results() {
        let aggregator = CitationAggregator::new(
            MockSource::new("s2").finding("Central", 2, 3),
            MockSource::new("crossref").failing(),
            MockSource::new("scholar").failing(),
        );

        let lookup = aggregator.find_citations("Central", 50, true).await;
        assert!(lookup.central.is_some());
        assert_eq!(lookup.citations.len(), 2);
        assert_eq!(lookup.references.len(), 3);
        // citations and related papers each retry the title search
        assert_eq!(aggregator.scraper.calls(), vec!["search", "search", "search"]);
    }

    #[tokio::test]
    async fn test_scraper_search_miss_falls_back_to_title_lookups() {
        let aggregator = CitationAggregator::new(
            MockSource::new("s2").finding("Central", 1, 2),
            MockSource::new("crossref").failing(),
            MockSource::new("scholar").finding("Central", 7, 40).flaky_search(1),
        );

        let lookup = aggregator.find_citations("Central", 50, true).await;
        assert_eq!(lookup.central.expect("primary found it").doi.as_deref(), Some("10.1/s2"));
        assert_eq!(lookup.citations.len(), 1 + 7);
        assert_eq!(lookup.references.len(), 2 + 25);
        assert_eq!(
            aggregator.scraper.calls(),
            vec!["search", "search", "citations", "search", "references"]
        );
    }
}
