//! Historical-aware fetch orchestration.
//!
//! For one `(conference, year)` the orchestrator checks that the conference
//! convened, fetches the venue that indexed it that year, and falls back to
//! every predecessor venue when the primary fetch fails or comes back empty.
//! Fetcher errors never escape: each attempt is logged and recorded in the
//! [`YearReport`].

use crate::error::Result;
use crate::fetcher::PaperFetcher;
use crate::history::{FIRST_YEAR, LAST_YEAR};
use crate::paper::Paper;
use crate::resolver::{VenueCatalog, VenueKey};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// One call to the fetcher and what came of it
#[derive(Debug, Clone, Serialize)]
pub struct FetchAttempt {
    pub venue: VenueKey,
    pub predecessor: bool,
    pub papers: usize,
    pub error: Option<String>,
}

/// What happened for one conference year
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum YearOutcome {
    /// Gap year, or outside the conference's venue history. The fetcher
    /// was not called.
    NotConvened,
    Fetched {
        papers: Vec<Paper>,
        /// Venue resolved for the year
        venue: VenueKey,
        used_predecessor: bool,
    },
    /// At least one attempt answered, none with papers
    Empty { attempts: Vec<FetchAttempt> },
    /// Every attempt errored
    Failed { attempts: Vec<FetchAttempt> },
}

#[derive(Debug, Clone, Serialize)]
pub struct YearReport {
    pub conference: String,
    pub year: i32,
    pub expected_minimum: usize,
    pub outcome: YearOutcome,
}

impl YearReport {
    pub fn papers(&self) -> &[Paper] {
        match &self.outcome {
            YearOutcome::Fetched { papers, .. } => papers,
            _ => &[],
        }
    }

    pub fn into_papers(self) -> Vec<Paper> {
        match self.outcome {
            YearOutcome::Fetched { papers, .. } => papers,
            _ => Vec::new(),
        }
    }

    /// Fewer papers than the health-check floor for a year that convened
    pub fn below_expected(&self) -> bool {
        match &self.outcome {
            YearOutcome::NotConvened => false,
            _ => self.papers().len() < self.expected_minimum,
        }
    }
}

/// Venue history of one conference over the covered years
#[derive(Debug, Clone, Serialize)]
pub struct ConferenceTimeline {
    pub current_name: String,
    pub full_name: String,
    pub predecessors: Vec<String>,
    pub year_mappings: BTreeMap<i32, VenueKey>,
    pub available_years: Vec<i32>,
}

/// Scrapes conference years through a [`PaperFetcher`], one request at a time
pub struct HistoricalScraper<F> {
    catalog: VenueCatalog,
    fetcher: F,
}

impl<F: PaperFetcher> HistoricalScraper<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_catalog(VenueCatalog::builtin(), fetcher)
    }

    pub fn with_catalog(catalog: VenueCatalog, fetcher: F) -> Self {
        Self { catalog, fetcher }
    }

    pub fn catalog(&self) -> &VenueCatalog {
        &self.catalog
    }

    /// Scrape one year and report how the papers were obtained
    pub async fn scrape_year(&self, conference: &str, year: i32) -> Result<YearReport> {
        let expected_minimum = self.catalog.expected_min_papers(conference, year);
        let report = |outcome| YearReport {
            conference: conference.to_string(),
            year,
            expected_minimum,
            outcome,
        };

        let record = self.catalog.get(conference)?;
        if !self.catalog.conference_exists_in_year(conference, year) {
            info!(conference = conference, year = year, "Conference did not convene");
            return Ok(report(YearOutcome::NotConvened));
        }

        let venue = self.catalog.venue_for_year(conference, year)?;
        let mut attempts = Vec::new();

        let mut papers = self.attempt(&venue, year, false, &mut attempts).await;
        let mut used_predecessor = false;

        if papers.is_empty() {
            for predecessor in self.catalog.predecessor_venues(conference) {
                info!(
                    conference = conference,
                    year = year,
                    predecessor = %predecessor.short,
                    "Trying predecessor venue"
                );
                let mut found = self.attempt(&predecessor, year, true, &mut attempts).await;
                for paper in &mut found {
                    paper.set_meta("predecessor_conference", predecessor.short.as_str());
                }
                if !found.is_empty() {
                    used_predecessor = true;
                }
                papers.extend(found);
            }
        }

        if papers.is_empty() {
            let outcome = if attempts.iter().all(|a| a.error.is_some()) {
                YearOutcome::Failed { attempts }
            } else {
                YearOutcome::Empty { attempts }
            };
            warn!(conference = conference, year = year, "No papers found");
            return Ok(report(outcome));
        }

        for paper in &mut papers {
            paper.venue = Some(record.full_name.to_string());
            paper.set_meta("historical_venue_key", venue.key.as_str());
            paper.set_meta("historical_venue_short", venue.short.as_str());
            paper.set_meta("current_conference", record.name);
            let from_predecessor = paper.metadata.contains_key("predecessor_conference");
            paper
                .metadata
                .insert("used_predecessor".to_string(), Value::Bool(from_predecessor));
        }

        info!(conference = conference, year = year, count = papers.len(), "Scraped papers");
        Ok(report(YearOutcome::Fetched {
            papers,
            venue,
            used_predecessor,
        }))
    }

    /// Papers for one year; empty when the conference did not convene or
    /// no source produced anything
    pub async fn scrape_papers(&self, conference: &str, year: i32) -> Result<Vec<Paper>> {
        Ok(self.scrape_year(conference, year).await?.into_papers())
    }

    /// Scrape every year in `start..=end` independently
    pub async fn scrape_papers_range(
        &self,
        conference: &str,
        start: i32,
        end: i32,
    ) -> BTreeMap<i32, Vec<Paper>> {
        let mut results = BTreeMap::new();
        for year in start..=end {
            let papers = match self.scrape_papers(conference, year).await {
                Ok(papers) => papers,
                Err(e) => {
                    error!(conference = conference, year = year, error = %e, "Year failed");
                    Vec::new()
                }
            };
            results.insert(year, papers);
        }
        results
    }

    /// One year across every catalogued conference, sequentially
    pub async fn scrape_all_conferences(&self, year: i32) -> BTreeMap<String, Vec<Paper>> {
        let mut results = BTreeMap::new();
        for name in self.catalog.all_conferences() {
            let papers = match self.scrape_papers(name, year).await {
                Ok(papers) => papers,
                Err(e) => {
                    error!(conference = name, year = year, error = %e, "Conference failed");
                    Vec::new()
                }
            };
            results.insert(name.to_string(), papers);
        }
        results
    }

    pub fn conference_timeline(&self, conference: &str) -> Result<ConferenceTimeline> {
        let record = self.catalog.get(conference)?;
        let mut year_mappings = BTreeMap::new();

        for year in FIRST_YEAR..=LAST_YEAR {
            if !self.catalog.conference_exists_in_year(record.name, year) {
                continue;
            }
            if let Ok(venue) = self.catalog.venue_for_year(record.name, year) {
                year_mappings.insert(year, venue);
            }
        }

        Ok(ConferenceTimeline {
            current_name: record.name.to_string(),
            full_name: record.full_name.to_string(),
            predecessors: record.predecessors.iter().map(|p| p.to_string()).collect(),
            available_years: year_mappings.keys().copied().collect(),
            year_mappings,
        })
    }

    /// Whether the primary venue answers for each year. Years the
    /// conference did not convene are `false` without a request.
    pub async fn validate_availability(
        &self,
        conference: &str,
        start: i32,
        end: i32,
    ) -> BTreeMap<i32, bool> {
        let mut availability = BTreeMap::new();
        for year in start..=end {
            let available = match self.catalog.venue_for_year(conference, year) {
                Ok(venue) if self.catalog.conference_exists_in_year(conference, year) => {
                    self.fetcher.fetch(&venue, year).await.is_ok()
                }
                _ => false,
            };
            availability.insert(year, available);
        }
        availability
    }

    async fn attempt(
        &self,
        venue: &VenueKey,
        year: i32,
        predecessor: bool,
        attempts: &mut Vec<FetchAttempt>,
    ) -> Vec<Paper> {
        let (papers, error) = match self.fetcher.fetch(venue, year).await {
            Ok(papers) => (papers, None),
            Err(e) => {
                warn!(venue_key = %venue.key, year = year, error = %e, "Fetch failed");
                (Vec::new(), Some(e.to_string()))
            }
        };
        attempts.push(FetchAttempt {
            venue: venue.clone(),
            predecessor,
            papers: papers.len(),
            error,
        });
        papers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaperError;
    use crate::history::{ConferenceRecord, Field, PaperFloor, SourceKind, VenueRange};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns canned results per venue key and records every call
    #[derive(Default)]
    struct MockFetcher {
        responses: HashMap<String, std::result::Result<usize, String>>,
        calls: Mutex<Vec<(String, i32)>>,
    }

    impl MockFetcher {
        fn with(mut self, key: &str, response: std::result::Result<usize, &str>) -> Self {
            self.responses
                .insert(key.to_string(), response.map_err(str::to_string));
            self
        }

        fn calls(&self) -> Vec<(String, i32)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl PaperFetcher for MockFetcher {
        async fn fetch(&self, venue: &VenueKey, year: i32) -> Result<Vec<Paper>> {
            self.calls
                .lock()
                .expect("lock")
                .push((venue.key.clone(), year));

            match self.responses.get(&venue.key) {
                Some(Ok(count)) => (0..*count)
                    .map(|i| {
                        Paper::new(&format!("{} paper {}", venue.short, i)).map(|p| p.with_year(year))
                    })
                    .collect(),
                Some(Err(msg)) => Err(PaperError::Parse(msg.clone())),
                None => Ok(Vec::new()),
            }
        }
    }

    static RENAMED: &[ConferenceRecord] = &[ConferenceRecord {
        name: "X",
        full_name: "The X Conference",
        field: Field::SoftwareEngineering,
        source: SourceKind::Dblp,
        history: &[VenueRange::new(2009, 2024, "conf/x", "x")],
        gap_years: &[2011],
        floors: &[PaperFloor::new(2009, 2024, 3)],
        predecessors: &["y", "z"],
    }];

    fn renamed(fetcher: MockFetcher) -> HistoricalScraper<MockFetcher> {
        HistoricalScraper::with_catalog(VenueCatalog::new(RENAMED), fetcher)
    }

    #[tokio::test]
    async fn test_not_convened_skips_fetcher() -> Result<()> {
        let scraper = HistoricalScraper::new(MockFetcher::default());
        let papers = scraper.scrape_papers("SANER", 2012).await?;
        assert!(papers.is_empty());
        assert!(scraper.fetcher.calls().is_empty());

        let report = scraper.scrape_year("SANER", 2012).await?;
        assert!(matches!(report.outcome, YearOutcome::NotConvened));
        assert!(!report.below_expected());
        Ok(())
    }

    #[tokio::test]
    async fn test_primary_venue_fetched_once() -> Result<()> {
        let fetcher = MockFetcher::default().with("conf/wcre", Ok(40));
        let scraper = HistoricalScraper::new(fetcher);

        let papers = scraper.scrape_papers("SANER", 2015).await?;
        assert_eq!(papers.len(), 40);
        assert_eq!(scraper.fetcher.calls(), vec![("conf/wcre".to_string(), 2015)]);

        let paper = &papers[0];
        assert_eq!(
            paper.venue.as_deref(),
            Some("IEEE International Conference on Software Analysis, Evolution and Reengineering")
        );
        assert_eq!(paper.meta_str("historical_venue_key"), Some("conf/wcre"));
        assert_eq!(paper.meta_str("historical_venue_short"), Some("saner"));
        assert_eq!(paper.meta_str("current_conference"), Some("SANER"));
        assert_eq!(paper.metadata["used_predecessor"], Value::Bool(false));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_primary_falls_back_to_predecessors() -> Result<()> {
        let fetcher = MockFetcher::default()
            .with("conf/x", Ok(0))
            .with("conf/y", Ok(2));
        let scraper = renamed(fetcher);

        let report = scraper.scrape_year("X", 2020).await?;
        assert_eq!(
            scraper.fetcher.calls(),
            vec![
                ("conf/x".to_string(), 2020),
                ("conf/y".to_string(), 2020),
                ("conf/z".to_string(), 2020),
            ]
        );
        assert!(report.below_expected());

        match report.outcome {
            YearOutcome::Fetched {
                papers,
                venue,
                used_predecessor,
            } => {
                assert!(used_predecessor);
                assert_eq!(venue.key, "conf/x");
                assert_eq!(papers.len(), 2);
                assert_eq!(papers[0].meta_str("predecessor_conference"), Some("y"));
                assert_eq!(papers[0].venue.as_deref(), Some("The X Conference"));
                assert_eq!(papers[0].metadata["used_predecessor"], Value::Bool(true));
            }
            other => panic!("expected papers, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_predecessor_results_are_unioned() -> Result<()> {
        let fetcher = MockFetcher::default()
            .with("conf/x", Err("connection reset"))
            .with("conf/y", Ok(2))
            .with("conf/z", Ok(3));
        let scraper = renamed(fetcher);

        let papers = scraper.scrape_papers("X", 2020).await?;
        assert_eq!(papers.len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_and_empty_outcomes() -> Result<()> {
        let failing = MockFetcher::default()
            .with("conf/x", Err("timeout"))
            .with("conf/y", Err("timeout"))
            .with("conf/z", Err("timeout"));
        let report = renamed(failing).scrape_year("X", 2020).await?;
        match report.outcome {
            YearOutcome::Failed { attempts } => assert_eq!(attempts.len(), 3),
            other => panic!("expected failure, got {:?}", other),
        }

        let report = renamed(MockFetcher::default()).scrape_year("X", 2020).await?;
        assert!(matches!(report.outcome, YearOutcome::Empty { .. }));
        assert!(report.below_expected());
        Ok(())
    }

    #[tokio::test]
    async fn test_range_isolates_years() {
        let fetcher = MockFetcher::default().with("conf/x", Ok(4));
        let scraper = renamed(fetcher);

        let results = scraper.scrape_papers_range("X", 2010, 2012).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[&2010].len(), 4);
        assert!(results[&2011].is_empty());
        assert_eq!(results[&2012].len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_conference_is_an_error() {
        let scraper = HistoricalScraper::new(MockFetcher::default());
        assert!(matches!(
            scraper.scrape_year("ICSEE", 2020).await,
            Err(PaperError::UnknownConference(_))
        ));
        assert!(matches!(
            scraper.scrape_papers("ICSEE", 2020).await,
            Err(PaperError::UnknownConference(_))
        ));
        assert!(scraper.fetcher.calls().is_empty());

        let range = scraper.scrape_papers_range("ICSEE", 2019, 2020).await;
        assert!(range.values().all(Vec::is_empty));
        assert_eq!(range.len(), 2);
    }

    #[test]
    fn test_timeline() -> Result<()> {
        let scraper = HistoricalScraper::new(MockFetcher::default());
        let timeline = scraper.conference_timeline("saner")?;
        assert_eq!(timeline.current_name, "SANER");
        assert_eq!(timeline.predecessors, vec!["wcre", "csmr"]);
        assert_eq!(timeline.available_years, (2015..=2024).collect::<Vec<_>>());
        assert_eq!(timeline.year_mappings[&2015].key, "conf/wcre");

        assert!(scraper.conference_timeline("NOPE").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_availability() {
        let fetcher = MockFetcher::default().with("conf/x", Err("404"));
        let scraper = renamed(fetcher);
        let availability = scraper.validate_availability("X", 2010, 2011).await;
        assert!(!availability[&2010]);
        assert!(!availability[&2011]);
        assert_eq!(scraper.fetcher.calls().len(), 1);

        let scraper = renamed(MockFetcher::default());
        let availability = scraper.validate_availability("X", 2010, 2010).await;
        assert!(availability[&2010]);
    }
}
