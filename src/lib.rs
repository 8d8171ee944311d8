//! # paperhelper
//!
//! Conference paper inventory with historical venue resolution, plus
//! multi-source citation lookup and citation network analysis.
//!
//! ## Modules
//!
//! - [`history`] - Static conference catalog (venue history, gap years, paper floors)
//! - [`resolver`] - Venue resolution over the catalog
//! - [`orchestrator`] - Historical-aware fetching with predecessor fallback
//! - [`dblp`] / [`anthology`] - Per-source proceedings fetchers
//! - [`aggregator`] - Semantic Scholar, Crossref and Google Scholar citation lookup
//! - [`analysis`] - Citation network statistics and recommendations
//! - [`storage`] / [`filters`] - Output files, filtering and search
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paperhelper::{HistoricalScraper, ScraperConfig, SourceRouter};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScraperConfig::load(None)?;
//!     let scraper = HistoricalScraper::new(SourceRouter::from_config(&config)?);
//!     let papers = scraper.scrape_papers("SANER", 2015).await?;
//!     println!("Found {} papers", papers.len());
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod analysis;
pub mod anthology;
pub mod config;
pub mod cookies;
pub mod crossref;
pub mod dblp;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod gscholar;
pub mod history;
pub mod http;
pub mod matching;
pub mod orchestrator;
pub mod pacing;
pub mod paper;
pub mod resolver;
pub mod semanticscholar;
pub mod storage;

pub use aggregator::{CitationAggregator, CitationLookup, CitationSource};
pub use config::{ImpactWeights, ScraperConfig};
pub use error::{PaperError, Result};
pub use fetcher::{PaperFetcher, SourceRouter};
pub use orchestrator::{HistoricalScraper, YearOutcome, YearReport};
pub use paper::{Author, CitationNetwork, Paper};
pub use resolver::{VenueCatalog, VenueKey};
