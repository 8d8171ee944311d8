//! Per-source paper fetchers.
//!
//! A fetcher turns one `(venue key, year)` pair into papers. Errors are
//! transport errors; the orchestrator decides what an error means.

use crate::anthology::AnthologyFetcher;
use crate::config::ScraperConfig;
use crate::dblp::DblpFetcher;
use crate::error::{PaperError, Result};
use crate::paper::Paper;
use crate::resolver::VenueKey;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PaperFetcher: Send + Sync {
    /// Fetch every paper published at `venue` in `year`
    async fn fetch(&self, venue: &VenueKey, year: i32) -> Result<Vec<Paper>>;
}

#[async_trait]
impl<T: PaperFetcher + ?Sized> PaperFetcher for Arc<T> {
    async fn fetch(&self, venue: &VenueKey, year: i32) -> Result<Vec<Paper>> {
        (**self).fetch(venue, year).await
    }
}

#[async_trait]
impl<T: PaperFetcher + ?Sized> PaperFetcher for Box<T> {
    async fn fetch(&self, venue: &VenueKey, year: i32) -> Result<Vec<Paper>> {
        (**self).fetch(venue, year).await
    }
}

/// Dispatches on the venue key prefix: `conf/` goes to DBLP,
/// `venues/` to the ACL Anthology.
pub struct SourceRouter {
    dblp: Box<dyn PaperFetcher>,
    anthology: Box<dyn PaperFetcher>,
}

impl SourceRouter {
    pub fn new(dblp: Box<dyn PaperFetcher>, anthology: Box<dyn PaperFetcher>) -> Self {
        Self { dblp, anthology }
    }

    /// Router over the live DBLP and Anthology fetchers
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Ok(Self::new(
            Box::new(DblpFetcher::new(config)?),
            Box::new(AnthologyFetcher::new(config)?),
        ))
    }
}

#[async_trait]
impl PaperFetcher for SourceRouter {
    async fn fetch(&self, venue: &VenueKey, year: i32) -> Result<Vec<Paper>> {
        if venue.key.starts_with("conf/") || venue.key.starts_with("journals/") {
            self.dblp.fetch(venue, year).await
        } else if venue.key.starts_with("venues/") {
            self.anthology.fetch(venue, year).await
        } else {
            Err(PaperError::Config(format!(
                "no fetcher handles venue key {}",
                venue.key
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Labeled(&'static str);

    #[async_trait]
    impl PaperFetcher for Labeled {
        async fn fetch(&self, venue: &VenueKey, year: i32) -> Result<Vec<Paper>> {
            let paper = Paper::new(&format!("{} {}", self.0, venue.short))?.with_year(year);
            Ok(vec![paper])
        }
    }

    fn router() -> SourceRouter {
        SourceRouter::new(Box::new(Labeled("dblp")), Box::new(Labeled("acl")))
    }

    #[tokio::test]
    async fn test_router_dispatch() -> Result<()> {
        let router = router();

        let papers = router.fetch(&VenueKey::new("conf/icse", "icse"), 2020).await?;
        assert_eq!(papers[0].title, "dblp icse");

        let papers = router.fetch(&VenueKey::new("venues/acl", "acl"), 2020).await?;
        assert_eq!(papers[0].title, "acl acl");
        Ok(())
    }

    #[tokio::test]
    async fn test_router_rejects_unknown_prefix() {
        let result = router().fetch(&VenueKey::new("openreview/x", "x"), 2020).await;
        assert!(matches!(result, Err(PaperError::Config(_))));
    }
}
