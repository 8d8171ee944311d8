//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `PAPERHELPER_*` environment variables (`PAPERHELPER_MAX_RETRIES=5`,
//! `PAPERHELPER_SEMANTIC_SCHOLAR_API_KEY=...`). The CLI applies its own
//! flags last.

use crate::error::{PaperError, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PAPERHELPER";

/// Default desktop browser user agent sent to HTML sources
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Scraper and source client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Minimum spacing between requests to one source, in seconds
    pub request_delay: f64,
    /// Per-request timeout, in seconds
    pub timeout: u64,
    pub max_retries: u32,
    pub dblp_base_url: String,
    pub anthology_base_url: String,
    /// Fetch each ACL paper's landing page for its abstract
    pub anthology_abstracts: bool,
    pub semantic_scholar_base_url: String,
    pub semantic_scholar_api_key: Option<String>,
    pub crossref_base_url: String,
    pub crossref_mailto: String,
    pub scholar_base_url: String,
    /// e.g. `http://127.0.0.1:7890`
    pub proxy: Option<String>,
    pub output_dir: PathBuf,
    /// Google Scholar cookie jar; `~/.paperhelper_cookies.json` when unset
    pub cookie_file: Option<PathBuf>,
    pub impact: ImpactWeights,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_delay: 1.0,
            timeout: 30,
            max_retries: 3,
            dblp_base_url: "https://dblp.org/db".to_string(),
            anthology_base_url: "https://aclanthology.org".to_string(),
            anthology_abstracts: false,
            semantic_scholar_base_url: "https://api.semanticscholar.org/graph/v1".to_string(),
            semantic_scholar_api_key: None,
            crossref_base_url: "https://api.crossref.org".to_string(),
            crossref_mailto: "paperhelper@example.com".to_string(),
            scholar_base_url: "https://scholar.google.com".to_string(),
            proxy: None,
            output_dir: PathBuf::from("data"),
            cookie_file: None,
            impact: ImpactWeights::default(),
        }
    }
}

impl ScraperConfig {
    /// Defaults overlaid with the optional JSON file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`ScraperConfig::load`] with an explicit environment source
    pub fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading config file");
            builder = builder.add_source(File::from(path).format(FileFormat::Json));
        }

        let config: Self = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break pacing or timeouts
    pub fn validate(&self) -> Result<()> {
        if !self.request_delay.is_finite() || self.request_delay < 0.0 {
            return Err(PaperError::Config(format!(
                "request_delay must be a finite, non-negative number of seconds, got {}",
                self.request_delay
            )));
        }
        if self.timeout == 0 {
            return Err(PaperError::Config("timeout must be at least one second".to_string()));
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay).unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Weights of the influence-score heuristic.
///
/// The score is not a standard bibliometric measure. The defaults must be
/// kept for results to stay comparable with earlier reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactWeights {
    /// Bonus per citing paper above `highly_cited_threshold`
    pub highly_cited_bonus: f64,
    /// Citing papers need strictly more citations than this
    pub highly_cited_threshold: u64,
    /// Bonus per citing paper published `recent_offset` years after the central one
    pub recent_bonus: f64,
    pub recent_offset: i32,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            highly_cited_bonus: 2.0,
            highly_cited_threshold: 50,
            recent_bonus: 0.5,
            recent_offset: 2,
        }
    }
}
