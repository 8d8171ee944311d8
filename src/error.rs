//! Error types for paperhelper.
//!
//! Every library function returns `Result<T, PaperError>`. Transport-class
//! failures (network, parse, rate limiting, API status, CAPTCHA) are caught
//! by the orchestrator and the citation aggregator and never cross their
//! boundary; only resolver misconfiguration reaches callers.

use thiserror::Error;

/// Main error type for paperhelper operations.
#[derive(Debug, Error)]
pub enum PaperError {
    /// The venue tables have no entry for this conference/year combination
    #[error("No venue mapping found for {conference} in year {year}")]
    NoVenueMapping {
        /// Conference name as requested
        conference: String,
        /// Requested year
        year: i32,
    },

    /// The conference is not part of the catalog
    #[error("Conference {0} not found in history")]
    UnknownConference(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML/XML/JSON payload could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message
        message: String,
    },

    /// CAPTCHA or bot wall detected
    #[error("CAPTCHA detected, please refresh cookies")]
    Captcha,

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PaperError {
    /// Whether this error came from talking to an external source.
    ///
    /// Transport errors are converted into "no data from this source" by the
    /// orchestrator and the aggregator.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PaperError::Network(_)
                | PaperError::Parse(_)
                | PaperError::RateLimited(_)
                | PaperError::Api { .. }
                | PaperError::Captcha
        )
    }
}

impl From<::config::ConfigError> for PaperError {
    fn from(err: ::config::ConfigError) -> Self {
        PaperError::Config(err.to_string())
    }
}

/// Result type alias using `PaperError`
pub type Result<T> = std::result::Result<T, PaperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(PaperError::Captcha.is_transport());
        assert!(PaperError::RateLimited(5).is_transport());
        assert!(PaperError::Parse("bad xml".into()).is_transport());
        assert!(!PaperError::UnknownConference("XYZ".into()).is_transport());
        assert!(!PaperError::NoVenueMapping {
            conference: "SANER".into(),
            year: 2012
        }
        .is_transport());
    }

    #[test]
    fn test_no_venue_mapping_message() {
        let err = PaperError::NoVenueMapping {
            conference: "ICLR".into(),
            year: 2010,
        };
        assert_eq!(err.to_string(), "No venue mapping found for ICLR in year 2010");
    }
}
