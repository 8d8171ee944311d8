//! Venue resolution over the historical tables.
//!
//! Answers three questions for a `(conference, year)` pair: did the
//! conference convene, which source key indexes it, and which earlier
//! venues to fall back on. [`VenueCatalog::builtin`] wraps the shipped
//! tables; tests build catalogs over their own static records.

use crate::error::{PaperError, Result};
use crate::history::{
    ConferenceRecord, Field, SourceKind, ALIASES, CONFERENCES, FIRST_YEAR, LAST_YEAR,
};
use serde::Serialize;

/// Paper floor reported for unknown conferences or uncovered years
pub const DEFAULT_MIN_PAPERS: usize = 5;

/// A resolved source-system venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueKey {
    /// e.g. `conf/wcre`
    pub key: String,
    /// e.g. `saner`
    pub short: String,
}

impl VenueKey {
    pub fn new(key: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            short: short.into(),
        }
    }
}

/// Read-only view over a set of conference records
#[derive(Debug, Clone, Copy)]
pub struct VenueCatalog {
    records: &'static [ConferenceRecord],
}

impl Default for VenueCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl VenueCatalog {
    /// Catalog over the shipped conference tables
    pub fn builtin() -> Self {
        Self::new(CONFERENCES)
    }

    pub fn new(records: &'static [ConferenceRecord]) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &'static [ConferenceRecord] {
        self.records
    }

    /// Case-insensitive lookup, honoring aliases such as `NEURIPS`
    pub fn find(&self, conference: &str) -> Option<&'static ConferenceRecord> {
        let wanted = conference.trim().to_uppercase();
        let wanted = ALIASES
            .iter()
            .find(|(alias, _)| *alias == wanted)
            .map(|(_, name)| name.to_string())
            .unwrap_or(wanted);

        self.records.iter().find(|r| r.name == wanted)
    }

    pub fn get(&self, conference: &str) -> Result<&'static ConferenceRecord> {
        self.find(conference)
            .ok_or_else(|| PaperError::UnknownConference(conference.to_string()))
    }

    /// Source key for `conference` in `year`.
    ///
    /// Ranges are scanned in table order and the first covering range wins.
    pub fn venue_for_year(&self, conference: &str, year: i32) -> Result<VenueKey> {
        let record = self.get(conference)?;

        record
            .history
            .iter()
            .find(|range| range.covers(year))
            .map(|range| VenueKey::new(range.key, range.short))
            .ok_or_else(|| PaperError::NoVenueMapping {
                conference: conference.to_string(),
                year,
            })
    }

    /// False for gap years; otherwise true iff a venue range covers `year`.
    pub fn conference_exists_in_year(&self, conference: &str, year: i32) -> bool {
        if let Some(record) = self.find(conference) {
            if record.gap_years.contains(&year) {
                return false;
            }
        }
        self.venue_for_year(conference, year).is_ok()
    }

    /// Health-check floor for the paper count. Never fails.
    pub fn expected_min_papers(&self, conference: &str, year: i32) -> usize {
        self.find(conference)
            .and_then(|record| {
                record
                    .floors
                    .iter()
                    .find(|f| f.start <= year && year <= f.end)
            })
            .map(|f| f.minimum)
            .unwrap_or(DEFAULT_MIN_PAPERS)
    }

    /// Short names of predecessor venues, most recent first.
    ///
    /// Unknown conferences have no predecessors.
    pub fn predecessor_source_keys(&self, conference: &str) -> Vec<&'static str> {
        self.find(conference)
            .map(|record| record.predecessors.to_vec())
            .unwrap_or_default()
    }

    /// Predecessor short names expanded into full source keys
    pub fn predecessor_venues(&self, conference: &str) -> Vec<VenueKey> {
        match self.find(conference) {
            Some(record) => record
                .predecessors
                .iter()
                .map(|short| VenueKey::new(record.source.key_for(short), *short))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn all_conferences(&self) -> Vec<&'static str> {
        self.records.iter().map(|r| r.name).collect()
    }

    pub fn conferences_in_field(&self, field: Field) -> Vec<&'static ConferenceRecord> {
        self.records.iter().filter(|r| r.field == field).collect()
    }

    pub fn source_kind(&self, conference: &str) -> Option<SourceKind> {
        self.find(conference).map(|r| r.source)
    }

    /// Check the table invariants: venue ranges and paper floors are
    /// well-formed, ascending and non-overlapping.
    pub fn validate(&self) -> Result<()> {
        for record in self.records {
            if record.history.is_empty() {
                return Err(PaperError::Validation(format!(
                    "{} has no venue history",
                    record.name
                )));
            }

            let ranges = record.history.iter().map(|r| (r.start, r.end));
            check_ranges(record.name, "venue history", ranges)?;

            let floors = record.floors.iter().map(|f| (f.start, f.end));
            check_ranges(record.name, "paper floors", floors)?;
        }
        Ok(())
    }
}

fn check_ranges(
    name: &str,
    table: &str,
    ranges: impl Iterator<Item = (i32, i32)>,
) -> Result<()> {
    let mut previous_end: Option<i32> = None;
    for (start, end) in ranges {
        if start > end {
            return Err(PaperError::Validation(format!(
                "{}: {} range {}-{} is inverted",
                name, table, start, end
            )));
        }
        if let Some(prev) = previous_end {
            if start <= prev {
                return Err(PaperError::Validation(format!(
                    "{}: {} range starting {} overlaps or is out of order",
                    name, table, start
                )));
            }
        }
        previous_end = Some(end);
    }
    Ok(())
}

/// All years the tables cover (2009-2024)
pub fn all_test_years() -> Vec<i32> {
    (FIRST_YEAR..=LAST_YEAR).collect()
}

// === Free functions over the shipped tables ===

pub fn venue_for_year(conference: &str, year: i32) -> Result<VenueKey> {
    VenueCatalog::builtin().venue_for_year(conference, year)
}

pub fn conference_exists_in_year(conference: &str, year: i32) -> bool {
    VenueCatalog::builtin().conference_exists_in_year(conference, year)
}

pub fn expected_min_papers(conference: &str, year: i32) -> usize {
    VenueCatalog::builtin().expected_min_papers(conference, year)
}

pub fn predecessor_source_keys(conference: &str) -> Vec<&'static str> {
    VenueCatalog::builtin().predecessor_source_keys(conference)
}
