//! Citation network analysis and recommendations.
//!
//! Everything here is a pure function over a [`CitationNetwork`]; nothing
//! touches the network or the outside world.

use crate::config::ImpactWeights;
use crate::paper::{CitationNetwork, Paper};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Entries kept in each frequency table
const TOP_N: usize = 10;

/// Authors considered by [`find_potential_collaborators`]
const MAX_COLLABORATOR_CANDIDATES: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub central_paper: CentralSummary,
    pub network_stats: NetworkStats,
    pub temporal_analysis: TemporalStats,
    pub venue_analysis: VenueStats,
    pub author_analysis: AuthorStats,
    pub impact_metrics: ImpactMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct CentralSummary {
    pub title: String,
    pub year: Option<i32>,
    pub citation_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkStats {
    pub total_papers: usize,
    pub citations_found: usize,
    pub references_found: usize,
    /// `citations / max(1, references)`
    pub citation_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearSpread {
    pub count: usize,
    pub range: Option<(i32, i32)>,
}

impl YearSpread {
    fn of(years: &[i32]) -> Self {
        let range = match (years.iter().min(), years.iter().max()) {
            (Some(&lo), Some(&hi)) => Some((lo, hi)),
            _ => None,
        };
        Self {
            count: years.len(),
            range,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemporalStats {
    pub central_paper_year: Option<i32>,
    pub reference_years: YearSpread,
    pub citation_years: YearSpread,
    /// Central year minus the mean year of dated references
    pub average_reference_age: Option<f64>,
    /// Latest citing year minus the central year
    pub years_since_publication: Option<i32>,
}

/// A name with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueStats {
    pub central_venue: Option<String>,
    pub reference_venues: Vec<Tally>,
    pub citation_venues: Vec<Tally>,
    pub reference_venue_diversity: usize,
    pub citation_venue_diversity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorStats {
    pub central_authors: Vec<String>,
    pub top_referenced_authors: Vec<Tally>,
    pub top_citing_authors: Vec<Tally>,
    /// Authors on both sides of the network, minus the central authors
    pub potential_collaborators: Vec<String>,
    pub author_network_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactMetrics {
    pub direct_citations: usize,
    pub references_made: usize,
    pub citing_papers_avg_citations: f64,
    pub referenced_papers_avg_citations: f64,
    pub network_total_citations: u64,
    pub influence_score: f64,
}

/// Author suggested by [`find_potential_collaborators`]
#[derive(Debug, Clone, Serialize)]
pub struct Collaborator {
    pub name: String,
    pub papers_count: usize,
    pub recent_paper: Paper,
    pub total_citations: u64,
    pub venues: Vec<String>,
}

/// Analyze a citation network
pub fn analyze(network: &CitationNetwork, weights: &ImpactWeights) -> AnalysisReport {
    let central = &network.central_paper;

    AnalysisReport {
        central_paper: CentralSummary {
            title: central.title.clone(),
            year: central.year,
            citation_count: central.citation_count.unwrap_or(0),
        },
        network_stats: NetworkStats {
            total_papers: network.total_papers(),
            citations_found: network.citations.len(),
            references_found: network.references.len(),
            citation_ratio: network.citations.len() as f64 / network.references.len().max(1) as f64,
        },
        temporal_analysis: temporal_stats(network),
        venue_analysis: venue_stats(network),
        author_analysis: author_stats(network),
        impact_metrics: impact_metrics(network, weights),
    }
}

fn temporal_stats(network: &CitationNetwork) -> TemporalStats {
    let central_year = network.central_paper.year;
    let ref_years: Vec<i32> = network.references.iter().filter_map(|p| p.year).collect();
    let cite_years: Vec<i32> = network.citations.iter().filter_map(|p| p.year).collect();

    let average_reference_age = match central_year {
        Some(year) if !ref_years.is_empty() => {
            let mean = ref_years.iter().map(|&y| f64::from(y)).sum::<f64>() / ref_years.len() as f64;
            Some(f64::from(year) - mean)
        }
        _ => None,
    };
    let years_since_publication = central_year
        .zip(cite_years.iter().max().copied())
        .map(|(year, latest)| latest - year);

    TemporalStats {
        central_paper_year: central_year,
        reference_years: YearSpread::of(&ref_years),
        citation_years: YearSpread::of(&cite_years),
        average_reference_age,
        years_since_publication,
    }
}

fn venue_stats(network: &CitationNetwork) -> VenueStats {
    let ref_venues = rank(network.references.iter().filter_map(|p| p.venue.as_deref()));
    let cite_venues = rank(network.citations.iter().filter_map(|p| p.venue.as_deref()));

    VenueStats {
        central_venue: network.central_paper.venue.clone(),
        reference_venue_diversity: ref_venues.len(),
        citation_venue_diversity: cite_venues.len(),
        reference_venues: ref_venues.into_iter().take(TOP_N).collect(),
        citation_venues: cite_venues.into_iter().take(TOP_N).collect(),
    }
}

fn author_stats(network: &CitationNetwork) -> AuthorStats {
    let central: Vec<String> = network
        .central_paper
        .author_names()
        .map(str::to_string)
        .collect();

    let ref_authors = rank(network.references.iter().flat_map(Paper::author_names));
    let cite_authors = rank(network.citations.iter().flat_map(Paper::author_names));

    let cite_set: HashSet<&str> = cite_authors.iter().map(|t| t.name.as_str()).collect();
    let mut potential_collaborators: Vec<String> = ref_authors
        .iter()
        .map(|t| t.name.as_str())
        .filter(|name| cite_set.contains(name) && !central.iter().any(|c| c == name))
        .map(str::to_string)
        .collect();
    potential_collaborators.sort();

    let network_size = ref_authors
        .iter()
        .chain(&cite_authors)
        .map(|t| t.name.as_str())
        .collect::<HashSet<_>>()
        .len();

    AuthorStats {
        central_authors: central,
        top_referenced_authors: ref_authors.into_iter().take(TOP_N).collect(),
        top_citing_authors: cite_authors.into_iter().take(TOP_N).collect(),
        potential_collaborators,
        author_network_size: network_size,
    }
}

fn impact_metrics(network: &CitationNetwork, weights: &ImpactWeights) -> ImpactMetrics {
    let cite_counts: Vec<u64> = network
        .citations
        .iter()
        .filter_map(|p| p.citation_count)
        .filter(|&c| c > 0)
        .collect();
    let ref_counts: Vec<u64> = network
        .references
        .iter()
        .filter_map(|p| p.citation_count)
        .filter(|&c| c > 0)
        .collect();

    ImpactMetrics {
        direct_citations: network.citations.len(),
        references_made: network.references.len(),
        citing_papers_avg_citations: mean(&cite_counts),
        referenced_papers_avg_citations: mean(&ref_counts),
        network_total_citations: cite_counts.iter().sum::<u64>()
            + ref_counts.iter().sum::<u64>()
            + network.central_paper.citation_count.unwrap_or(0),
        influence_score: influence_score(network, weights),
    }
}

/// Heuristic scalar: network size, plus a bonus per highly cited citing
/// paper and per citing paper published well after the central one.
pub fn influence_score(network: &CitationNetwork, weights: &ImpactWeights) -> f64 {
    let base = (network.citations.len() + network.references.len()) as f64;

    let highly_cited = network
        .citations
        .iter()
        .filter(|p| p.citation_count.is_some_and(|c| c > weights.highly_cited_threshold))
        .count();

    let recent_from = network.central_paper.year.unwrap_or(0) + weights.recent_offset;
    let recent = network
        .citations
        .iter()
        .filter(|p| p.year.is_some_and(|y| y >= recent_from))
        .count();

    base + highly_cited as f64 * weights.highly_cited_bonus + recent as f64 * weights.recent_bonus
}

/// Citing papers worth citing alongside the central one.
///
/// Two groups, each ranked by citation count then year and capped at
/// `limit / 2`: citing papers sharing an author with any reference, and
/// citing papers whose venue contains the central venue. The groups are
/// concatenated, deduplicated by identity and truncated to `limit`.
pub fn recommend_papers_to_cite(network: &CitationNetwork, limit: usize) -> Vec<Paper> {
    let reference_authors: HashSet<&str> =
        network.references.iter().flat_map(Paper::author_names).collect();

    let mut by_author: Vec<&Paper> = network
        .citations
        .iter()
        .filter(|p| p.author_names().any(|a| reference_authors.contains(a)))
        .collect();
    sort_by_impact(&mut by_author);

    let mut by_venue: Vec<&Paper> = match network.central_paper.venue.as_deref() {
        Some(venue) => {
            let venue = venue.to_lowercase();
            network
                .citations
                .iter()
                .filter(|p| {
                    p.venue
                        .as_deref()
                        .is_some_and(|v| v.to_lowercase().contains(&venue))
                })
                .collect()
        }
        None => Vec::new(),
    };
    sort_by_impact(&mut by_venue);

    let mut seen = HashSet::new();
    by_author
        .into_iter()
        .take(limit / 2)
        .chain(by_venue.into_iter().take(limit / 2))
        .filter(|p| seen.insert(p.identity()))
        .take(limit)
        .cloned()
        .collect()
}

/// Authors citing the central paper at least twice, excluding its own authors
pub fn find_potential_collaborators(network: &CitationNetwork) -> Vec<Collaborator> {
    let central: HashSet<&str> = network.central_paper.author_names().collect();

    let mut order: Vec<&str> = Vec::new();
    let mut papers: HashMap<&str, Vec<&Paper>> = HashMap::new();
    for cite in &network.citations {
        for name in cite.author_names().filter(|n| !central.contains(n)) {
            papers
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push(cite);
        }
    }

    let mut ranked: Vec<(&str, &Vec<&Paper>)> = order
        .iter()
        .filter_map(|name| papers.get(name).map(|p| (*name, p)))
        .collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    ranked
        .into_iter()
        .take(MAX_COLLABORATOR_CANDIDATES)
        .filter(|(_, list)| list.len() >= 2)
        .filter_map(|(name, list)| {
            // first paper wins among equal years
            let recent = list.iter().copied().reduce(|best, p| {
                if p.year.unwrap_or(0) > best.year.unwrap_or(0) {
                    p
                } else {
                    best
                }
            })?;
            let venues: BTreeSet<String> = list.iter().filter_map(|p| p.venue.clone()).collect();

            Some(Collaborator {
                name: name.to_string(),
                papers_count: list.len(),
                recent_paper: recent.clone(),
                total_citations: list.iter().map(|p| p.citation_count.unwrap_or(0)).sum(),
                venues: venues.into_iter().collect(),
            })
        })
        .collect()
}

/// Frequency table, most frequent first; ties keep first-seen order
pub(crate) fn rank<'a>(names: impl Iterator<Item = &'a str>) -> Vec<Tally> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<Tally> = Vec::new();

    for name in names {
        match index.get(name) {
            Some(&i) => tallies[i].count += 1,
            None => {
                index.insert(name, tallies.len());
                tallies.push(Tally {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies
}

/// Citation count desc, then year desc
fn sort_by_impact(papers: &mut [&Paper]) {
    papers.sort_by(|a, b| {
        (b.citation_count.unwrap_or(0), b.year.unwrap_or(0))
            .cmp(&(a.citation_count.unwrap_or(0), a.year.unwrap_or(0)))
    });
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str, year: i32) -> Paper {
        Paper::new(title).expect("valid title").with_year(year)
    }

    fn scenario() -> CitationNetwork {
        let central = paper("Central", 2020)
            .with_authors(["Alice"])
            .with_venue("ICSE")
            .with_citation_count(10);
        let references = vec![
            paper("R1", 2015).with_authors(["Bob", "Carol"]).with_venue("FSE"),
            paper("R2", 2016).with_authors(["Bob"]).with_venue("ICSE"),
            paper("R3", 2017).with_authors(["Alice", "Dan"]).with_venue("FSE"),
        ];
        let citations = vec![
            paper("C1", 2021)
                .with_authors(["Carol", "Eve"])
                .with_venue("ICSE 2021")
                .with_citation_count(60),
            paper("C2", 2022)
                .with_authors(["Eve", "Alice", "Dan"])
                .with_venue("TSE")
                .with_citation_count(5),
        ];
        CitationNetwork::new(central, references, citations)
    }

    #[test]
    fn test_temporal_scenario() {
        let report = analyze(&scenario(), &ImpactWeights::default());
        let temporal = report.temporal_analysis;

        assert_eq!(temporal.average_reference_age, Some(4.0));
        assert_eq!(temporal.years_since_publication, Some(2));
        assert_eq!(temporal.reference_years.range, Some((2015, 2017)));
        assert_eq!(temporal.citation_years.count, 2);
    }

    #[test]
    fn test_network_stats_and_ratio() {
        let report = analyze(&scenario(), &ImpactWeights::default());
        assert_eq!(report.network_stats.total_papers, 6);
        assert!((report.network_stats.citation_ratio - 2.0 / 3.0).abs() < 1e-9);

        let lonely = CitationNetwork::new(
            paper("Central", 2020),
            Vec::new(),
            vec![paper("C1", 2021), paper("C2", 2021)],
        );
        let report = analyze(&lonely, &ImpactWeights::default());
        assert_eq!(report.network_stats.citation_ratio, 2.0);
        assert!(report.temporal_analysis.average_reference_age.is_none());
    }

    #[test]
    fn test_undated_central_paper() {
        let mut network = scenario();
        network.central_paper.year = None;
        let temporal = analyze(&network, &ImpactWeights::default()).temporal_analysis;
        assert!(temporal.average_reference_age.is_none());
        assert!(temporal.years_since_publication.is_none());
    }

    #[test]
    fn test_venue_ranking_keeps_first_seen_ties() {
        let report = analyze(&scenario(), &ImpactWeights::default());
        let venues = report.venue_analysis;

        assert_eq!(venues.reference_venues[0], Tally { name: "FSE".into(), count: 2 });
        assert_eq!(venues.reference_venue_diversity, 2);
        let names: Vec<&str> = venues.citation_venues.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ICSE 2021", "TSE"]);
    }

    #[test]
    fn test_author_stats_exclude_central_authors() {
        let authors = analyze(&scenario(), &ImpactWeights::default()).author_analysis;

        assert_eq!(authors.top_referenced_authors[0].name, "Bob");
        // Alice is on both sides but is a central author
        assert_eq!(authors.potential_collaborators, vec!["Carol", "Dan"]);
        assert_eq!(authors.author_network_size, 5);
    }

    #[test]
    fn test_influence_score() {
        let network = scenario();
        // 5 papers, one citer above 50, one citer at central year + 2
        let score = influence_score(&network, &ImpactWeights::default());
        assert!((score - (5.0 + 2.0 + 0.5)).abs() < 1e-9);

        let metrics = analyze(&network, &ImpactWeights::default()).impact_metrics;
        assert_eq!(metrics.citing_papers_avg_citations, 32.5);
        assert_eq!(metrics.referenced_papers_avg_citations, 0.0);
        assert_eq!(metrics.network_total_citations, 75);
    }

    #[test]
    fn test_recommendations() {
        let network = scenario();
        let picks = recommend_papers_to_cite(&network, 4);
        let titles: Vec<&str> = picks.iter().map(|p| p.title.as_str()).collect();
        // C1 qualifies twice (shares Carol, venue contains ICSE) but appears once
        assert_eq!(titles, vec!["C1", "C2"]);

        assert_eq!(recommend_papers_to_cite(&network, 2).len(), 1);
        assert!(recommend_papers_to_cite(&network, 0).is_empty());
    }

    #[test]
    fn test_potential_collaborators() {
        let collaborators = find_potential_collaborators(&scenario());
        assert_eq!(collaborators.len(), 1);

        let eve = &collaborators[0];
        assert_eq!(eve.name, "Eve");
        assert_eq!(eve.papers_count, 2);
        assert_eq!(eve.recent_paper.title, "C2");
        assert_eq!(eve.total_citations, 65);
        assert_eq!(eve.venues, vec!["ICSE 2021", "TSE"]);
    }
}
