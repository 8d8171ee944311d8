//! Output files: scraped paper lists, citation networks and graph exports.
//!
//! Everything lives flat in one output directory. Paper lists are written as
//! JSON (`{scraped_at, total_papers, papers}`), CSV or BibTeX.

use crate::config::ScraperConfig;
use crate::error::{PaperError, Result};
use crate::paper::{CitationNetwork, Paper};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Bibtex,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Bibtex => "bib",
        }
    }
}

/// JSON document written for a paper list
#[derive(Debug, Serialize)]
struct PaperFile<'a> {
    scraped_at: String,
    total_papers: usize,
    papers: &'a [Paper],
}

/// One CSV row; list fields are joined with `"; "`
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    authors: String,
    year: Option<i32>,
    venue: &'a str,
    venue_type: &'a str,
    track_type: &'a str,
    #[serde(rename = "abstract")]
    abstract_text: String,
    keywords: String,
    doi: &'a str,
    url: &'a str,
    pdf_url: &'a str,
    pages: &'a str,
    citation_count: Option<u64>,
    references: String,
    cited_by: String,
    scraped_at: String,
}

impl<'a> From<&'a Paper> for CsvRow<'a> {
    fn from(p: &'a Paper) -> Self {
        let text = |v: &'a Option<String>| v.as_deref().unwrap_or_default();
        Self {
            title: &p.title,
            authors: p.author_names().collect::<Vec<_>>().join("; "),
            year: p.year,
            venue: text(&p.venue),
            venue_type: text(&p.venue_type),
            track_type: text(&p.track_type),
            abstract_text: p
                .abstract_text
                .as_deref()
                .unwrap_or_default()
                .replace(['\n', '\r'], " "),
            keywords: p.keywords.join("; "),
            doi: text(&p.doi),
            url: text(&p.url),
            pdf_url: text(&p.pdf_url),
            pages: text(&p.pages),
            citation_count: p.citation_count,
            references: p.references.join("; "),
            cited_by: p.cited_by.join("; "),
            scraped_at: p.scraped_at.to_rfc3339(),
        }
    }
}

/// Saved citation network, with its derived graph alongside
#[derive(Debug, Serialize)]
struct NetworkFile<'a> {
    #[serde(flatten)]
    network: &'a CitationNetwork,
    total_papers: usize,
    citation_graph: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Central,
    Reference,
    Citation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub citations: Option<u64>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// `references` (central -> reference) or `cites` (citation -> central)
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub central_paper: String,
    pub total_papers: usize,
    pub total_edges: usize,
}

/// Node/edge view of a citation network for graph tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub metadata: GraphMetadata,
}

impl CitationGraph {
    pub fn from_network(network: &CitationNetwork) -> Self {
        let node = |p: &Paper, kind: NodeKind| GraphNode {
            id: p.identity(),
            title: p.title.clone(),
            year: p.year,
            citations: p.citation_count,
            kind,
        };

        let central = &network.central_paper;
        let central_id = central.identity();
        let mut nodes = vec![node(central, NodeKind::Central)];
        let mut edges = Vec::new();

        for reference in &network.references {
            nodes.push(node(reference, NodeKind::Reference));
            edges.push(GraphEdge {
                source: central_id.clone(),
                target: reference.identity(),
                kind: "references".to_string(),
            });
        }
        for citation in &network.citations {
            nodes.push(node(citation, NodeKind::Citation));
            edges.push(GraphEdge {
                source: citation.identity(),
                target: central_id.clone(),
                kind: "cites".to_string(),
            });
        }

        let metadata = GraphMetadata {
            central_paper: central.title.clone(),
            total_papers: nodes.len(),
            total_edges: edges.len(),
        };
        Self {
            nodes,
            edges,
            metadata,
        }
    }
}

pub struct Storage {
    output_dir: PathBuf,
}

impl Storage {
    /// Open (and create) an output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Self::new(&config.output_dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `papers` to `<output_dir>/<name>.<ext>` and return the path
    pub fn save_papers(&self, papers: &[Paper], name: &str, format: OutputFormat) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(format!("{}.{}", file_stem(name), format.extension()));

        match format {
            OutputFormat::Json => {
                let doc = PaperFile {
                    scraped_at: Local::now().to_rfc3339(),
                    total_papers: papers.len(),
                    papers,
                };
                fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
            }
            OutputFormat::Csv => {
                let mut wtr = csv::WriterBuilder::new()
                    .has_headers(true)
                    .quote_style(csv::QuoteStyle::Always)
                    .from_path(&path)?;
                for paper in papers {
                    wtr.serialize(CsvRow::from(paper))?;
                }
                wtr.flush()?;
            }
            OutputFormat::Bibtex => {
                let mut out = format!(
                    "% BibTeX entries generated on {}\n% Total papers: {}\n\n",
                    Local::now().to_rfc3339(),
                    papers.len()
                );
                for paper in papers {
                    out.push_str(&paper.to_bibtex());
                    out.push_str("\n\n");
                }
                fs::write(&path, out)?;
            }
        }

        info!(path = %path.display(), papers = papers.len(), "Saved papers");
        Ok(path)
    }

    /// Raw paper objects from a JSON file: either a bare list or a document
    /// with a `papers` key.
    pub fn load_papers(&self, path: &Path) -> Result<Vec<Value>> {
        let content = fs::read_to_string(path)?;
        match serde_json::from_str(&content)? {
            Value::Array(papers) => Ok(papers),
            Value::Object(mut doc) => match doc.remove("papers") {
                Some(Value::Array(papers)) => Ok(papers),
                Some(_) => Err(PaperError::Parse(format!(
                    "{}: `papers` is not a list",
                    path.display()
                ))),
                None => Ok(Vec::new()),
            },
            _ => Err(PaperError::Parse(format!(
                "{}: expected a list or an object with `papers`",
                path.display()
            ))),
        }
    }

    /// Typed variant of [`Storage::load_papers`]; entries that do not parse
    /// as papers are skipped
    pub fn load_paper_records(&self, path: &Path) -> Result<Vec<Paper>> {
        let raw = self.load_papers(path)?;
        let total = raw.len();
        let papers: Vec<Paper> = raw
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if papers.len() < total {
            debug!(path = %path.display(), skipped = total - papers.len(), "Skipped malformed papers");
        }
        Ok(papers)
    }

    /// Resolve a bare file name inside the output directory
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(PaperError::Validation(format!("invalid file name: {:?}", name)));
        }
        Ok(self.output_dir.join(name))
    }

    /// Save a network as `<name>_citation_network.json`
    pub fn save_network(&self, network: &CitationNetwork, name: &str) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(format!("{}_citation_network.json", file_stem(name)));
        let doc = NetworkFile {
            network,
            total_papers: network.total_papers(),
            citation_graph: network.citation_graph(),
        };
        fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
        info!(path = %path.display(), "Saved citation network");
        Ok(path)
    }

    pub fn load_network(&self, name: &str) -> Result<CitationNetwork> {
        let path = self
            .output_dir
            .join(format!("{}_citation_network.json", file_stem(name)));
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Export the node/edge graph as `citation_graph_<central id>.json`
    pub fn export_graph(&self, network: &CitationNetwork) -> Result<PathBuf> {
        let graph = CitationGraph::from_network(network);
        let path = self.output_dir.join(format!(
            "citation_graph_{}.json",
            file_stem(&network.central_paper.identity())
        ));
        fs::write(&path, serde_json::to_string_pretty(&graph)?)?;
        info!(path = %path.display(), nodes = graph.nodes.len(), "Exported citation graph");
        Ok(path)
    }

    /// File names in the output directory, sorted
    pub fn list_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// File-system safe stem
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
