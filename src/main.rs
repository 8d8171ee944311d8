//! paperhelper - conference paper inventory and citation analysis
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! paperhelper scrape SANER --years 2015 2020 --format csv
//! paperhelper citations "Attention Is All You Need" --max-papers 50
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! paperhelper serve --port 3000
//! ```

use anyhow::{bail, Context, Result};
use axum::{
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::{Parser, Subcommand};
use paperhelper::{
    analysis,
    cookies::{CookieJar, CookieStore},
    filters::{self, CollectionStats, PaperFilter, SearchField},
    history::Field,
    orchestrator::ConferenceTimeline,
    storage::{OutputFormat, Storage},
    CitationAggregator, HistoricalScraper, PaperError, ScraperConfig, SourceRouter,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Conference paper inventory with historical venue resolution
#[derive(Parser)]
#[command(name = "paperhelper")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Proxy URL (e.g., http://127.0.0.1:7890)
    #[arg(long, global = true)]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalogued conferences
    Conferences {
        /// Only this field: SE, AI_ML or NLP
        #[arg(long)]
        field: Option<String>,
    },

    /// Scrape one conference for a year or a year range
    Scrape {
        conference: String,

        #[arg(long, conflicts_with = "years")]
        year: Option<i32>,

        /// Inclusive range
        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        years: Option<Vec<i32>>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Scrape every catalogued conference for one year
    ScrapeAll {
        #[arg(long)]
        year: i32,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Show a conference's venue history
    Timeline { conference: String },

    /// Check which years the primary venue answers for
    Validate {
        conference: String,

        #[arg(long, default_value = "2009")]
        start: i32,

        #[arg(long, default_value = "2024")]
        end: i32,
    },

    /// Search a saved paper file
    Search {
        query: String,

        /// File name inside the output directory
        #[arg(long)]
        file: String,

        /// Also match author names
        #[arg(long)]
        authors: bool,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Collection statistics for a saved paper file
    Stats {
        /// File name inside the output directory
        #[arg(long)]
        file: String,

        #[arg(long, default_value = "10")]
        top_authors: usize,

        #[arg(long, default_value = "20")]
        top_keywords: usize,
    },

    /// Filter a saved paper file, optionally saving the result
    Filter {
        /// File name inside the output directory
        #[arg(long)]
        file: String,

        #[command(flatten)]
        criteria: PaperFilter,

        /// Save the matches under this name
        #[arg(long)]
        save: Option<String>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Papers in a saved file whose abstracts resemble a given paper's
    Similar {
        /// Title of the reference paper, which must be in the file
        title: String,

        #[arg(long)]
        file: String,

        #[arg(long, default_value = "0.3")]
        threshold: f64,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Build and analyze a paper's citation network
    Citations {
        title: String,

        #[arg(long, default_value = "50")]
        max_papers: usize,

        /// Skip Google Scholar
        #[arg(long)]
        no_scholar: bool,

        /// Save the network and its graph export
        #[arg(long)]
        save: bool,
    },

    /// Suggest papers to cite and potential collaborators
    Recommend {
        title: String,

        #[arg(long, default_value = "50")]
        max_papers: usize,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Analyze a citation network saved by `citations --save`
    Analyze {
        /// Network name, as printed when it was saved
        name: String,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Run the JSON API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage Google Scholar cookies
    Cookies {
        #[command(subcommand)]
        action: CookieAction,
    },
}

#[derive(Subcommand)]
enum CookieAction {
    /// Clear stored cookies
    Clear,
    /// Show cookie file path
    Path,
    /// Import a browser cookie export (JSON list or cookies.txt)
    Import { file: PathBuf },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    let mut config = ScraperConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if cli.proxy.is_some() {
        config.proxy = cli.proxy;
    }

    match cli.command {
        Commands::Conferences { field } => list_conferences(field.as_deref()),
        Commands::Scrape {
            conference,
            year,
            years,
            format,
        } => run_scrape(&config, &conference, year, years, format).await,
        Commands::ScrapeAll { year, format } => run_scrape_all(&config, year, format).await,
        Commands::Timeline { conference } => {
            let scraper = HistoricalScraper::new(SourceRouter::from_config(&config)?);
            print_json(&scraper.conference_timeline(&conference)?)
        }
        Commands::Validate {
            conference,
            start,
            end,
        } => {
            let scraper = HistoricalScraper::new(SourceRouter::from_config(&config)?);
            for (year, available) in scraper.validate_availability(&conference, start, end).await {
                println!("{} {}: {}", conference, year, if available { "ok" } else { "unavailable" });
            }
            Ok(())
        }
        Commands::Search {
            query,
            file,
            authors,
            limit,
        } => run_search(&config, &query, &file, authors, limit),
        Commands::Stats {
            file,
            top_authors,
            top_keywords,
        } => {
            let storage = Storage::from_config(&config)?;
            let papers = storage.load_paper_records(&storage.resolve(&file)?)?;
            print_json(&CollectionStats::from_papers(&papers, top_authors, top_keywords))
        }
        Commands::Filter {
            file,
            criteria,
            save,
            format,
        } => run_filter(&config, &file, &criteria, save.as_deref(), format),
        Commands::Similar {
            title,
            file,
            threshold,
            limit,
        } => run_similar(&config, &title, &file, threshold, limit),
        Commands::Citations {
            title,
            max_papers,
            no_scholar,
            save,
        } => run_citations(&config, &title, max_papers, !no_scholar, save).await,
        Commands::Recommend {
            title,
            max_papers,
            limit,
        } => run_recommend(&config, &title, max_papers, limit).await,
        Commands::Analyze { name, limit } => run_analyze(&config, &name, limit),
        Commands::Serve { port, host } => run_server(config, host, port).await,
        Commands::Cookies { action } => handle_cookies(&config, action),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Scraping
// ============================================================================

#[derive(Serialize)]
struct ConferenceSummary {
    name: &'static str,
    full_name: &'static str,
    field: Field,
    predecessors: &'static [&'static str],
}

fn conference_summaries(field: Option<&str>) -> Vec<ConferenceSummary> {
    paperhelper::VenueCatalog::builtin()
        .records()
        .iter()
        .filter(|r| field.map_or(true, |f| r.field.label().eq_ignore_ascii_case(f)))
        .map(|r| ConferenceSummary {
            name: r.name,
            full_name: r.full_name,
            field: r.field,
            predecessors: r.predecessors,
        })
        .collect()
}

fn list_conferences(field: Option<&str>) -> Result<()> {
    for conf in conference_summaries(field) {
        let history = if conf.predecessors.is_empty() {
            String::new()
        } else {
            format!(" (formerly {})", conf.predecessors.join(", "))
        };
        println!("{:<8} {:<6} {}{}", conf.name, conf.field.label(), conf.full_name, history);
    }
    Ok(())
}

async fn run_scrape(
    config: &ScraperConfig,
    conference: &str,
    year: Option<i32>,
    years: Option<Vec<i32>>,
    format: OutputFormat,
) -> Result<()> {
    let scraper = HistoricalScraper::new(SourceRouter::from_config(config)?);
    let storage = Storage::from_config(config)?;
    let name = conference.to_uppercase();

    match (year, years.as_deref()) {
        (Some(year), None) => {
            let report = scraper.scrape_year(conference, year).await?;
            if report.below_expected() {
                warn!(
                    conference = %name,
                    year = year,
                    found = report.papers().len(),
                    expected = report.expected_minimum,
                    "Fewer papers than expected"
                );
            }
            if report.papers().is_empty() {
                println!("{} {}: no papers ({:?})", name, year, report.outcome);
                return Ok(());
            }
            let path = storage.save_papers(report.papers(), &format!("{}_{}", name, year), format)?;
            println!("Saved {} papers to {}", report.papers().len(), path.display());
        }
        (None, Some(&[start, end])) => {
            for (year, papers) in scraper.scrape_papers_range(conference, start, end).await {
                if papers.is_empty() {
                    println!("{} {}: no papers", name, year);
                    continue;
                }
                let path = storage.save_papers(&papers, &format!("{}_{}", name, year), format)?;
                println!("{} {}: {} papers -> {}", name, year, papers.len(), path.display());
            }
        }
        _ => bail!("Specify --year YEAR or --years START END"),
    }
    Ok(())
}

async fn run_scrape_all(config: &ScraperConfig, year: i32, format: OutputFormat) -> Result<()> {
    let scraper = HistoricalScraper::new(SourceRouter::from_config(config)?);
    let storage = Storage::from_config(config)?;

    let mut total = 0;
    for (name, papers) in scraper.scrape_all_conferences(year).await {
        if papers.is_empty() {
            println!("{:<8} none", name);
            continue;
        }
        total += papers.len();
        let path = storage.save_papers(&papers, &format!("{}_{}", name, year), format)?;
        println!("{:<8} {:>5} -> {}", name, papers.len(), path.display());
    }
    info!(year = year, total = total, "Scraped all conferences");
    Ok(())
}

fn run_search(config: &ScraperConfig, query: &str, file: &str, authors: bool, limit: usize) -> Result<()> {
    let storage = Storage::from_config(config)?;
    let papers = storage.load_paper_records(&storage.resolve(file)?)?;

    let mut fields = SearchField::DEFAULT.to_vec();
    if authors {
        fields.push(SearchField::Authors);
    }

    let hits = filters::search(&papers, query, &fields);
    println!("{} matches for {:?} in {} papers", hits.len(), query, papers.len());
    for hit in hits.iter().take(limit) {
        println!(
            "{:>6.1}  {}  {}",
            hit.score,
            hit.paper.year.map(|y| y.to_string()).unwrap_or_default(),
            hit.paper.title
        );
    }
    Ok(())
}

fn run_filter(
    config: &ScraperConfig,
    file: &str,
    criteria: &PaperFilter,
    save: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let storage = Storage::from_config(config)?;
    let papers = storage.load_paper_records(&storage.resolve(file)?)?;
    let kept = criteria.apply(&papers)?;
    println!("{} of {} papers match", kept.len(), papers.len());

    match save {
        Some(name) => {
            let kept: Vec<_> = kept.into_iter().cloned().collect();
            let path = storage.save_papers(&kept, name, format)?;
            println!("Saved to {}", path.display());
        }
        None => {
            for paper in kept {
                println!(
                    "  [{}] {}",
                    paper.year.map(|y| y.to_string()).unwrap_or_else(|| "----".to_string()),
                    paper.title
                );
            }
        }
    }
    Ok(())
}

fn run_similar(config: &ScraperConfig, title: &str, file: &str, threshold: f64, limit: usize) -> Result<()> {
    let storage = Storage::from_config(config)?;
    let papers = storage.load_paper_records(&storage.resolve(file)?)?;
    let Some(reference) = papers.iter().find(|p| p.title.eq_ignore_ascii_case(title.trim())) else {
        bail!("{:?} is not in {}", title, file);
    };
    if reference.abstract_text.is_none() {
        warn!(title = %reference.title, "Reference paper has no abstract");
    }

    for hit in filters::search_similar(&papers, reference, threshold).iter().take(limit) {
        println!("{:>5.2}  {}", hit.score, hit.paper.title);
    }
    Ok(())
}

// ============================================================================
// Citations
// ============================================================================

/// Stored Scholar cookies; a broken jar is logged and ignored
fn scholar_cookies(config: &ScraperConfig) -> CookieJar {
    match CookieStore::from_config(config).and_then(|store| store.load()) {
        Ok(jar) => jar,
        Err(e) => {
            warn!(error = %e, "Ignoring cookie jar");
            CookieJar::default()
        }
    }
}

async fn run_citations(
    config: &ScraperConfig,
    title: &str,
    max_papers: usize,
    use_scholar: bool,
    save: bool,
) -> Result<()> {
    let aggregator = CitationAggregator::from_config(config, &scholar_cookies(config))?;
    let Some(network) = aggregator
        .get_enriched_citation_network(title, max_papers, use_scholar)
        .await
    else {
        bail!("Paper not found: {}", title);
    };

    print_json(&analysis::analyze(&network, &config.impact))?;

    if save {
        let storage = Storage::from_config(config)?;
        let name = network.central_paper.identity();
        let saved = storage.save_network(&network, &name)?;
        let graph = storage.export_graph(&network)?;
        println!("Saved network {:?} to {}", name, saved.display());
        println!("Saved graph to {}", graph.display());
    }
    Ok(())
}

async fn run_recommend(config: &ScraperConfig, title: &str, max_papers: usize, limit: usize) -> Result<()> {
    let aggregator = CitationAggregator::from_config(config, &scholar_cookies(config))?;
    let Some(network) = aggregator
        .get_enriched_citation_network(title, max_papers, true)
        .await
    else {
        bail!("Paper not found: {}", title);
    };

    println!("Papers to cite:");
    for paper in analysis::recommend_papers_to_cite(&network, limit) {
        println!(
            "  [{}] {} ({} citations)",
            paper.year.map(|y| y.to_string()).unwrap_or_else(|| "----".to_string()),
            paper.title,
            paper.citation_count.unwrap_or(0)
        );
    }

    println!("Potential collaborators:");
    for c in analysis::find_potential_collaborators(&network) {
        println!(
            "  {} - {} citing papers, {} citations, latest: {}",
            c.name, c.papers_count, c.total_citations, c.recent_paper.title
        );
    }
    Ok(())
}

fn run_analyze(config: &ScraperConfig, name: &str, limit: usize) -> Result<()> {
    let storage = Storage::from_config(config)?;
    let network = storage
        .load_network(name)
        .with_context(|| format!("No saved network named {:?}", name))?;

    print_json(&analysis::analyze(&network, &config.impact))?;
    println!("Papers to cite:");
    for paper in analysis::recommend_papers_to_cite(&network, limit) {
        println!("  {}", paper.title);
    }
    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(config: ScraperConfig, host: String, port: u16) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let app_state = Arc::new(AppState {
        scraper: HistoricalScraper::new(SourceRouter::from_config(&config)?),
        storage: Storage::from_config(&config)?,
    });

    let app = router(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

struct AppState {
    scraper: HistoricalScraper<SourceRouter>,
    storage: Storage,
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/conferences", get(conferences_handler))
        .route("/api/timeline/{conference}", get(timeline_handler))
        .route("/api/files", get(files_handler))
        .route("/api/papers/{file}", get(papers_handler))
        .route("/api/search/{file}", get(search_handler))
        .route("/api/filter/{file}", get(filter_handler))
        .route("/api/statistics/{file}", get(statistics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON error body with a status derived from the error kind
struct ApiError(PaperError);

impl From<PaperError> for ApiError {
    fn from(e: PaperError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PaperError::UnknownConference(_) | PaperError::NoVenueMapping { .. } => StatusCode::NOT_FOUND,
            PaperError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            PaperError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

async fn conferences_handler() -> Json<Vec<ConferenceSummary>> {
    Json(conference_summaries(None))
}

async fn timeline_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(conference): UrlPath<String>,
) -> ApiResult<ConferenceTimeline> {
    Ok(Json(state.scraper.conference_timeline(&conference)?))
}

async fn files_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    Ok(Json(state.storage.list_files()?))
}

async fn papers_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(file): UrlPath<String>,
) -> ApiResult<Vec<serde_json::Value>> {
    let path = state.storage.resolve(&file)?;
    Ok(Json(state.storage.load_papers(&path)?))
}

/// Search query string
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    total: usize,
    results: Vec<serde_json::Value>,
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(file): UrlPath<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult<SearchResponse> {
    info!(file = %file, query = %params.q, "Search request");

    let path = state.storage.resolve(&file)?;
    let papers = state.storage.load_paper_records(&path)?;
    let hits = filters::search(&papers, &params.q, &SearchField::DEFAULT);

    let results = hits
        .iter()
        .take(params.limit)
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(PaperError::from)?;

    Ok(Json(SearchResponse {
        query: params.q,
        total: hits.len(),
        results,
    }))
}

#[derive(Serialize)]
struct FilterResponse {
    total: usize,
    papers: Vec<paperhelper::Paper>,
}

async fn filter_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(file): UrlPath<String>,
    Query(criteria): Query<PaperFilter>,
) -> ApiResult<FilterResponse> {
    let papers = state.storage.load_paper_records(&state.storage.resolve(&file)?)?;
    let kept: Vec<_> = criteria.apply(&papers)?.into_iter().cloned().collect();
    Ok(Json(FilterResponse {
        total: kept.len(),
        papers: kept,
    }))
}

async fn statistics_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(file): UrlPath<String>,
) -> ApiResult<CollectionStats> {
    let papers = state.storage.load_paper_records(&state.storage.resolve(&file)?)?;
    Ok(Json(CollectionStats::from_papers(&papers, 10, 20)))
}

// ============================================================================
// Cookie Management
// ============================================================================

fn handle_cookies(config: &ScraperConfig, action: CookieAction) -> Result<()> {
    let store = CookieStore::from_config(config)?;

    match action {
        CookieAction::Clear => {
            if store.clear()? {
                println!("Cookies cleared.");
            } else {
                println!("No cookies stored.");
            }
        }
        CookieAction::Path => {
            println!("Cookie file: {}", store.path().display());
        }
        CookieAction::Import { file } => {
            let jar = store
                .import(&file)
                .with_context(|| format!("Failed to import cookies from {}", file.display()))?;
            println!("Imported {} Google cookies to {}", jar.len(), store.path().display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use paperhelper::Paper;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn state(dir: &std::path::Path) -> anyhow::Result<Arc<AppState>> {
        let config = ScraperConfig {
            output_dir: dir.to_path_buf(),
            ..ScraperConfig::default()
        };
        Ok(Arc::new(AppState {
            scraper: HistoricalScraper::new(SourceRouter::from_config(&config)?),
            storage: Storage::from_config(&config)?,
        }))
    }

    async fn get_json(app: Router, uri: &str) -> anyhow::Result<(StatusCode, serde_json::Value)> {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    #[test]
    fn test_cli_parses_year_range() {
        let cli = Cli::try_parse_from(["paperhelper", "scrape", "SANER", "--years", "2015", "2020"])
            .expect("valid args");
        match cli.command {
            Commands::Scrape { years, year, .. } => {
                assert_eq!(years, Some(vec![2015, 2020]));
                assert!(year.is_none());
            }
            _ => panic!("expected scrape"),
        }

        assert!(Cli::try_parse_from(["paperhelper", "scrape", "ICSE", "--year", "2020", "--years", "1", "2"]).is_err());
    }

    #[test]
    fn test_conference_summaries_filter_by_field() {
        let nlp = conference_summaries(Some("nlp"));
        assert!(!nlp.is_empty());
        assert!(nlp.iter().all(|c| c.field == Field::NaturalLanguage));
        assert!(conference_summaries(None).len() > nlp.len());
    }

    #[tokio::test]
    async fn test_api_timeline_and_errors() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let app = router(state(dir.path())?);

        let (status, body) = get_json(app.clone(), "/api/timeline/SANER").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_name"], "SANER");
        assert_eq!(body["available_years"][0], 2015);

        let (status, body) = get_json(app.clone(), "/api/timeline/NOPE").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let (status, _) = get_json(app, "/api/papers/missing.json").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_api_files_papers_and_search() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let state = state(dir.path())?;
        let papers = vec![
            Paper::new("Neural Program Repair")?.with_year(2020),
            Paper::new("Fuzzing Compilers")?.with_year(2021),
        ];
        state.storage.save_papers(&papers, "ICSE_2020", OutputFormat::Json)?;
        let app = router(state);

        let (_, files) = get_json(app.clone(), "/api/files").await?;
        assert_eq!(files, serde_json::json!(["ICSE_2020.json"]));

        let (_, loaded) = get_json(app.clone(), "/api/papers/ICSE_2020.json").await?;
        assert_eq!(loaded.as_array().map(Vec::len), Some(2));

        let (status, found) = get_json(app, "/api/search/ICSE_2020.json?q=repair").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["total"], 1);
        assert_eq!(found["results"][0]["paper"]["title"], "Neural Program Repair");
        Ok(())
    }

    #[tokio::test]
    async fn test_api_filter_and_statistics() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let state = state(dir.path())?;
        let papers = vec![
            Paper::new("Neural Program Repair")?
                .with_year(2020)
                .with_authors(["Ada Lovelace"])
                .with_citation_count(12),
            Paper::new("Fuzzing Compilers")?
                .with_year(2021)
                .with_authors(["Ada Lovelace", "Alan Turing"]),
        ];
        state.storage.save_papers(&papers, "ICSE", OutputFormat::Json)?;
        let app = router(state);

        let (status, found) = get_json(app.clone(), "/api/filter/ICSE.json?from_year=2021&author=turing").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["total"], 1);
        assert_eq!(found["papers"][0]["title"], "Fuzzing Compilers");

        let (status, _) = get_json(app.clone(), "/api/filter/ICSE.json?regex=(").await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, stats) = get_json(app, "/api/statistics/ICSE.json").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total_papers"], 2);
        assert_eq!(stats["top_authors"][0]["name"], "Ada Lovelace");
        assert_eq!(stats["top_authors"][0]["count"], 2);
        assert_eq!(stats["citations"]["total_citations"], 12);
        Ok(())
    }

    #[test]
    fn test_cli_parses_filter_criteria() {
        let cli = Cli::try_parse_from([
            "paperhelper", "filter", "--file", "ICSE_2020.json", "--venue", "icse", "--has-pdf",
            "--min-citations", "5", "--save", "icse_pdfs",
        ])
        .expect("valid args");
        match cli.command {
            Commands::Filter { criteria, save, .. } => {
                assert_eq!(criteria.venue.as_deref(), Some("icse"));
                assert!(criteria.has_pdf);
                assert!(!criteria.has_doi);
                assert_eq!(criteria.min_citations, Some(5));
                assert_eq!(save.as_deref(), Some("icse_pdfs"));
            }
            _ => panic!("expected filter"),
        }
    }

    #[test]
    fn test_analyze_reads_saved_network() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = ScraperConfig {
            output_dir: dir.path().to_path_buf(),
            ..ScraperConfig::default()
        };
        let central = Paper::new("Central Paper")?.with_year(2018);
        let network = paperhelper::CitationNetwork::new(
            central,
            vec![],
            vec![Paper::new("Citing Paper")?.with_year(2020)],
        );
        Storage::from_config(&config)?.save_network(&network, "central")?;

        run_analyze(&config, "central", 5)?;
        assert!(run_analyze(&config, "missing", 5).is_err());
        Ok(())
    }
}
