//! DBLP proceedings feed fetcher.
//!
//! DBLP publishes one XML table of contents per proceedings volume at
//! `{base}/{venue_key}/{venue_short}{year}.xml`, for example
//! `https://dblp.org/db/conf/icse/icse2020.xml`. Every `<inproceedings>`
//! record in that file becomes one [`Paper`].

use crate::config::ScraperConfig;
use crate::error::{PaperError, Result};
use crate::fetcher::PaperFetcher;
use crate::http::HttpClient;
use crate::pacing::RequestPacer;
use crate::paper::{clean_text, Paper, META_SOURCE};
use crate::resolver::VenueKey;
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, info};

/// Fetches proceedings tables of contents from DBLP
pub struct DblpFetcher {
    http: HttpClient,
    base_url: String,
}

impl DblpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml,text/xml"));
        let pacer = RequestPacer::new(config.request_delay());

        Ok(Self::with_client(
            HttpClient::new(config, pacer, headers)?,
            &config.dblp_base_url,
        ))
    }

    pub fn with_client(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn proceedings_url(&self, venue: &VenueKey, year: i32) -> String {
        format!("{}/{}/{}{}.xml", self.base_url, venue.key, venue.short, year)
    }
}

#[async_trait]
impl PaperFetcher for DblpFetcher {
    async fn fetch(&self, venue: &VenueKey, year: i32) -> Result<Vec<Paper>> {
        let url = self.proceedings_url(venue, year);
        info!(venue_key = %venue.key, year = year, url = %url, "Fetching DBLP proceedings");

        let xml = self.http.get_text(&url, &[]).await?;
        let papers = parse_proceedings(&xml, year)?;

        debug!(venue_key = %venue.key, year = year, count = papers.len(), "Parsed DBLP proceedings");
        Ok(papers)
    }
}

/// Child elements of `<inproceedings>` we keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Author,
    Pages,
    Ee,
    Doi,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"title" => Some(Field::Title),
            b"author" => Some(Field::Author),
            b"pages" => Some(Field::Pages),
            b"ee" => Some(Field::Ee),
            b"doi" => Some(Field::Doi),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Record {
    key: Option<String>,
    title: String,
    authors: Vec<String>,
    pages: Option<String>,
    ee: Vec<String>,
    doi: Option<String>,
}

impl Record {
    fn push(&mut self, field: Field, text: String) {
        if text.is_empty() {
            return;
        }
        match field {
            Field::Title => self.title = text,
            Field::Author => self.authors.push(text),
            Field::Pages => self.pages = Some(text),
            Field::Ee => self.ee.push(text),
            Field::Doi => self.doi = Some(text),
        }
    }

    fn into_paper(self, year: i32) -> Option<Paper> {
        let mut paper = Paper::titled(self.title.trim_end_matches('.'))?
            .with_authors(self.authors)
            .with_year(year);

        paper.venue_type = Some("conference".to_string());
        paper.pages = self.pages;
        paper.doi = self.doi.or_else(|| self.ee.iter().find_map(|e| doi_from_link(e)));
        paper.url = self
            .ee
            .first()
            .cloned()
            .or_else(|| self.key.as_ref().map(|k| format!("https://dblp.org/rec/{}", k)));

        paper.set_meta(META_SOURCE, "dblp");
        if let Some(key) = self.key {
            paper.set_meta("dblp_key", key);
        }
        Some(paper)
    }
}

/// `https://doi.org/10.1145/x` -> `10.1145/x`
fn doi_from_link(link: &str) -> Option<String> {
    link.split_once("doi.org/")
        .map(|(_, doi)| doi.to_string())
        .filter(|doi| doi.starts_with("10."))
}

/// Parse a DBLP proceedings table of contents.
///
/// Records without a title are skipped. The caller's `year` is used for
/// every paper.
pub fn parse_proceedings(xml: &str, year: i32) -> Result<Vec<Paper>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();

    let mut papers = Vec::new();
    let mut record: Option<Record> = None;
    let mut field: Option<(Field, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                if name.as_ref() == b"inproceedings" {
                    let key = e
                        .attributes()
                        .flatten()
                        .find(|attr| attr.key.as_ref() == b"key")
                        .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                    record = Some(Record {
                        key,
                        ..Record::default()
                    });
                } else if record.is_some() && field.is_none() {
                    field = Field::from_tag(name.as_ref()).map(|f| (f, String::new()));
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, text)) = field.as_mut() {
                    let decoded = e
                        .unescape_with(resolve_entity)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(e).to_string());
                    text.push_str(&decoded);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                if name.as_ref() == b"inproceedings" {
                    if let Some(done) = record.take() {
                        papers.extend(done.into_paper(year));
                    }
                    field = None;
                } else if let Some((current, _)) = field {
                    if Field::from_tag(name.as_ref()) == Some(current) {
                        if let (Some((f, text)), Some(rec)) = (field.take(), record.as_mut()) {
                            rec.push(f, clean_text(&text));
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PaperError::Parse(format!(
                    "DBLP XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(papers)
}

/// Named entities the DBLP DTD declares that appear in author names
fn resolve_entity(entity: &str) -> Option<&'static str> {
    let text = match entity {
        "auml" => "ä",
        "ouml" => "ö",
        "uuml" => "ü",
        "Auml" => "Ä",
        "Ouml" => "Ö",
        "Uuml" => "Ü",
        "szlig" => "ß",
        "aacute" => "á",
        "eacute" => "é",
        "iacute" => "í",
        "oacute" => "ó",
        "uacute" => "ú",
        "Eacute" => "É",
        "agrave" => "à",
        "egrave" => "è",
        "ccedil" => "ç",
        "ntilde" => "ñ",
        "atilde" => "ã",
        "otilde" => "õ",
        "oslash" => "ø",
        "aring" => "å",
        "nbsp" => " ",
        _ => return None,
    };
    Some(text)
}
