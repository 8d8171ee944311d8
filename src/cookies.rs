//! Google Scholar session cookies.
//!
//! Scholar serves CAPTCHAs to cookie-less clients quickly, so cookies from a
//! browser session are imported once and replayed on every request. The jar
//! lives at `cookie_file` from the config, or `~/.paperhelper_cookies.json`.

use crate::config::ScraperConfig;
use crate::error::{PaperError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const COOKIE_FILE_NAME: &str = ".paperhelper_cookies.json";

/// One cookie as browser extensions export it. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
    /// Unix seconds; `None` for session cookies
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
}

impl SessionCookie {
    fn is_google(&self) -> bool {
        self.domain.contains("google")
    }

    fn is_expired(&self, now: f64) -> bool {
        self.expires.is_some_and(|t| t > 0.0 && t < now)
    }
}

/// Google cookies replayed to Scholar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieJar {
    cookies: Vec<SessionCookie>,
}

impl CookieJar {
    /// Keeps only cookies set for Google domains
    pub fn new(cookies: impl IntoIterator<Item = SessionCookie>) -> Self {
        Self {
            cookies: cookies.into_iter().filter(SessionCookie::is_google).collect(),
        }
    }

    /// Parse a browser export: a JSON cookie list or a Netscape `cookies.txt`
    pub fn parse_export(content: &str) -> Result<Self> {
        let trimmed = content.trim_start();
        let cookies = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed)?
        } else {
            parse_netscape(content)?
        };
        Ok(Self::new(cookies))
    }

    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `Cookie` header for the current time
    pub fn header(&self) -> Option<String> {
        self.header_at(Utc::now().timestamp() as f64)
    }

    /// `Cookie` header built from the cookies still valid at `now`
    pub fn header_at(&self, now: f64) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| !c.is_expired(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }
}

/// `domain  subdomains  path  secure  expires  name  value`, tab separated.
/// `#HttpOnly_` prefixed lines are cookies, other `#` lines are comments.
fn parse_netscape(content: &str) -> Result<Vec<SessionCookie>> {
    let mut cookies = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.trim().is_empty() || line.starts_with('#') => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        let [domain, _, path, _, expires, name, value] = fields[..] else {
            return Err(PaperError::Parse(format!(
                "cookies.txt line {}: expected 7 tab-separated fields, got {}",
                index + 1,
                fields.len()
            )));
        };
        let expires: f64 = expires.trim().parse().map_err(|_| {
            PaperError::Parse(format!("cookies.txt line {}: bad expiry {:?}", index + 1, expires))
        })?;

        cookies.push(SessionCookie {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: path.to_string(),
            expires: (expires > 0.0).then_some(expires),
        });
    }
    Ok(cookies)
}

#[derive(Serialize)]
struct JarFileRef<'a> {
    saved_at: String,
    cookies: &'a [SessionCookie],
}

/// Accepts the current layout and the bare list older versions wrote
#[derive(Deserialize)]
#[serde(untagged)]
enum JarFile {
    Stamped { cookies: Vec<SessionCookie> },
    Bare(Vec<SessionCookie>),
}

/// Where the jar is persisted
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        let path = match &config.cookie_file {
            Some(path) => path.clone(),
            None => dirs::home_dir()
                .map(|home| home.join(COOKIE_FILE_NAME))
                .ok_or_else(|| PaperError::Config("Cannot determine home directory".to_string()))?,
        };
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty jar; an unreadable one is an error
    pub fn load(&self) -> Result<CookieJar> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No cookie file");
            return Ok(CookieJar::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let cookies = match serde_json::from_str(&content) {
            Ok(JarFile::Stamped { cookies }) | Ok(JarFile::Bare(cookies)) => cookies,
            Err(e) => {
                return Err(PaperError::Config(format!(
                    "{}: not a cookie jar: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        Ok(CookieJar::new(cookies))
    }

    pub fn save(&self, jar: &CookieJar) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = JarFileRef {
            saved_at: Utc::now().to_rfc3339(),
            cookies: jar.cookies(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        info!(path = %self.path.display(), cookies = jar.len(), "Saved cookie jar");
        Ok(())
    }

    /// Replace the jar with the Google cookies of a browser export
    pub fn import(&self, export: &Path) -> Result<CookieJar> {
        let jar = CookieJar::parse_export(&fs::read_to_string(export)?)?;
        self.save(&jar)?;
        Ok(jar)
    }

    /// Returns whether a jar existed
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        info!(path = %self.path.display(), "Cleared cookie jar");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cookie(name: &str, domain: &str, expires: Option<f64>) -> SessionCookie {
        SessionCookie {
            name: name.to_string(),
            value: format!("{}-value", name),
            domain: domain.to_string(),
            path: "/".to_string(),
            expires,
        }
    }

    #[test]
    fn test_jar_keeps_google_cookies_and_skips_expired() {
        let jar = CookieJar::new([
            cookie("GSP", ".scholar.google.com", None),
            cookie("NID", ".google.com", Some(100.0)),
            cookie("sid", ".example.org", None),
        ]);
        assert_eq!(jar.len(), 2);
        assert_eq!(jar.header_at(50.0).as_deref(), Some("GSP=GSP-value; NID=NID-value"));
        assert_eq!(jar.header_at(200.0).as_deref(), Some("GSP=GSP-value"));
        assert_eq!(CookieJar::default().header(), None);
    }

    #[test]
    fn test_parse_json_export() -> Result<()> {
        let jar = CookieJar::parse_export(
            r#"[{"name":"NID","value":"1","domain":".google.com","httpOnly":true,"expirationDate":1999999999.5},
                {"name":"sid","value":"2","domain":".example.org"}]"#,
        )?;
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.cookies()[0].expires, Some(1999999999.5));
        Ok(())
    }

    #[test]
    fn test_parse_netscape_export() -> Result<()> {
        let export = "# Netscape HTTP Cookie File\n\n\
            .google.com\tTRUE\t/\tTRUE\t0\tNID\tabc\n\
            #HttpOnly_.scholar.google.com\tTRUE\t/\tFALSE\t1999999999\tGSP\txyz\n\
            .example.org\tTRUE\t/\tFALSE\t0\tsid\tq\n";
        let jar = CookieJar::parse_export(export)?;

        assert_eq!(jar.len(), 2);
        assert_eq!(jar.cookies()[0].expires, None);
        assert_eq!(jar.cookies()[1].name, "GSP");
        assert_eq!(jar.cookies()[1].expires, Some(1999999999.0));

        assert!(matches!(
            CookieJar::parse_export(".google.com\tTRUE\t/\n"),
            Err(PaperError::Parse(_))
        ));
        Ok(())
    }

    #[test]
    fn test_store_roundtrip_and_clear() -> Result<()> {
        let dir = tempdir()?;
        let store = CookieStore::at(dir.path().join("nested").join("jar.json"));
        assert!(store.load()?.is_empty());
        assert!(!store.clear()?);

        let jar = CookieJar::new([cookie("GSP", ".scholar.google.com", None)]);
        store.save(&jar)?;
        assert_eq!(store.load()?, jar);

        assert!(store.clear()?);
        assert!(store.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_store_reads_bare_list_and_rejects_garbage() -> Result<()> {
        let dir = tempdir()?;
        let store = CookieStore::at(dir.path().join("jar.json"));

        fs::write(store.path(), r#"[{"name":"NID","value":"1","domain":".google.com"}]"#)?;
        assert_eq!(store.load()?.len(), 1);

        fs::write(store.path(), "{ nope")?;
        assert!(matches!(store.load(), Err(PaperError::Config(_))));
        Ok(())
    }

    #[test]
    fn test_import_replaces_jar() -> Result<()> {
        let dir = tempdir()?;
        let store = CookieStore::at(dir.path().join("jar.json"));
        let export = dir.path().join("cookies.txt");
        fs::write(&export, ".google.com\tTRUE\t/\tTRUE\t0\tNID\tabc\n")?;

        let jar = store.import(&export)?;
        assert_eq!(jar.len(), 1);
        assert_eq!(store.load()?.header_at(0.0).as_deref(), Some("NID=abc"));
        Ok(())
    }

    #[test]
    fn test_path_follows_config() -> Result<()> {
        let config = ScraperConfig {
            cookie_file: Some(PathBuf::from("/tmp/jar.json")),
            ..ScraperConfig::default()
        };
        assert_eq!(CookieStore::from_config(&config)?.path(), Path::new("/tmp/jar.json"));
        Ok(())
    }
}
