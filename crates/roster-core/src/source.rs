//! Where the two source tables come from
//!
//! The sheets are usually published spreadsheets fetched over HTTP, but a
//! local export works the same way.

use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

/// Default HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

static SHEET_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"spreadsheets/d/([a-zA-Z0-9_-]+)").expect("sheet id pattern is valid")
});

/// Turn a spreadsheet link into its TSV export link
///
/// Links that already export TSV, and anything that is not a spreadsheet
/// link, come back unchanged.
pub fn convert_to_tsv_export_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("/export?format=tsv") || url.contains("/gviz/tq") {
        return url.to_string();
    }

    let Some(caps) = SHEET_ID.captures(url) else {
        return url.to_string();
    };

    let mut export = format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=tsv",
        &caps[1]
    );
    if let Some(gid) = query_value(url, "gid") {
        export.push_str("&gid=");
        export.push_str(gid);
    }
    export
}

/// Value of `name` in the query string or fragment of `url`
fn query_value<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    url.split(['?', '#', '&'])
        .skip(1)
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// Provides the raw text of one source table
pub trait TableSource {
    /// Human-readable name used in logs and errors
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<String>;
}

/// A table exported to a local file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl TableSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| Error::FileRead {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// A table published on the web
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// Source for `url`; spreadsheet links are rewritten to their TSV
    /// export
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch {
                source_name: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            url: convert_to_tsv_export_url(url),
            client,
        })
    }
}

impl TableSource for HttpSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<String> {
        log::debug!("fetching {}", self.url);
        let response = self.client.get(&self.url).send().map_err(|e| Error::Fetch {
            source_name: self.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                source_name: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| Error::Fetch {
            source_name: self.url.clone(),
            message: e.to_string(),
        })
    }
}

/// Pick the source kind from a location: `http(s)://` links are fetched,
/// everything else is a file path
pub fn open_source(location: &str, timeout: Duration) -> Result<Box<dyn TableSource + Send + Sync>> {
    let trimmed = location.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(Box::new(HttpSource::new(trimmed, timeout)?))
    } else {
        Ok(Box::new(FileSource::new(trimmed)))
    }
}

/// Fixed text, for tests and embedders that fetch on their own
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    content: std::result::Result<String, String>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Ok(content.into()),
        }
    }

    /// A source whose every fetch fails with `message`
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Err(message.into()),
        }
    }
}

impl TableSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<String> {
        self.content.clone().map_err(|message| Error::Fetch {
            source_name: self.name.clone(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_convert_edit_link() {
        assert_eq!(
            convert_to_tsv_export_url(
                "https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=12345"
            ),
            "https://docs.google.com/spreadsheets/d/1AbC-d_9/export?format=tsv&gid=12345"
        );
        assert_eq!(
            convert_to_tsv_export_url("https://docs.google.com/spreadsheets/d/1AbC/edit?usp=sharing"),
            "https://docs.google.com/spreadsheets/d/1AbC/export?format=tsv"
        );
    }

    #[test]
    fn test_convert_leaves_exports_and_other_links() {
        let export = "https://docs.google.com/spreadsheets/d/1AbC/export?format=tsv&gid=0";
        assert_eq!(convert_to_tsv_export_url(export), export);

        let gviz = "https://docs.google.com/spreadsheets/d/1AbC/gviz/tq?tqx=out:csv";
        assert_eq!(convert_to_tsv_export_url(gviz), gviz);

        assert_eq!(
            convert_to_tsv_export_url(" https://example.com/table.tsv "),
            "https://example.com/table.tsv"
        );
    }

    #[test]
    fn test_file_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("builds.tsv");
        fs::write(&path, "a\tb\n").unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.fetch().unwrap(), "a\tb\n");

        let missing = FileSource::new(dir.path().join("missing.tsv"));
        assert!(matches!(missing.fetch(), Err(Error::FileRead { .. })));
    }

    #[test]
    fn test_open_source_picks_kind() {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        let http = open_source("https://docs.google.com/spreadsheets/d/1AbC/edit", timeout).unwrap();
        assert_eq!(
            http.name(),
            "https://docs.google.com/spreadsheets/d/1AbC/export?format=tsv"
        );

        let file = open_source("data/builds.tsv", timeout).unwrap();
        assert_eq!(file.name(), "data/builds.tsv");
    }

    #[test]
    fn test_static_source() {
        assert_eq!(StaticSource::new("meta", "x").fetch().unwrap(), "x");
        let err = StaticSource::failing("meta", "offline").fetch().unwrap_err();
        assert_eq!(err.to_string(), "failed to fetch meta: offline");
    }
}
