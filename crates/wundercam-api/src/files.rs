// File server endpoints
//
// The camera's nginx serves `/DCIM/Image/` and `/DCIM/Video/` with
// autoindex enabled. Listings are scraped from the HTML index; files are
// fetched as-is.

use std::sync::LazyLock;

use bytes::Bytes;
use regex::Regex;
use tracing::debug;

use crate::client::CameraClient;
use crate::error::Error;

/// Image directory relative to the camera root.
pub const IMAGE_DIR: &str = "DCIM/Image/";
/// Video directory relative to the camera root.
pub const VIDEO_DIR: &str = "DCIM/Video/";

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a href="(?P<href>[^"]+)">"#).expect("anchor pattern is valid")
});

/// A downloaded file with the content type the camera reported.
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl CameraClient {
    /// List the file names in a directory of the camera's file server.
    ///
    /// `GET /{path}` -- `path` must keep its trailing slash. The parent
    /// link and sub-directories are skipped.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<String>, Error> {
        let url = self.url(path)?;
        debug!(path, "listing directory");
        let resp = self.get(url, &[]).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        let entries = parse_index(&body);
        debug!(path, entries = entries.len(), "directory listed");
        Ok(entries)
    }

    /// Download a file from the camera.
    ///
    /// `GET /{path}`
    pub async fn fetch(&self, path: &str) -> Result<Download, Error> {
        let url = self.url(path)?;
        debug!(path, "fetching file");
        let resp = self.get(url, &[]).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = resp.bytes().await.map_err(Error::Transport)?;
        Ok(Download {
            content_type,
            bytes,
        })
    }
}

/// Extract file entries from an nginx autoindex page.
pub fn parse_index(html: &str) -> Vec<String> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| caps.name("href"))
        .map(|m| m.as_str())
        .filter(|href| !href.ends_with('/') && !href.starts_with('?'))
        .map(String::from)
        .collect()
}
