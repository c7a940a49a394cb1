// Camera HTTP client
//
// Wraps `reqwest::Client` with camera-specific URL construction and
// response checking. The control endpoint and file server helpers are
// implemented as inherent methods in `control.rs` and `files.rs` to
// keep this module focused on transport mechanics.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// A flat JSON object as returned by the control endpoint.
pub type ControlData = serde_json::Map<String, serde_json::Value>;

/// Raw HTTP client for one camera.
///
/// The camera exposes two services on port 80: the `fcgi_client.cgi`
/// control script and an nginx file server rooted at `/DCIM/`. Both are
/// reached through this client.
pub struct CameraClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl CameraClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the camera root, e.g. `http://192.168.100.1`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// The camera base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a path relative to the camera root.
    ///
    /// Trailing slashes on `path` are preserved; directory listings
    /// depend on them.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request with query parameters and return the checked response.
    pub(crate) async fn get(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        check_status(resp).await
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Turn a non-success status into `Error::Http`, keeping a short body preview.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let preview: String = body.chars().take(200).collect();
    Err(Error::Http {
        status: status.as_u16(),
        message: if preview.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_owned()
        } else {
            preview
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> CameraClient {
        CameraClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = client("http://192.168.100.1/");
        assert_eq!(
            c.url("/fcgi_client.cgi").unwrap().as_str(),
            "http://192.168.100.1/fcgi_client.cgi"
        );
    }

    #[test]
    fn url_keeps_directory_slash() {
        let c = client("http://192.168.100.1");
        assert_eq!(
            c.url("DCIM/Image/").unwrap().as_str(),
            "http://192.168.100.1/DCIM/Image/"
        );
    }

    #[test]
    fn url_respects_base_path_prefix() {
        let c = client("http://proxy.local/camera");
        assert_eq!(
            c.url("DCIM/Video/").unwrap().as_str(),
            "http://proxy.local/camera/DCIM/Video/"
        );
    }
}
