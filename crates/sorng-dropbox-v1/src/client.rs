//! Low-level HTTP client for the Dropbox Core API v1.
//!
//! All API calls go through [`DropboxClient`] which handles:
//! - OAuth 1.0a signing of every request (see [`crate::signing`])
//! - API vs content endpoint routing and `<root>/<path>` URL building
//! - Status validation: anything but 200 is a `Transport` error carrying
//!   the endpoint, status and body verbatim
//! - An optional caller-supplied deadline per request
//!
//! Nothing is retried. Each call is one round trip.

use crate::config::{AccessRoot, AccessToken, DropboxConfig};
use crate::decode::decode_json;
use crate::error::{DropboxError, DropboxResult};
use crate::signing::{encode_path, encode_query, OAuthSigner};
use log::debug;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

/// Response metadata header sent with file downloads.
pub const METADATA_HEADER: &str = "x-dropbox-metadata";

/// Raw response of a successful (200) call.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Lower-cased header names; values as sent, which may be UTF-8 or
    /// arbitrary opaque bytes.
    pub headers: BTreeMap<String, Vec<u8>>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Header value as text, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_bytes(name)
            .and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn header_bytes(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_slice())
    }
}

/// Copy response headers, keeping every value's raw bytes.
pub(crate) fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<u8>> {
    headers
        .iter()
        .map(|(k, v)| (k.as_str().to_ascii_lowercase(), v.as_bytes().to_vec()))
        .collect()
}

/// HTTP client for a single Dropbox account.
#[derive(Clone)]
pub struct DropboxClient {
    http: reqwest::Client,
    signer: OAuthSigner,
    root: AccessRoot,
    api_base: String,
    content_base: String,
    web_base: String,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for DropboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropboxClient")
            .field("api_base", &self.api_base)
            .field("content_base", &self.content_base)
            .field("root", &self.root)
            .field("token_preview", &self.masked_token())
            .finish()
    }
}

impl DropboxClient {
    /// Create a client from a validated configuration.
    pub fn new(config: DropboxConfig) -> DropboxResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DropboxError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            signer: OAuthSigner::new(config.consumer(), config.access_token.clone()),
            root: config.root,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            content_base: config.content_base.trim_end_matches('/').to_string(),
            web_base: config.web_base.trim_end_matches('/').to_string(),
            deadline: None,
        })
    }

    /// A clone of this client whose requests must finish within `deadline`.
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        let mut c = self.clone();
        c.deadline = Some(deadline);
        c
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Replace the user access token.
    pub fn set_access_token(&mut self, token: AccessToken) {
        self.signer.set_token(Some(token));
    }

    pub fn clear_access_token(&mut self) {
        self.signer.set_token(None);
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.signer.token()
    }

    /// Show a masked version of the token for logging.
    pub fn masked_token(&self) -> String {
        self.signer
            .token()
            .map(|t| t.masked())
            .unwrap_or_else(|| "<none>".into())
    }

    pub fn root(&self) -> AccessRoot {
        self.root
    }

    pub(crate) fn signer(&self) -> &OAuthSigner {
        &self.signer
    }

    pub(crate) fn web_base(&self) -> &str {
        &self.web_base
    }

    // ── URL building ────────────────────────────────────────────────

    /// `{api_base}/{route}`
    pub fn api_url(&self, route: &str) -> String {
        format!("{}/{}", self.api_base, route.trim_start_matches('/'))
    }

    /// `{content_base}/{route}`
    pub fn content_url(&self, route: &str) -> String {
        format!("{}/{}", self.content_base, route.trim_start_matches('/'))
    }

    /// `{api_base}/{endpoint}/{root}/{path}`
    pub fn api_path_url(&self, endpoint: &str, path: &str) -> String {
        self.api_url(&format!("{}/{}/{}", endpoint, self.root, encode_path(path)))
    }

    /// `{content_base}/{endpoint}/{root}/{path}`
    pub fn content_path_url(&self, endpoint: &str, path: &str) -> String {
        self.content_url(&format!("{}/{}/{}", endpoint, self.root, encode_path(path)))
    }

    // ── Transport ───────────────────────────────────────────────────

    /// Sign and execute one request with the client's credentials.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> DropboxResult<RawResponse> {
        self.execute_signed(&self.signer, method, url, params, body).await
    }

    /// Sign with `signer` and execute one request.
    ///
    /// The response body is read to the end (or the response dropped)
    /// before returning, on success and on every error path.
    pub(crate) async fn execute_signed(
        &self,
        signer: &OAuthSigner,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> DropboxResult<RawResponse> {
        let signed = signer.sign(method.as_str(), url, params)?;
        let sep = if url.contains('?') { '&' } else { '?' };
        let full_url = format!("{}{}{}", url, sep, encode_query(&signed));

        let mut req = self.http.request(method.clone(), &full_url);
        if let Some(data) = body {
            debug!("{} {} ({} bytes)", method, url, data.len());
            req = req
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(data);
        } else {
            debug!("{} {}", method, url);
        }

        let round_trip = async {
            let resp = req
                .send()
                .await
                .map_err(|e| DropboxError::from(e).with_endpoint(url))?;

            let status = resp.status().as_u16();
            let headers = collect_headers(resp.headers());

            let bytes = match resp.bytes().await {
                Ok(b) => b.to_vec(),
                Err(e) => {
                    let mut err = DropboxError::from(e).with_endpoint(url);
                    err.status = Some(status);
                    return Err(err);
                }
            };
            debug!("{} {} -> {} ({} bytes)", method, url, status, bytes.len());

            if status != 200 {
                return Err(DropboxError::from_status(
                    method.as_str(),
                    url,
                    status,
                    &String::from_utf8_lossy(&bytes),
                ));
            }

            Ok(RawResponse {
                status,
                headers,
                body: bytes,
            })
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, round_trip)
                .await
                .map_err(|_| {
                    DropboxError::transport(format!(
                        "{} request for {} exceeded deadline of {:?}",
                        method, url, deadline
                    ))
                    .with_endpoint(url)
                })?,
            None => round_trip.await,
        }
    }

    // ── Typed helpers ───────────────────────────────────────────────

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> DropboxResult<T> {
        let resp = self.execute(Method::GET, url, params, None).await?;
        decode_json(url, &resp.body)
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> DropboxResult<T> {
        let resp = self.execute(Method::POST, url, params, None).await?;
        decode_json(url, &resp.body)
    }

    pub(crate) async fn put_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
        data: Vec<u8>,
    ) -> DropboxResult<T> {
        let resp = self.execute(Method::PUT, url, params, Some(data)).await?;
        decode_json(url, &resp.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn client() -> DropboxClient {
        DropboxClient::new(
            DropboxConfig::new("app_key", "app_secret")
                .with_access_token(AccessToken::new("oauth_token_value", "oauth_token_secret")),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_empty_consumer() {
        assert!(DropboxClient::new(DropboxConfig::new("", "")).unwrap_err().is_signing());
    }

    #[test]
    fn masked_token() {
        let c = client();
        let m = c.masked_token();
        assert!(m.starts_with("oaut"));
        assert!(m.ends_with("alue"));
        assert!(m.contains('…'));
    }

    #[test]
    fn masked_token_none() {
        let c = DropboxClient::new(DropboxConfig::new("k", "s")).unwrap();
        assert_eq!(c.masked_token(), "<none>");
        assert!(c.access_token().is_none());
    }

    #[test]
    fn set_and_clear_access_token() {
        let mut c = DropboxClient::new(DropboxConfig::new("k", "s")).unwrap();
        c.set_access_token(AccessToken::new("tok", "sec"));
        assert_eq!(c.access_token().map(|t| t.token.as_str()), Some("tok"));
        c.clear_access_token();
        assert!(c.access_token().is_none());
    }

    #[test]
    fn debug_format_hides_token() {
        let dbg = format!("{:?}", client());
        assert!(dbg.contains("DropboxClient"));
        assert!(dbg.contains("api_base"));
        assert!(!dbg.contains("oauth_token_secret"));
    }

    #[test]
    fn url_building() {
        let c = client();
        assert_eq!(c.api_url("account/info"), "https://api.dropbox.com/1/account/info");
        assert_eq!(
            c.api_path_url("metadata", "/Photos/a b.jpg"),
            "https://api.dropbox.com/1/metadata/sandbox/Photos/a%20b.jpg"
        );
        assert_eq!(
            c.content_path_url("files_put", "notes.txt"),
            "https://api-content.dropbox.com/1/files_put/sandbox/notes.txt"
        );
    }

    #[test]
    fn url_building_dropbox_root() {
        let c = DropboxClient::new(
            DropboxConfig::new("k", "s").with_root(AccessRoot::Dropbox),
        )
        .unwrap();
        assert_eq!(
            c.api_path_url("revisions", "/a.txt"),
            "https://api.dropbox.com/1/revisions/dropbox/a.txt"
        );
    }

    #[test]
    fn with_deadline_is_scoped_to_clone() {
        let c = client();
        let d = c.with_deadline(Duration::from_secs(3));
        assert_eq!(d.deadline(), Some(Duration::from_secs(3)));
        assert!(c.deadline().is_none());
    }

    #[test]
    fn raw_response_header_lookup() {
        let mut headers = BTreeMap::new();
        headers.insert(METADATA_HEADER.to_string(), b"{}".to_vec());
        let r = RawResponse {
            status: 200,
            headers,
            body: vec![],
        };
        assert_eq!(r.header("X-Dropbox-Metadata"), Some("{}"));
        assert_eq!(r.header_bytes("x-dropbox-metadata"), Some(&b"{}"[..]));
    }

    #[test]
    fn collect_headers_keeps_non_ascii_values() {
        let mut map = HeaderMap::new();
        map.insert(
            METADATA_HEADER,
            HeaderValue::from_bytes("{\"path\": \"/Bücher\"}".as_bytes()).unwrap(),
        );
        map.insert("x-opaque", HeaderValue::from_bytes(b"\xff\xfe").unwrap());
        let headers = collect_headers(&map);
        let r = RawResponse {
            status: 200,
            headers,
            body: vec![],
        };
        assert_eq!(r.header(METADATA_HEADER), Some("{\"path\": \"/Bücher\"}"));
        assert_eq!(r.header_bytes("x-opaque"), Some(&[0xff_u8, 0xfe][..]));
        assert!(r.header("x-opaque").is_none());
    }
}
