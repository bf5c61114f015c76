//! Error types for the Dropbox Core API v1 client.
//!
//! Every public operation returns `DropboxResult<T>`. Callers can tell a
//! failed round trip (`Transport`) from a 200 response that could not be
//! understood (`Decode`) and from a request that never left the process
//! because it could not be signed (`Signing`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convenience alias.
pub type DropboxResult<T> = Result<T, DropboxError>;

/// Broad category of a [`DropboxError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropboxErrorKind {
    /// Network failure, deadline expiry, or a non-200 HTTP status.
    Transport,
    /// The response body did not have the expected shape.
    Decode,
    /// Malformed URL or credential state prevented signing.
    Signing,
}

impl fmt::Display for DropboxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structured error returned by every public function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxError {
    pub kind: DropboxErrorKind,
    pub message: String,
    /// Endpoint URL (without the signed query string).
    pub endpoint: Option<String>,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Response body text, verbatim.
    pub body: Option<String>,
}

impl fmt::Display for DropboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for DropboxError {}

impl DropboxError {
    /// Create from a kind + message.
    pub fn new(kind: DropboxErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            endpoint: None,
            status: None,
            body: None,
        }
    }

    /// Shortcut: transport failure without a response.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(DropboxErrorKind::Transport, msg)
    }

    /// Shortcut: decode failure.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::new(DropboxErrorKind::Decode, msg)
    }

    /// Shortcut: signing / configuration failure.
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::new(DropboxErrorKind::Signing, msg)
    }

    /// A response arrived with a status other than 200.
    pub fn from_status(method: &str, endpoint: &str, status: u16, body: &str) -> Self {
        Self {
            kind: DropboxErrorKind::Transport,
            message: format!("{} request for {} returned {}, {}", method, endpoint, status, body),
            endpoint: Some(endpoint.to_string()),
            status: Some(status),
            body: Some(body.to_string()),
        }
    }

    /// Attach the endpoint the error relates to.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn is_transport(&self) -> bool {
        self.kind == DropboxErrorKind::Transport
    }

    pub fn is_decode(&self) -> bool {
        self.kind == DropboxErrorKind::Decode
    }

    pub fn is_signing(&self) -> bool {
        self.kind == DropboxErrorKind::Signing
    }
}

impl From<reqwest::Error> for DropboxError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the signed OAuth query; keep only the
        // bare endpoint and format the message without it.
        let endpoint = err.url().map(|url| {
            let mut url = url.clone();
            url.set_query(None);
            url.to_string()
        });
        let err = err.without_url();
        let msg = if err.is_timeout() {
            format!("Request timed out: {}", err)
        } else if err.is_connect() {
            format!("Connection failed: {}", err)
        } else {
            format!("HTTP error: {}", err)
        };
        let mut out = Self::transport(msg);
        out.status = err.status().map(|s| s.as_u16());
        out.endpoint = endpoint;
        out
    }
}

impl From<serde_json::Error> for DropboxError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for DropboxError {
    fn from(err: url::ParseError) -> Self {
        Self::signing(format!("URL parse error: {}", err))
    }
}

/// Convert to a plain string for hosts that only carry messages.
impl From<DropboxError> for String {
    fn from(err: DropboxError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_keeps_status_and_body_verbatim() {
        let body = r#"{"error": "Path '/missing' not found"}"#;
        let err = DropboxError::from_status("GET", "https://api.dropbox.com/1/metadata/sandbox/missing", 404, body);
        assert_eq!(err.kind, DropboxErrorKind::Transport);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.body.as_deref(), Some(body));
        assert!(err.message.contains("404"));
        assert!(err.message.contains("metadata/sandbox/missing"));
    }

    #[test]
    fn display_includes_kind() {
        let err = DropboxError::decode("bad entry");
        assert_eq!(err.to_string(), "[Decode] bad entry");
    }

    #[test]
    fn kind_predicates() {
        assert!(DropboxError::transport("x").is_transport());
        assert!(DropboxError::decode("x").is_decode());
        assert!(DropboxError::signing("x").is_signing());
        assert!(!DropboxError::signing("x").is_transport());
    }

    #[test]
    fn serde_json_error_maps_to_decode() {
        let err: DropboxError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.kind, DropboxErrorKind::Decode);
    }

    #[test]
    fn url_parse_error_maps_to_signing() {
        let err: DropboxError = url::Url::parse("not a url").unwrap_err().into();
        assert_eq!(err.kind, DropboxErrorKind::Signing);
    }

    #[test]
    fn with_endpoint_sets_field() {
        let err = DropboxError::decode("x").with_endpoint("https://api.dropbox.com/1/delta");
        assert_eq!(err.endpoint.as_deref(), Some("https://api.dropbox.com/1/delta"));
    }

    #[test]
    fn into_string() {
        let s: String = DropboxError::transport("boom").into();
        assert!(s.contains("Transport"));
        assert!(s.contains("boom"));
    }

    #[test]
    fn serde_roundtrip() {
        let err = DropboxError::from_status("POST", "https://api.dropbox.com/1/delta", 503, "busy");
        let json = serde_json::to_string(&err).unwrap();
        let back: DropboxError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, DropboxErrorKind::Transport);
        assert_eq!(back.status, Some(503));
        assert_eq!(back.body.as_deref(), Some("busy"));
    }
}
