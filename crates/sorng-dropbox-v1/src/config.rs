//! Client configuration and OAuth 1.0a credential types.
//!
//! A [`DropboxConfig`] is handed to [`crate::client::DropboxClient::new`]
//! and owned by the client; there is no process-wide OAuth state.

use crate::error::{DropboxError, DropboxResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL for account, metadata, delta, sharing and fileops endpoints.
pub const API_BASE: &str = "https://api.dropbox.com/1";
/// Base URL for file content endpoints (files, files_put, thumbnails).
pub const CONTENT_BASE: &str = "https://api-content.dropbox.com/1";
/// Base URL for the user-facing authorization page.
pub const WEB_BASE: &str = "https://www.dropbox.com/1";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        "****".into()
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Credentials
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// OAuth consumer credentials (app key / app secret).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerCredentials {
    pub key: String,
    pub secret: String,
}

impl ConsumerCredentials {
    pub fn new(key: &str, secret: &str) -> Self {
        Self {
            key: key.to_string(),
            secret: secret.to_string(),
        }
    }
}

impl fmt::Debug for ConsumerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerCredentials")
            .field("key", &self.key)
            .field("secret", &mask(&self.secret))
            .finish()
    }
}

/// An OAuth token pair: either a request token or a user access token.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
}

impl AccessToken {
    pub fn new(token: &str, secret: &str) -> Self {
        Self {
            token: token.to_string(),
            secret: secret.to_string(),
        }
    }

    /// Show a masked version of the token for logging.
    pub fn masked(&self) -> String {
        mask(&self.token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.masked())
            .field("secret", &"****")
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Access root
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Namespace file operations are resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRoot {
    /// App folder access.
    #[default]
    Sandbox,
    /// Full Dropbox access.
    Dropbox,
}

impl AccessRoot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Dropbox => "dropbox",
        }
    }
}

impl fmt::Display for AccessRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Client configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuration for a Dropbox v1 client.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DropboxConfig {
    /// OAuth consumer key (app key).
    pub app_key: String,
    /// OAuth consumer secret (app secret).
    pub app_secret: String,
    /// Previously obtained user access token.
    pub access_token: Option<AccessToken>,
    /// Namespace for path-based calls.
    pub root: AccessRoot,
    /// Overall request timeout used when no per-request deadline is set.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub api_base: String,
    pub content_base: String,
    pub web_base: String,
    pub user_agent: String,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            access_token: None,
            root: AccessRoot::Sandbox,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            api_base: API_BASE.to_string(),
            content_base: CONTENT_BASE.to_string(),
            web_base: WEB_BASE.to_string(),
            user_agent: format!("SortOfRemoteNG/1.0 dropbox-v1/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for DropboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxConfig")
            .field("app_key", &self.app_key)
            .field("app_secret", &mask(&self.app_secret))
            .field("access_token", &self.access_token)
            .field("root", &self.root)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_base", &self.api_base)
            .field("content_base", &self.content_base)
            .finish()
    }
}

impl DropboxConfig {
    /// Configuration with the given app credentials and library defaults.
    pub fn new(app_key: &str, app_secret: &str) -> Self {
        Self {
            app_key: app_key.to_string(),
            app_secret: app_secret.to_string(),
            ..Self::default()
        }
    }

    pub fn with_access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    pub fn with_root(mut self, root: AccessRoot) -> Self {
        self.root = root;
        self
    }

    /// Point both API hosts at one base URL (local test servers, proxies).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.api_base = base.to_string();
        self.content_base = base.to_string();
        self.web_base = base.to_string();
        self
    }

    pub fn consumer(&self) -> ConsumerCredentials {
        ConsumerCredentials::new(&self.app_key, &self.app_secret)
    }

    /// Reject configurations that cannot produce a valid signature.
    pub fn validate(&self) -> DropboxResult<()> {
        if self.app_key.trim().is_empty() {
            return Err(DropboxError::signing("Dropbox app_key must not be empty"));
        }
        if self.app_secret.trim().is_empty() {
            return Err(DropboxError::signing("Dropbox app_secret must not be empty"));
        }
        if let Some(tok) = &self.access_token {
            if tok.token.is_empty() || tok.secret.is_empty() {
                return Err(DropboxError::signing(
                    "Dropbox access token and secret must both be set",
                ));
            }
        }
        for base in [&self.api_base, &self.content_base, &self.web_base] {
            url::Url::parse(base)?;
        }
        Ok(())
    }
}
