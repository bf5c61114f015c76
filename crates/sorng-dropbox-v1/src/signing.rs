//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Implements the signing algorithm of RFC 5849 as used by the Dropbox
//! Core API v1. The steps are:
//!
//! 1. Collect the request parameters plus the `oauth_*` protocol parameters
//! 2. Normalize them (percent-encode, sort by name then value, join)
//! 3. Build the signature base string `METHOD&uri&params`
//! 4. HMAC-SHA1 it with `consumer_secret&token_secret` and base64 the digest
//!
//! The signed parameters travel in the query string.

use crate::config::{AccessToken, ConsumerCredentials};
use crate::error::{DropboxError, DropboxResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::trace;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// RFC 3986 unreserved characters stay as they are; everything else is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signs requests with a consumer key pair and an optional token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthSigner {
    consumer: ConsumerCredentials,
    token: Option<AccessToken>,
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("consumer", &self.consumer)
            .field("token", &self.token)
            .finish()
    }
}

impl OAuthSigner {
    pub fn new(consumer: ConsumerCredentials, token: Option<AccessToken>) -> Self {
        Self { consumer, token }
    }

    pub fn consumer(&self) -> &ConsumerCredentials {
        &self.consumer
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: Option<AccessToken>) {
        self.token = token;
    }

    /// Sign a request with a fresh nonce and the current timestamp.
    ///
    /// Returns `params` followed by the `oauth_*` parameters, including
    /// `oauth_signature`.
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
    ) -> DropboxResult<Vec<(String, String)>> {
        let nonce = generate_nonce();
        let timestamp = Utc::now().timestamp();
        self.sign_with(method, url, params, &nonce, timestamp)
    }

    /// Deterministic signing core.
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> DropboxResult<Vec<(String, String)>> {
        if self.consumer.key.is_empty() {
            return Err(DropboxError::signing("OAuth consumer key is empty"));
        }
        let parsed = Url::parse(url)?;

        let mut oauth: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), self.consumer.key.clone()),
            ("oauth_nonce".into(), nonce.to_string()),
            ("oauth_signature_method".into(), SIGNATURE_METHOD.into()),
            ("oauth_timestamp".into(), timestamp.to_string()),
        ];
        if let Some(tok) = &self.token {
            oauth.push(("oauth_token".into(), tok.token.clone()));
        }
        oauth.push(("oauth_version".into(), OAUTH_VERSION.into()));

        let mut all: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        all.extend(params.iter().cloned());
        all.extend(oauth.iter().cloned());

        let base = signature_base_string(method, &parsed, &all)?;
        trace!("OAuth signature base string: {}", base);
        let signature = self.hmac_sha1(&base)?;

        let mut signed = params.to_vec();
        signed.extend(oauth);
        signed.push(("oauth_signature".into(), signature));
        Ok(signed)
    }

    fn signing_key(&self) -> String {
        let token_secret = self.token.as_ref().map(|t| t.secret.as_str()).unwrap_or("");
        format!(
            "{}&{}",
            percent_encode(&self.consumer.secret),
            percent_encode(token_secret)
        )
    }

    fn hmac_sha1(&self, base: &str) -> DropboxResult<String> {
        let mut mac = HmacSha1::new_from_slice(self.signing_key().as_bytes())
            .map_err(|e| DropboxError::signing(format!("Invalid HMAC key: {}", e)))?;
        mac.update(base.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// Build the signature base string for a request.
pub fn signature_base_string(
    method: &str,
    url: &Url,
    params: &[(String, String)],
) -> DropboxResult<String> {
    Ok(format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&base_string_uri(url)?),
        percent_encode(&normalize_params(params))
    ))
}

/// Scheme, host, non-default port and path; no query or fragment.
pub fn base_string_uri(url: &Url) -> DropboxResult<String> {
    let host = url
        .host_str()
        .ok_or_else(|| DropboxError::signing(format!("URL has no host: {}", url)))?;
    let mut out = format!("{}://{}", url.scheme().to_ascii_lowercase(), host.to_ascii_lowercase());
    // `Url::port` is None for the scheme's default port.
    if let Some(port) = url.port() {
        out.push_str(&format!(":{}", port));
    }
    out.push_str(url.path());
    Ok(out)
}

/// Encode every pair, sort by name then value and join with `&`.
pub fn normalize_params(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode per RFC 3986 (unreserved characters left as-is).
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Query string in the same encoding used for signing.
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Encode a Dropbox path for use in a URL: leading `/` trimmed, each
/// segment encoded, separators kept.
pub fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(percent_encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// 16 random bytes, hex encoded.
pub fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}
