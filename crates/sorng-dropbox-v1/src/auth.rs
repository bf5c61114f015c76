//! Three-legged OAuth 1.0a authorization.
//!
//! 1. [`DropboxClient::request_token`] obtains a temporary token pair,
//!    signed with the consumer credentials only.
//! 2. The user opens [`DropboxClient::authorize_url`] and approves the app.
//! 3. [`DropboxClient::obtain_access_token`] trades the approved request
//!    token for a long-lived access token.
//!
//! Token endpoints answer with form-encoded bodies, not JSON. Storing the
//! resulting token is up to the caller.

use crate::client::DropboxClient;
use crate::config::AccessToken;
use crate::error::{DropboxError, DropboxResult};
use crate::signing::{encode_query, OAuthSigner};
use log::debug;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Access token plus the account it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedToken {
    pub token: AccessToken,
    /// Account id, when the server includes it.
    pub uid: Option<String>,
}

/// Parse an `oauth_token=…&oauth_token_secret=…` body.
pub fn parse_token_response(endpoint: &str, body: &[u8]) -> DropboxResult<AuthorizedToken> {
    let fields: HashMap<String, String> = url::form_urlencoded::parse(body).into_owned().collect();

    let field = |name: &str| -> DropboxResult<String> {
        fields
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| {
                let mut err = DropboxError::decode(format!(
                    "Token response from {} is missing {}",
                    endpoint, name
                ))
                .with_endpoint(endpoint);
                err.body = Some(String::from_utf8_lossy(body).into_owned());
                err
            })
    };

    let token = field("oauth_token")?;
    let secret = field("oauth_token_secret")?;
    Ok(AuthorizedToken {
        token: AccessToken { token, secret },
        uid: fields.get("uid").filter(|v| !v.is_empty()).cloned(),
    })
}

/// Build the query for the user-facing authorize page.
pub fn build_authorize(request_token: &str, callback: Option<&str>) -> Vec<(String, String)> {
    let mut params = vec![("oauth_token".to_string(), request_token.to_string())];
    if let Some(cb) = callback.filter(|c| !c.is_empty()) {
        params.push(("oauth_callback".into(), cb.to_string()));
    }
    params
}

impl DropboxClient {
    /// Step 1: fetch a temporary request token.
    ///
    /// Signed with the consumer credentials alone, whatever token the
    /// client currently holds.
    pub async fn request_token(&self) -> DropboxResult<AccessToken> {
        let url = self.api_url("oauth/request_token");
        let signer = OAuthSigner::new(self.signer().consumer().clone(), None);
        let resp = self
            .execute_signed(&signer, Method::POST, &url, &[], None)
            .await?;
        let parsed = parse_token_response(&url, &resp.body)?;
        debug!("obtained request token {}", parsed.token.masked());
        Ok(parsed.token)
    }

    /// Step 2: the page where the user approves `request_token`.
    ///
    /// With a `callback`, the browser is redirected there afterwards.
    pub fn authorize_url(&self, request_token: &AccessToken, callback: Option<&str>) -> String {
        format!(
            "{}/oauth/authorize?{}",
            self.web_base(),
            encode_query(&build_authorize(&request_token.token, callback))
        )
    }

    /// Step 3: exchange an approved request token for an access token.
    ///
    /// The client's own token is left untouched; pass the result to
    /// [`DropboxClient::set_access_token`] to use it.
    pub async fn obtain_access_token(
        &self,
        request_token: &AccessToken,
    ) -> DropboxResult<AuthorizedToken> {
        let url = self.api_url("oauth/access_token");
        let signer = OAuthSigner::new(self.signer().consumer().clone(), Some(request_token.clone()));
        let resp = self
            .execute_signed(&signer, Method::POST, &url, &[], None)
            .await?;
        let parsed = parse_token_response(&url, &resp.body)?;
        debug!(
            "obtained access token {} for uid {}",
            parsed.token.masked(),
            parsed.uid.as_deref().unwrap_or("?")
        );
        Ok(parsed)
    }
}
