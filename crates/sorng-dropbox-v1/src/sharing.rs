//! Sharing — public links, streaming links and copy references.

use crate::client::DropboxClient;
use crate::error::DropboxResult;
use crate::types::{CopyReference, ShareLink};

/// Build `/shares` parameters.
pub fn build_shares(short_url: bool) -> Vec<(String, String)> {
    vec![("short_url".to_string(), short_url.to_string())]
}

impl DropboxClient {
    /// A shareable link to a file or folder's preview page.
    ///
    /// With `short_url` the server returns a `db.tt` short link.
    pub async fn shares(&self, path: &str, short_url: bool) -> DropboxResult<ShareLink> {
        let url = self.api_path_url("shares", path);
        self.post_json(&url, &build_shares(short_url)).await
    }

    /// A direct, time-limited link for streaming a file's content.
    pub async fn media(&self, path: &str) -> DropboxResult<ShareLink> {
        let url = self.api_path_url("media", path);
        self.post_json(&url, &[]).await
    }

    /// A reference another account can pass to [`DropboxClient::copy_from_ref`].
    pub async fn copy_ref(&self, path: &str) -> DropboxResult<CopyReference> {
        let url = self.api_path_url("copy_ref", path);
        self.post_json(&url, &[]).await
    }
}
