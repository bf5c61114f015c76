//! Account information.

use crate::client::DropboxClient;
use crate::error::DropboxResult;
use crate::types::AccountInfo;

impl DropboxClient {
    /// Profile and quota of the account the access token belongs to.
    pub async fn account_info(&self) -> DropboxResult<AccountInfo> {
        self.get_json(&self.api_url("account/info"), &[]).await
    }
}
