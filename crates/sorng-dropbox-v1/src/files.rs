//! File endpoints: download, upload, metadata, revisions, restore, search
//! and thumbnails.
//!
//! Downloads, uploads and thumbnails go to the content host, everything
//! else to the API host. Paths are relative to the client's access root.

use crate::client::{DropboxClient, RawResponse, METADATA_HEADER};
use crate::decode::decode_json;
use crate::error::DropboxResult;
use crate::types::{FileDownload, FileMetadata, MetadataOptions, ThumbnailFormat, ThumbnailSize};
use log::debug;
use reqwest::Method;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Request Builders
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build `/files` parameters. Without `rev` the latest revision is fetched.
pub fn build_get_file(rev: Option<&str>) -> Vec<(String, String)> {
    rev.filter(|r| !r.is_empty())
        .map(|r| vec![("rev".to_string(), r.to_string())])
        .unwrap_or_default()
}

/// Build `/files_put` parameters.
///
/// With `overwrite = false` a conflicting upload is renamed by the server.
/// `parent_rev` names the revision being replaced.
pub fn build_put_file(overwrite: bool, parent_rev: Option<&str>) -> Vec<(String, String)> {
    let mut params = vec![("overwrite".to_string(), overwrite.to_string())];
    if let Some(rev) = parent_rev.filter(|r| !r.is_empty()) {
        params.push(("parent_rev".into(), rev.to_string()));
    }
    params
}

/// Build `/metadata` parameters from the set options only.
pub fn build_metadata(opts: &MetadataOptions) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(list) = opts.list {
        params.push(("list".to_string(), list.to_string()));
    }
    if let Some(limit) = opts.file_limit {
        params.push(("file_limit".into(), limit.to_string()));
    }
    if let Some(hash) = opts.hash.as_deref().filter(|h| !h.is_empty()) {
        params.push(("hash".into(), hash.to_string()));
    }
    if let Some(rev) = opts.rev.as_deref().filter(|r| !r.is_empty()) {
        params.push(("rev".into(), rev.to_string()));
    }
    if let Some(deleted) = opts.include_deleted {
        params.push(("include_deleted".into(), deleted.to_string()));
    }
    params
}

/// Build `/revisions` parameters.
pub fn build_revisions(rev_limit: u32) -> Vec<(String, String)> {
    vec![("rev_limit".to_string(), rev_limit.to_string())]
}

/// Build `/restore` parameters.
pub fn build_restore(rev: &str) -> Vec<(String, String)> {
    vec![("rev".to_string(), rev.to_string())]
}

/// Build `/search` parameters.
pub fn build_search(query: &str, file_limit: u32, include_deleted: bool) -> Vec<(String, String)> {
    vec![
        ("query".to_string(), query.to_string()),
        ("file_limit".to_string(), file_limit.to_string()),
        ("include_deleted".to_string(), include_deleted.to_string()),
    ]
}

/// Build `/thumbnails` parameters.
pub fn build_thumbnail(format: ThumbnailFormat, size: ThumbnailSize) -> Vec<(String, String)> {
    vec![
        ("format".to_string(), format.as_str().to_string()),
        ("size".to_string(), size.as_str().to_string()),
    ]
}

/// Decode the `x-dropbox-metadata` header of a download, if sent.
fn download_metadata(endpoint: &str, resp: &RawResponse) -> DropboxResult<Option<FileMetadata>> {
    resp.header_bytes(METADATA_HEADER)
        .map(|raw| decode_json::<FileMetadata>(endpoint, raw))
        .transpose()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Endpoints
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl DropboxClient {
    /// Download a file, optionally at a given revision.
    ///
    /// The metadata the server sends in the `x-dropbox-metadata` header is
    /// decoded into [`FileDownload::metadata`]; a header that is present but
    /// unparseable is a `Decode` error.
    pub async fn get_file(&self, path: &str, rev: Option<&str>) -> DropboxResult<FileDownload> {
        let url = self.content_path_url("files", path);
        let resp = self
            .execute(Method::GET, &url, &build_get_file(rev), None)
            .await?;
        let metadata = download_metadata(&url, &resp)?;
        Ok(FileDownload {
            data: resp.body,
            metadata,
        })
    }

    /// Upload `data` to `path`, returning the stored file's metadata.
    pub async fn put_file(
        &self,
        path: &str,
        data: Vec<u8>,
        overwrite: bool,
        parent_rev: Option<&str>,
    ) -> DropboxResult<FileMetadata> {
        let url = self.content_path_url("files_put", path);
        self.put_json(&url, &build_put_file(overwrite, parent_rev), data)
            .await
    }

    /// Metadata of a file or folder, with contents when `opts.list` is set.
    ///
    /// When `opts.hash` matches the folder's current hash the server answers
    /// 304, which surfaces as a `Transport` error with `status == Some(304)`.
    pub async fn metadata(&self, path: &str, opts: &MetadataOptions) -> DropboxResult<FileMetadata> {
        let url = self.api_path_url("metadata", path);
        self.get_json(&url, &build_metadata(opts)).await
    }

    /// Up to `rev_limit` previous revisions of a file, newest first.
    pub async fn revisions(&self, path: &str, rev_limit: u32) -> DropboxResult<Vec<FileMetadata>> {
        let url = self.api_path_url("revisions", path);
        self.get_json(&url, &build_revisions(rev_limit)).await
    }

    /// Restore a file to revision `rev`.
    pub async fn restore(&self, path: &str, rev: &str) -> DropboxResult<FileMetadata> {
        let url = self.api_path_url("restore", path);
        self.post_json(&url, &build_restore(rev)).await
    }

    /// Files and folders under `path` whose names contain `query`.
    pub async fn search(
        &self,
        query: &str,
        path: &str,
        file_limit: u32,
        include_deleted: bool,
    ) -> DropboxResult<Vec<FileMetadata>> {
        let url = self.api_path_url("search", path);
        let results: Vec<FileMetadata> = self
            .get_json(&url, &build_search(query, file_limit, include_deleted))
            .await?;
        debug!("search {:?} under {}: {} results", query, path, results.len());
        Ok(results)
    }

    /// Thumbnail image bytes for an image file.
    pub async fn thumbnail(
        &self,
        path: &str,
        format: ThumbnailFormat,
        size: ThumbnailSize,
    ) -> DropboxResult<Vec<u8>> {
        let url = self.content_path_url("thumbnails", path);
        let resp = self
            .execute(Method::POST, &url, &build_thumbnail(format, size), None)
            .await?;
        Ok(resp.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(v: &[(&str, &str)]) -> Vec<(String, String)> {
        v.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn get_file_params() {
        assert!(build_get_file(None).is_empty());
        assert!(build_get_file(Some("")).is_empty());
        assert_eq!(build_get_file(Some("a1b2")), pairs(&[("rev", "a1b2")]));
    }

    #[test]
    fn put_file_params() {
        assert_eq!(build_put_file(true, None), pairs(&[("overwrite", "true")]));
        assert_eq!(
            build_put_file(false, Some("38af1b183490")),
            pairs(&[("overwrite", "false"), ("parent_rev", "38af1b183490")])
        );
    }

    #[test]
    fn metadata_params_only_set_options() {
        assert!(build_metadata(&MetadataOptions::default()).is_empty());
        assert_eq!(build_metadata(&MetadataOptions::listing()), pairs(&[("list", "true")]));

        let opts = MetadataOptions {
            list: Some(true),
            file_limit: Some(1000),
            hash: Some("37eb".into()),
            rev: None,
            include_deleted: Some(false),
        };
        assert_eq!(
            build_metadata(&opts),
            pairs(&[
                ("list", "true"),
                ("file_limit", "1000"),
                ("hash", "37eb"),
                ("include_deleted", "false"),
            ])
        );
    }

    #[test]
    fn revisions_and_restore_params() {
        assert_eq!(build_revisions(10), pairs(&[("rev_limit", "10")]));
        assert_eq!(build_restore("abc"), pairs(&[("rev", "abc")]));
    }

    #[test]
    fn search_params() {
        assert_eq!(
            build_search("report", 100, true),
            pairs(&[("query", "report"), ("file_limit", "100"), ("include_deleted", "true")])
        );
    }

    fn download_with_header(value: &[u8]) -> RawResponse {
        let mut headers = std::collections::BTreeMap::new();
        headers.insert(METADATA_HEADER.to_string(), value.to_vec());
        RawResponse {
            status: 200,
            headers,
            body: b"data".to_vec(),
        }
    }

    #[test]
    fn download_metadata_absent() {
        let resp = RawResponse {
            status: 200,
            headers: Default::default(),
            body: vec![],
        };
        assert_eq!(download_metadata("x", &resp).unwrap(), None);
    }

    #[test]
    fn download_metadata_non_ascii_path() {
        let resp = download_with_header("{\"path\": \"/Bücher/ü.txt\", \"bytes\": 4}".as_bytes());
        let meta = download_metadata("x", &resp).unwrap().unwrap();
        assert_eq!(meta.path, "/Bücher/ü.txt");
        assert_eq!(meta.bytes, 4);
    }

    #[test]
    fn download_metadata_invalid_utf8_is_decode_error() {
        let resp = download_with_header(b"{\"path\": \"/\xff\"}");
        let err = download_metadata("https://api-content.dropbox.com/1/files/sandbox/a", &resp)
            .unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn thumbnail_params() {
        assert_eq!(
            build_thumbnail(ThumbnailFormat::Png, ThumbnailSize::Xl),
            pairs(&[("format", "png"), ("size", "xl")])
        );
        assert_eq!(
            build_thumbnail(ThumbnailFormat::default(), ThumbnailSize::default()),
            pairs(&[("format", "jpeg"), ("size", "s")])
        );
    }
}
