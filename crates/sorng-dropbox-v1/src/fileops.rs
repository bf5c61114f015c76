//! File operations — copy, move, delete and folder creation.
//!
//! These live under `/fileops` on the API host and carry the access root as
//! a `root` parameter instead of a path segment. None of them is idempotent.

use crate::client::DropboxClient;
use crate::config::AccessRoot;
use crate::error::DropboxResult;
use crate::types::FileMetadata;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Request Builders
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn with_root(root: AccessRoot, rest: &[(&str, &str)]) -> Vec<(String, String)> {
    std::iter::once(("root".to_string(), root.as_str().to_string()))
        .chain(rest.iter().map(|(k, v)| (k.to_string(), v.to_string())))
        .collect()
}

/// Build a copy request.
pub fn build_copy(root: AccessRoot, from: &str, to: &str) -> Vec<(String, String)> {
    with_root(root, &[("from_path", from), ("to_path", to)])
}

/// Build a copy-from-reference request.
pub fn build_copy_from_ref(root: AccessRoot, copy_ref: &str, to: &str) -> Vec<(String, String)> {
    with_root(root, &[("from_copy_ref", copy_ref), ("to_path", to)])
}

/// Build a create_folder request.
pub fn build_create_folder(root: AccessRoot, path: &str) -> Vec<(String, String)> {
    with_root(root, &[("path", path)])
}

/// Build a delete request.
pub fn build_delete(root: AccessRoot, path: &str) -> Vec<(String, String)> {
    with_root(root, &[("path", path)])
}

/// Build a move request.
pub fn build_move(root: AccessRoot, from: &str, to: &str) -> Vec<(String, String)> {
    with_root(root, &[("from_path", from), ("to_path", to)])
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Endpoints
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl DropboxClient {
    pub async fn copy(&self, from: &str, to: &str) -> DropboxResult<FileMetadata> {
        self.post_json(&self.api_url("fileops/copy"), &build_copy(self.root(), from, to))
            .await
    }

    /// Copy a file shared by another account via [`DropboxClient::copy_ref`].
    pub async fn copy_from_ref(&self, copy_ref: &str, to: &str) -> DropboxResult<FileMetadata> {
        self.post_json(
            &self.api_url("fileops/copy"),
            &build_copy_from_ref(self.root(), copy_ref, to),
        )
        .await
    }

    pub async fn create_folder(&self, path: &str) -> DropboxResult<FileMetadata> {
        self.post_json(
            &self.api_url("fileops/create_folder"),
            &build_create_folder(self.root(), path),
        )
        .await
    }

    /// Delete a file or folder (recursively). Returns the deleted entry's
    /// metadata with `is_deleted` set.
    pub async fn delete(&self, path: &str) -> DropboxResult<FileMetadata> {
        self.post_json(&self.api_url("fileops/delete"), &build_delete(self.root(), path))
            .await
    }

    /// Move or rename a file or folder.
    pub async fn move_to(&self, from: &str, to: &str) -> DropboxResult<FileMetadata> {
        self.post_json(&self.api_url("fileops/move"), &build_move(self.root(), from, to))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(params: &[(String, String)]) -> Vec<&str> {
        params.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn copy_and_move_params() {
        let p = build_copy(AccessRoot::Sandbox, "/a.txt", "/b.txt");
        assert_eq!(keys(&p), vec!["root", "from_path", "to_path"]);
        assert_eq!(p[0].1, "sandbox");
        assert_eq!(p[1].1, "/a.txt");
        assert_eq!(p[2].1, "/b.txt");

        let m = build_move(AccessRoot::Dropbox, "/x", "/y");
        assert_eq!(m[0].1, "dropbox");
        assert_eq!(keys(&m), vec!["root", "from_path", "to_path"]);
    }

    #[test]
    fn copy_from_ref_params() {
        let p = build_copy_from_ref(AccessRoot::Sandbox, "z1X6ATl6aWtz", "/dst");
        assert_eq!(keys(&p), vec!["root", "from_copy_ref", "to_path"]);
        assert_eq!(p[1].1, "z1X6ATl6aWtz");
    }

    #[test]
    fn single_path_params() {
        assert_eq!(
            build_create_folder(AccessRoot::Sandbox, "/New Folder"),
            vec![
                ("root".to_string(), "sandbox".to_string()),
                ("path".to_string(), "/New Folder".to_string()),
            ]
        );
        assert_eq!(keys(&build_delete(AccessRoot::Dropbox, "/old")), vec!["root", "path"]);
    }
}
