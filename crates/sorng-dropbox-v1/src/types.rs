//! Response and request types for the Dropbox Core API v1.
//!
//! Every response type is decoded fresh from a body and handed to the
//! caller; nothing here is cached or mutated after construction.

use crate::decode::{lenient_bool, lenient_u32, lenient_u64, null_as_empty};
use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Account
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Snapshot of a user's account (`/account/info`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub referral_link: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub uid: u64,
    #[serde(default)]
    pub quota_info: QuotaInfo,
}

/// Quota breakdown in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaInfo {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub shared: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub quota: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub normal: u64,
}

impl QuotaInfo {
    /// Bytes in use (own files plus shared folders).
    pub fn used(&self) -> u64 {
        self.shared.saturating_add(self.normal)
    }

    /// Human readable usage, e.g. `5.00 GB / 10.00 GB (50.0%)`.
    pub fn format_usage(&self) -> String {
        let used_gb = self.used() as f64 / 1_073_741_824.0;
        let quota_gb = self.quota as f64 / 1_073_741_824.0;
        let pct = if self.quota > 0 {
            (self.used() as f64 / self.quota as f64) * 100.0
        } else {
            0.0
        };
        format!("{used_gb:.2} GB / {quota_gb:.2} GB ({pct:.1}%)")
    }

    /// Whether usage is at or above `threshold_pct` percent of the quota.
    pub fn is_critical(&self, threshold_pct: f64) -> bool {
        if self.quota == 0 {
            return false;
        }
        (self.used() as f64 / self.quota as f64) * 100.0 >= threshold_pct
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  File metadata
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Metadata for a file or folder.
///
/// `size` / `rev` stay strings and `bytes` / `revision` stay unsigned
/// integers, mirroring the wire representation. `contents` is only filled
/// for folder listings (`/metadata` with `list=true`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub size: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rev: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub thumb_exists: bool,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub bytes: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub modified: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub client_mtime: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub path: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_dir: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_deleted: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub icon: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub root: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub revision: u32,
    /// Folder hash, present on folder listings.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hash: String,
    #[serde(default)]
    pub contents: Vec<FileMetadata>,
}

impl FileMetadata {
    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }
}

/// Downloaded file content plus the metadata sent alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDownload {
    pub data: Vec<u8>,
    /// Decoded from the `x-dropbox-metadata` header, when present.
    pub metadata: Option<FileMetadata>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Links & copy references
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A shareable or streamable link (`/shares`, `/media`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub expires: String,
}

/// Opaque reference used to copy a file into another account.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReference {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub copy_ref: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub expires: String,
}

impl fmt::Debug for CopyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyReference")
            .field("copy_ref", &"****")
            .field("expires", &self.expires)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Delta
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One page of changes from `/delta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaEnvelope {
    /// The caller must discard local state before applying `entries`.
    pub reset: bool,
    pub cursor: String,
    /// Another page is available right away.
    pub has_more: bool,
    pub entries: Vec<DeltaEntry>,
}

/// A path paired with its new metadata, or `None` if it was deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaEntry {
    pub path: String,
    pub metadata: Option<FileMetadata>,
}

impl DeltaEntry {
    pub fn is_deletion(&self) -> bool {
        self.metadata.is_none()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Request options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Thumbnail image format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailFormat {
    /// Preferred for photos.
    #[default]
    Jpeg,
    /// Preferred for screenshots and digital art.
    Png,
}

impl ThumbnailFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

/// Thumbnail bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailSize {
    /// 32x32
    Xs,
    /// 64x64
    #[default]
    S,
    /// 128x128
    M,
    /// 640x480
    L,
    /// 1024x768
    Xl,
}

impl ThumbnailSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xs => "xs",
            Self::S => "s",
            Self::M => "m",
            Self::L => "l",
            Self::Xl => "xl",
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Xs => (32, 32),
            Self::S => (64, 64),
            Self::M => (128, 128),
            Self::L => (640, 480),
            Self::Xl => (1024, 768),
        }
    }
}

/// Optional query parameters for `/metadata`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataOptions {
    /// Include folder contents.
    pub list: Option<bool>,
    /// Maximum number of entries in a listing.
    pub file_limit: Option<u32>,
    /// Folder hash from a previous call; an unchanged folder answers 304.
    pub hash: Option<String>,
    /// Metadata of a specific revision.
    pub rev: Option<String>,
    pub include_deleted: Option<bool>,
}

impl MetadataOptions {
    /// Options for a folder listing.
    pub fn listing() -> Self {
        Self {
            list: Some(true),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_info_deser() {
        let json = r#"{
            "referral_link": "https://www.dropbox.com/referrals/r1a2n3d4m5s6t7",
            "display_name": "John P. User",
            "uid": 12345678,
            "country": "US",
            "email": "john@example.com",
            "quota_info": {"shared": 253738410565, "quota": 107374182400000, "normal": 680031877871}
        }"#;
        let a: AccountInfo = serde_json::from_str(json).unwrap();
        assert_eq!(a.display_name, "John P. User");
        assert_eq!(a.uid, 12345678);
        assert_eq!(a.quota_info.quota, 107374182400000);
        assert_eq!(a.quota_info.shared, 253738410565);
    }

    #[test]
    fn account_info_missing_quota() {
        let a: AccountInfo = serde_json::from_str(r#"{"display_name":"x"}"#).unwrap();
        assert_eq!(a.quota_info, QuotaInfo::default());
    }

    #[test]
    fn quota_usage_helpers() {
        let q = QuotaInfo {
            shared: 1_073_741_824,
            quota: 10_737_418_240,
            normal: 4_294_967_296,
        };
        assert_eq!(q.used(), 5_368_709_120);
        let s = q.format_usage();
        assert!(s.contains("5.00 GB"));
        assert!(s.contains("10.00 GB"));
        assert!(s.contains("50.0%"));
        assert!(!q.is_critical(90.0));
        assert!(q.is_critical(50.0));
    }

    #[test]
    fn quota_zero() {
        let q = QuotaInfo::default();
        assert!(q.format_usage().contains("0.0%"));
        assert!(!q.is_critical(1.0));
    }

    #[test]
    fn folder_metadata_with_contents() {
        let json = r#"{
            "size": "0 bytes",
            "hash": "37eb1ba1849d4b0fb0b28caf7ef3af52",
            "bytes": 0,
            "thumb_exists": false,
            "rev": "714f029684fe",
            "modified": "Wed, 27 Apr 2011 22:18:51 +0000",
            "path": "/Photos",
            "is_dir": true,
            "icon": "folder",
            "root": "dropbox",
            "contents": [
                {
                    "size": "2.3 MB",
                    "rev": "38af1b183490",
                    "thumb_exists": true,
                    "bytes": 2453963,
                    "modified": "Mon, 07 Apr 2011 01:15:26 +0000",
                    "client_mtime": "Thu, 29 Aug 2011 01:12:30 +0000",
                    "path": "/Photos/flower.jpg",
                    "is_dir": false,
                    "icon": "page_white_picture",
                    "root": "dropbox",
                    "mime_type": "image/jpeg",
                    "revision": 14511
                }
            ],
            "revision": 29007
        }"#;
        let m: FileMetadata = serde_json::from_str(json).unwrap();
        assert!(m.is_dir);
        assert_eq!(m.revision, 29007);
        assert_eq!(m.contents.len(), 1);
        assert_eq!(m.contents[0].bytes, 2453963);
        assert_eq!(m.contents[0].name(), "flower.jpg");
        assert_eq!(m.hash, "37eb1ba1849d4b0fb0b28caf7ef3af52");
    }

    #[test]
    fn file_metadata_float_bytes() {
        let m: FileMetadata = serde_json::from_str(r#"{"bytes": 1024.0, "revision": 3.0}"#).unwrap();
        assert_eq!(m.bytes, 1024);
        assert_eq!(m.revision, 3);
    }

    #[test]
    fn file_metadata_null_fields_read_as_zero() {
        let m: FileMetadata = serde_json::from_str(
            r#"{"path": "/a.txt", "bytes": 3, "icon": null, "thumb_exists": null,
                "is_dir": null, "is_deleted": null, "revision": null}"#,
        )
        .unwrap();
        assert_eq!(m.path, "/a.txt");
        assert_eq!(m.bytes, 3);
        assert_eq!(m.icon, "");
        assert!(!m.thumb_exists);
        assert!(!m.is_dir);
        assert_eq!(m.revision, 0);
    }

    #[test]
    fn share_link_deser() {
        let l: ShareLink = serde_json::from_str(
            r#"{"url":"https://db.tt/APqhX1","expires":"Tue, 01 Jan 2030 00:00:00 +0000"}"#,
        )
        .unwrap();
        assert_eq!(l.url, "https://db.tt/APqhX1");
    }

    #[test]
    fn copy_ref_debug_is_masked() {
        let c = CopyReference {
            copy_ref: "z1X6ATl6aWtzOGq0c3g5Ng".into(),
            expires: "Fri, 31 Jan 2042 21:01:05 +0000".into(),
        };
        let dbg = format!("{:?}", c);
        assert!(!dbg.contains("z1X6ATl6aWtzOGq0c3g5Ng"));
        assert!(dbg.contains("2042"));
    }

    #[test]
    fn thumbnail_params() {
        assert_eq!(ThumbnailFormat::default().as_str(), "jpeg");
        assert_eq!(ThumbnailSize::default().as_str(), "s");
        assert_eq!(ThumbnailSize::Xl.dimensions(), (1024, 768));
        assert_eq!(serde_json::to_string(&ThumbnailSize::Xs).unwrap(), r#""xs""#);
    }

    #[test]
    fn metadata_options_listing() {
        let o = MetadataOptions::listing();
        assert_eq!(o.list, Some(true));
        assert!(o.hash.is_none());
    }

    #[test]
    fn delta_entry_deletion() {
        let e = DeltaEntry {
            path: "/gone".into(),
            metadata: None,
        };
        assert!(e.is_deletion());
    }
}
