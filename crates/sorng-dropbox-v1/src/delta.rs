//! Change polling (`/delta`) and delta-entry normalization.
//!
//! On the wire each delta entry is a two-element array
//! `[path, metadata-object | null]` whose metadata fields are loosely typed
//! (counts may be floats). [`normalize_entries`] turns that into typed
//! [`DeltaEntry`] values. It fails the whole batch on the first malformed
//! entry: callers treat delta as authoritative for their sync state, so a
//! silently skipped or half-decoded entry would corrupt it.
//!
//! [`DeltaIndex`] is a caller-owned helper that applies pages to an
//! in-memory view of the remote tree.

use crate::client::DropboxClient;
use crate::decode::{
    decode_json, lenient_bool, number_to_u32, number_to_u64, null_as_empty, type_name,
};
use crate::error::{DropboxError, DropboxResult};
use crate::types::{DeltaEntry, DeltaEnvelope, FileMetadata};
use log::debug;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Delta body as it arrives, before entries are normalized.
#[derive(Debug, Deserialize)]
struct RawDelta {
    #[serde(default, deserialize_with = "lenient_bool")]
    reset: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    cursor: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    has_more: bool,
    #[serde(default)]
    entries: Option<Vec<Value>>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Normalizer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert raw delta entries into typed entries, in order.
pub fn normalize_entries(raw: &[Value]) -> DropboxResult<Vec<DeltaEntry>> {
    raw.iter()
        .enumerate()
        .map(|(index, entry)| normalize_entry(index, entry))
        .collect()
}

fn normalize_entry(index: usize, entry: &Value) -> DropboxResult<DeltaEntry> {
    let pair = match entry {
        Value::Array(items) if items.len() == 2 => items,
        Value::Array(items) => {
            return Err(DropboxError::decode(format!(
                "delta entry {} has {} elements, expected [path, metadata]",
                index,
                items.len()
            )))
        }
        other => {
            return Err(DropboxError::decode(format!(
                "delta entry {} is a {}, expected [path, metadata]",
                index,
                type_name(other)
            )))
        }
    };

    let path = pair[0].as_str().ok_or_else(|| {
        DropboxError::decode(format!(
            "delta entry {} path is a {}, expected string",
            index,
            type_name(&pair[0])
        ))
    })?;

    let metadata = match &pair[1] {
        Value::Null => None,
        Value::Object(map) => Some(
            metadata_from_map(map)
                .map_err(|e| DropboxError::decode(format!("delta entry {} ({}): {}", index, path, e)))?,
        ),
        other => {
            return Err(DropboxError::decode(format!(
                "delta entry {} ({}) metadata is a {}, expected object or null",
                index,
                path,
                type_name(other)
            )))
        }
    };

    Ok(DeltaEntry {
        path: path.to_string(),
        metadata,
    })
}

/// Populate a [`FileMetadata`] from a loosely-typed mapping.
///
/// Unknown keys are ignored and null values leave the field at zero; a
/// recognized key with the wrong non-null type fails the whole mapping.
/// An empty mapping yields all-zero metadata.
pub fn metadata_from_map(map: &Map<String, Value>) -> Result<FileMetadata, String> {
    let mut meta = FileMetadata::default();
    for (key, value) in map {
        // A null recognized field reads as absent.
        if value.is_null() {
            continue;
        }
        match key.as_str() {
            "size" => meta.size = string_field(key, value)?,
            "rev" => meta.rev = string_field(key, value)?,
            "icon" => meta.icon = string_field(key, value)?,
            "modified" => meta.modified = string_field(key, value)?,
            "client_mtime" => meta.client_mtime = string_field(key, value)?,
            "mime_type" => meta.mime_type = string_field(key, value)?,
            "root" => meta.root = string_field(key, value)?,
            "path" => meta.path = string_field(key, value)?,
            "hash" => meta.hash = string_field(key, value)?,
            "is_dir" => meta.is_dir = bool_field(key, value)?,
            "thumb_exists" => meta.thumb_exists = bool_field(key, value)?,
            "is_deleted" => meta.is_deleted = bool_field(key, value)?,
            "bytes" => meta.bytes = number_to_u64(value).map_err(|e| format!("{}: {}", key, e))?,
            "revision" => {
                meta.revision = number_to_u32(value).map_err(|e| format!("{}: {}", key, e))?
            }
            _ => {}
        }
    }
    Ok(meta)
}

fn string_field(key: &str, value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("{}: expected a string, found {}", key, type_name(value)))
}

fn bool_field(key: &str, value: &Value) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("{}: expected a bool, found {}", key, type_name(value)))
}

/// Decode a full `/delta` response body.
pub fn decode_delta(endpoint: &str, body: &[u8]) -> DropboxResult<DeltaEnvelope> {
    let raw: RawDelta = decode_json(endpoint, body)?;
    let entries = normalize_entries(raw.entries.as_deref().unwrap_or(&[]))
        .map_err(|e| e.with_endpoint(endpoint))?;
    Ok(DeltaEnvelope {
        reset: raw.reset,
        cursor: raw.cursor,
        has_more: raw.has_more,
        entries,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build `/delta` parameters. Empty values are omitted.
pub fn build_delta(cursor: Option<&str>, path_prefix: Option<&str>) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(c) = cursor.filter(|c| !c.is_empty()) {
        params.push(("cursor".into(), c.to_string()));
    }
    if let Some(p) = path_prefix.filter(|p| !p.is_empty()) {
        params.push(("path_prefix".into(), p.to_string()));
    }
    params
}

impl DropboxClient {
    /// Fetch one page of changes since `cursor` (or from scratch when
    /// `None`), optionally limited to paths under `path_prefix`.
    pub async fn delta(
        &self,
        cursor: Option<&str>,
        path_prefix: Option<&str>,
    ) -> DropboxResult<DeltaEnvelope> {
        let url = self.api_url("delta");
        let resp = self
            .execute(Method::POST, &url, &build_delta(cursor, path_prefix), None)
            .await?;
        let page = decode_delta(&url, &resp.body)?;
        debug!(
            "delta: {} entries, reset={}, has_more={}",
            page.entries.len(),
            page.reset,
            page.has_more
        );
        Ok(page)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Local index
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-memory view of the remote tree, kept current by applying delta pages.
///
/// Paths are case-insensitive on the server, so entries are keyed by the
/// lower-cased path.
#[derive(Debug, Clone, Default)]
pub struct DeltaIndex {
    entries: BTreeMap<String, FileMetadata>,
    cursor: Option<String>,
}

impl DeltaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor to pass to the next `/delta` call.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&FileMetadata> {
        self.entries.get(&path.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileMetadata)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Apply one page:
    /// - `reset` clears everything first
    /// - `None` metadata removes the path and anything below it
    /// - a file replaces whatever was at the path, children included
    /// - a folder replaces the folder's own metadata and keeps its children
    pub fn apply(&mut self, page: &DeltaEnvelope) {
        if page.reset {
            self.entries.clear();
        }
        for entry in &page.entries {
            let key = entry.path.to_lowercase();
            match &entry.metadata {
                None => {
                    self.entries.remove(&key);
                    self.remove_children(&key);
                }
                Some(meta) => {
                    if !meta.is_dir {
                        self.remove_children(&key);
                    }
                    self.entries.insert(key, meta.clone());
                }
            }
        }
        self.cursor = Some(page.cursor.clone());
    }

    fn remove_children(&mut self, key: &str) {
        let prefix = format!("{}/", key.trim_end_matches('/'));
        self.entries.retain(|k, _| !k.starts_with(&prefix));
    }
}
