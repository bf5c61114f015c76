//! # SortOfRemote NG – Dropbox Core API v1
//!
//! Client for the legacy Dropbox Core API (v1):
//!
//! - **OAuth 1.0a** — HMAC-SHA1 request signing and the three-legged token flow
//! - **Account** — profile and quota
//! - **Files** — download, upload, metadata, revisions, restore, search, thumbnails
//! - **File operations** — copy, move, delete, create folder, copy references
//! - **Sharing** — preview links and streaming links
//! - **Delta** — change polling with a decoder for the `[path, metadata|null]`
//!   entry pairs, plus an in-memory index that applies pages
//!
//! Every operation is a single signed HTTPS request; nothing is retried or
//! cached.

pub mod error;
pub mod config;
pub mod types;
pub mod decode;
pub mod signing;
pub mod client;
pub mod auth;
pub mod account;
pub mod files;
pub mod fileops;
pub mod sharing;
pub mod delta;

pub use auth::AuthorizedToken;
pub use client::DropboxClient;
pub use config::{AccessRoot, AccessToken, ConsumerCredentials, DropboxConfig};
pub use delta::{normalize_entries, DeltaIndex};
pub use error::{DropboxError, DropboxErrorKind, DropboxResult};
pub use types::*;
