//! Wire request bodies.
//!
//! Identifier fields are optional at the serde level so that a missing token
//! or filename surfaces as this service's own 400 body instead of a
//! deserialization rejection.

use serde::{Deserialize, Serialize};

/// Query parameters accepted by `POST /upload`.
///
/// The namespace token normally travels as a multipart text field ahead of
/// the file; the query parameter is the fallback for clients that cannot
/// control field order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UploadQuery {
    /// Namespace token.
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of `POST /delete`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeleteRequest {
    /// Namespace token.
    #[serde(default)]
    pub token: Option<String>,

    /// Stored `{digest}.{ext}` name to remove.
    #[serde(default)]
    pub filename: Option<String>,
}

/// One requested archive entry in `POST /download-zip`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ZipEntryRequest {
    /// Stored `{digest}.{ext}` name inside the namespace.
    #[serde(default)]
    pub file_server_name: String,

    /// Name the entry should carry inside the archive.
    #[serde(default)]
    pub file_real_name: String,
}

/// Body of `POST /download-zip`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DownloadZipRequest {
    /// Namespace token.
    #[serde(default)]
    pub token: Option<String>,

    /// Entries to pack, in order.
    #[serde(default)]
    pub files: Vec<ZipEntryRequest>,
}
