//! Digest-derived artifact names and optimized-file access.

use crate::NamespaceDirs;
use optipress_error::{OptipressResult, StoreError, StoreErrorKind};

/// Hex digits in the content-digest half of an artifact name.
pub const DIGEST_HEX_LEN: usize = 32;

/// Longest accepted declared extension.
const MAX_EXT_LEN: usize = 16;

/// Extension assigned when the uploaded filename has no usable one.
const FALLBACK_EXT: &str = "bin";

/// Validated `{digest}.{extension}` artifact name.
///
/// Every stored filename arriving from outside (download paths, delete
/// bodies, export entries) must pass through [`ArtifactName::parse`] before
/// it is joined onto a namespace directory, which rules out path traversal
/// by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{}", _0)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Assemble a name from a finalized digest and a normalized extension.
    pub(crate) fn from_parts(digest: &str, ext: &str) -> Self {
        Self(format!("{digest}.{ext}"))
    }

    /// Parse an externally supplied stored filename.
    pub fn parse(raw: &str) -> OptipressResult<Self> {
        let Some((digest, ext)) = raw.split_once('.') else {
            return Err(StoreError::new(StoreErrorKind::InvalidArtifactName(format!(
                "{}: missing extension",
                raw
            )))
            .into());
        };
        if digest.len() != DIGEST_HEX_LEN
            || !digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(StoreError::new(StoreErrorKind::InvalidArtifactName(format!(
                "{}: digest must be {} lowercase hex characters",
                raw, DIGEST_HEX_LEN
            )))
            .into());
        }
        if ext.is_empty()
            || ext.len() > MAX_EXT_LEN
            || !ext.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(StoreError::new(StoreErrorKind::InvalidArtifactName(format!(
                "{}: extension must be 1-{} lowercase alphanumerics",
                raw, MAX_EXT_LEN
            )))
            .into());
        }
        Ok(Self(raw.to_string()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Content-digest half of the name.
    pub fn digest(&self) -> &str {
        &self.0[..DIGEST_HEX_LEN]
    }

    /// Declared-extension half of the name.
    pub fn extension(&self) -> &str {
        &self.0[DIGEST_HEX_LEN + 1..]
    }
}

/// Normalize the extension declared by an uploaded filename.
///
/// The part after the last dot, lowercased. Anything missing, longer than
/// [`MAX_EXT_LEN`] characters, or containing non-alphanumerics falls back
/// to `bin`.
pub fn declared_extension(filename: &str) -> String {
    let ext = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    let lowered = ext.to_ascii_lowercase();
    if lowered.is_empty()
        || lowered.len() > MAX_EXT_LEN
        || !lowered.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        FALLBACK_EXT.to_string()
    } else {
        lowered
    }
}

/// Resolve and open an optimized artifact for download.
///
/// Returns the open file plus its byte size. Only optimized copies are ever
/// served; originals do not leave the store.
#[tracing::instrument(skip(dirs), fields(namespace = %dirs.id(), artifact = %name))]
pub async fn open_optimized(
    dirs: &NamespaceDirs,
    name: &ArtifactName,
) -> OptipressResult<(tokio::fs::File, u64)> {
    let path = dirs.optimized_path(name);

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::new(StoreErrorKind::NotFound(name.to_string()))
        } else {
            StoreError::new(StoreErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        }
    })?;
    let size = file
        .metadata()
        .await
        .map_err(|e| {
            StoreError::new(StoreErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?
        .len();

    tracing::debug!(size, "Opened optimized artifact");
    Ok((file, size))
}
