//! Namespace resolution and directory layout.
//!
//! A namespace is an opaque caller-supplied identifier that owns two disjoint
//! directory trees: one for stored originals and one for their optimized
//! counterparts. The identifier is validated before any path is formed, which
//! is what keeps one namespace out of another's trees.

use crate::ArtifactName;
use derive_getters::Getters;
use optipress_error::{OptipressResult, StoreError, StoreErrorKind};
use std::path::PathBuf;

/// Default name of the originals tree under the storage root.
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";

/// Default name of the optimized tree under the storage root.
pub const DEFAULT_OPTIMIZED_DIR: &str = "optimized";

/// Longest accepted namespace identifier.
const MAX_IDENTIFIER_LEN: usize = 64;

/// Validated namespace identifier.
///
/// Identifiers become directory names, so parsing rejects anything that could
/// escape the storage tree: path separators, `.`/`..`, leading dots, and
/// anything outside `[A-Za-z0-9._-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{}", _0)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// Parse and validate a caller-supplied identifier.
    pub fn parse(raw: &str) -> OptipressResult<Self> {
        if raw.is_empty() || raw.len() > MAX_IDENTIFIER_LEN {
            return Err(StoreError::new(StoreErrorKind::InvalidIdentifier(format!(
                "must be 1-{} characters (got {})",
                MAX_IDENTIFIER_LEN,
                raw.len()
            )))
            .into());
        }
        if raw.starts_with('.') {
            return Err(StoreError::new(StoreErrorKind::InvalidIdentifier(
                "must not start with a dot".to_string(),
            ))
            .into());
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
        {
            return Err(StoreError::new(StoreErrorKind::InvalidIdentifier(
                "only ASCII letters, digits, '.', '_' and '-' are allowed".to_string(),
            ))
            .into());
        }
        Ok(Self(raw.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The two top-level storage trees.
///
/// Construction is pure path math; nothing touches the filesystem until a
/// write-path operation calls [`NamespaceDirs::ensure`].
#[derive(Debug, Clone, Getters)]
pub struct StoreRoot {
    /// Originals tree, `{root}/{uploads_dir}`.
    uploads: PathBuf,
    /// Optimized tree, `{root}/{optimized_dir}`.
    optimized: PathBuf,
}

impl StoreRoot {
    /// Create a root with the default tree names.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_tree_names(root, DEFAULT_UPLOADS_DIR, DEFAULT_OPTIMIZED_DIR)
    }

    /// Create a root with configured tree names.
    pub fn with_tree_names(
        root: impl Into<PathBuf>,
        uploads_dir: &str,
        optimized_dir: &str,
    ) -> Self {
        let root = root.into();
        Self {
            uploads: root.join(uploads_dir),
            optimized: root.join(optimized_dir),
        }
    }

    /// Resolve the directory pair owned by one namespace.
    pub fn resolve(&self, id: &NamespaceId) -> NamespaceDirs {
        NamespaceDirs {
            id: id.clone(),
            originals: self.uploads.join(id.as_str()),
            optimized: self.optimized.join(id.as_str()),
        }
    }
}

/// The directory pair owned by one namespace.
#[derive(Debug, Clone, Getters)]
pub struct NamespaceDirs {
    /// Identifier the directories belong to.
    id: NamespaceId,
    /// Directory holding stored originals.
    originals: PathBuf,
    /// Directory holding optimized copies.
    optimized: PathBuf,
}

impl NamespaceDirs {
    /// Create both directories if absent.
    ///
    /// Idempotent and safe under concurrent first writers. Only the write
    /// path calls this: read paths must observe a missing directory as
    /// not-found rather than create it.
    #[tracing::instrument(skip(self), fields(namespace = %self.id))]
    pub async fn ensure(&self) -> OptipressResult<()> {
        for dir in [&self.originals, &self.optimized] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                StoreError::new(StoreErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
        }
        Ok(())
    }

    /// Path of an artifact in the originals tree.
    pub fn original_path(&self, name: &ArtifactName) -> PathBuf {
        self.originals.join(name.as_str())
    }

    /// Path of an artifact in the optimized tree.
    pub fn optimized_path(&self, name: &ArtifactName) -> PathBuf {
        self.optimized.join(name.as_str())
    }
}
