//! Artifact removal across both namespace trees.

use crate::{ArtifactName, NamespaceDirs};
use optipress_error::{OptipressResult, StoreError, StoreErrorKind};
use std::path::Path;

/// Which copies a deletion actually removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    /// The original in the uploads tree existed and was removed.
    pub original: bool,
    /// The optimized copy existed and was removed.
    pub optimized: bool,
}

/// Remove the original and optimized copies of an artifact.
///
/// Removing whichever copies exist counts as success; only "neither copy
/// existed" is a not-found failure.
#[tracing::instrument(skip(dirs), fields(namespace = %dirs.id(), artifact = %name))]
pub async fn delete_artifact(
    dirs: &NamespaceDirs,
    name: &ArtifactName,
) -> OptipressResult<Deletion> {
    let original = remove_if_present(&dirs.original_path(name)).await?;
    let optimized = remove_if_present(&dirs.optimized_path(name)).await?;

    if !original && !optimized {
        return Err(StoreError::new(StoreErrorKind::NotFound(name.to_string())).into());
    }

    tracing::info!(original, optimized, "Deleted artifact");
    Ok(Deletion {
        original,
        optimized,
    })
}

/// Remove a file, reporting whether it was present at all.
async fn remove_if_present(path: &Path) -> OptipressResult<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::new(StoreErrorKind::DeletionFailed(format!(
            "{}: {}",
            path.display(),
            e
        )))
        .into()),
    }
}
