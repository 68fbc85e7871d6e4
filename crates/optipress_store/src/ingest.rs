//! Streaming ingest with content-digest finalization.
//!
//! An upload is staged under a random name while an incremental digest
//! consumes the same chunks that hit the disk. Only [`StagedUpload::finish`]
//! can produce an [`IngestedArtifact`], so a digest can never be observed for
//! a stream that has not ended.

use crate::artifact::declared_extension;
use crate::{ArtifactName, NamespaceDirs};
use derive_getters::Getters;
use md5::{Digest, Md5};
use optipress_error::{OptipressResult, StoreError, StoreErrorKind};
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Chunk size used when draining a reader into the store.
const CHUNK_LEN: usize = 8192;

/// A finalized, content-addressed original in the namespace's uploads tree.
#[derive(Debug, Clone, Getters)]
pub struct IngestedArtifact {
    /// Digest-derived stored filename.
    name: ArtifactName,
    /// Path of the stored original.
    path: PathBuf,
    /// Raw byte size of the stored original.
    size: u64,
}

/// An upload in flight: staged on disk, digest still accumulating.
///
/// Dropping an unfinished upload removes the staging file, so an aborted
/// stream never leaves partial bytes behind. Nothing is ever written at a
/// final artifact name until the stream has completed.
pub struct StagedUpload {
    dirs: NamespaceDirs,
    ext: String,
    staging: PathBuf,
    file: Option<tokio::fs::File>,
    hasher: Md5,
    written: u64,
}

impl StagedUpload {
    /// Open a staging file for an incoming stream.
    ///
    /// Ensures the namespace directories exist; this is the pipeline's only
    /// directory-creating step.
    #[tracing::instrument(skip(dirs), fields(namespace = %dirs.id(), filename = %filename))]
    pub async fn begin(dirs: &NamespaceDirs, filename: &str) -> OptipressResult<Self> {
        dirs.ensure().await?;

        let ext = declared_extension(filename);
        let staging = dirs.originals().join(format!("{}.part", Uuid::new_v4()));
        let file = tokio::fs::File::create(&staging).await.map_err(|e| {
            StoreError::new(StoreErrorKind::IngestFailed(format!(
                "{}: {}",
                staging.display(),
                e
            )))
        })?;

        tracing::debug!(staging = %staging.display(), "Opened staging file");
        Ok(Self {
            dirs: dirs.clone(),
            ext,
            staging,
            file: Some(file),
            hasher: Md5::new(),
            written: 0,
        })
    }

    /// Append one chunk, feeding the staging file and the digest alike.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> OptipressResult<()> {
        let write = match self.file.as_mut() {
            Some(file) => file.write_all(chunk).await,
            None => {
                return Err(StoreError::new(StoreErrorKind::IngestFailed(
                    "staging file already closed".to_string(),
                ))
                .into());
            }
        };
        if let Err(e) = write {
            self.discard().await;
            return Err(StoreError::new(StoreErrorKind::IngestFailed(format!(
                "{}: {}",
                self.staging.display(),
                e
            )))
            .into());
        }

        self.hasher.update(chunk);
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Finalize the digest and rename the staged bytes onto their
    /// content-addressed name.
    ///
    /// The rename overwrites an existing artifact of the same name. The name
    /// is a function of the content, so the bytes replaced are identical to
    /// the bytes written; that rename is the whole dedupe mechanism.
    #[tracing::instrument(skip(self), fields(namespace = %self.dirs.id()))]
    pub async fn finish(mut self) -> OptipressResult<IngestedArtifact> {
        let Some(mut file) = self.file.take() else {
            return Err(StoreError::new(StoreErrorKind::IngestFailed(
                "staging file already closed".to_string(),
            ))
            .into());
        };

        let flushed = file.flush().await;
        drop(file);
        if let Err(e) = flushed {
            let _ = tokio::fs::remove_file(&self.staging).await;
            return Err(StoreError::new(StoreErrorKind::IngestFailed(format!(
                "{}: {}",
                self.staging.display(),
                e
            )))
            .into());
        }

        let digest = format!("{:x}", std::mem::take(&mut self.hasher).finalize());
        let name = ArtifactName::from_parts(&digest, &self.ext);
        let path = self.dirs.original_path(&name);

        if let Err(e) = tokio::fs::rename(&self.staging, &path).await {
            let _ = tokio::fs::remove_file(&self.staging).await;
            return Err(StoreError::new(StoreErrorKind::IngestFailed(format!(
                "rename {} to {}: {}",
                self.staging.display(),
                path.display(),
                e
            )))
            .into());
        }

        tracing::info!(artifact = %name, size = self.written, "Ingested original");
        Ok(IngestedArtifact {
            name,
            path,
            size: self.written,
        })
    }

    /// Drop the staged bytes without finalizing.
    pub async fn abort(mut self) {
        self.discard().await;
    }

    async fn discard(&mut self) {
        if self.file.take().is_some() {
            if let Err(e) = tokio::fs::remove_file(&self.staging).await {
                tracing::warn!(
                    staging = %self.staging.display(),
                    error = %e,
                    "Failed to remove staging file"
                );
            }
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        // An unfinished upload must not leave its staging file behind.
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.staging);
        }
    }
}

/// Drive a full ingest from an async reader.
///
/// Reads in [`CHUNK_LEN`] chunks, so the payload is never held in memory at
/// once.
#[tracing::instrument(skip(dirs, reader), fields(namespace = %dirs.id(), filename = %filename))]
pub async fn ingest_reader<R>(
    dirs: &NamespaceDirs,
    filename: &str,
    mut reader: R,
) -> OptipressResult<IngestedArtifact>
where
    R: AsyncRead + Unpin,
{
    let mut staged = StagedUpload::begin(dirs, filename).await?;
    let mut chunk = [0u8; CHUNK_LEN];
    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(read) => read,
            Err(e) => {
                staged.abort().await;
                return Err(StoreError::new(StoreErrorKind::IngestFailed(format!(
                    "stream read: {}",
                    e
                )))
                .into());
            }
        };
        if read == 0 {
            break;
        }
        staged.write_chunk(&chunk[..read]).await?;
    }
    staged.finish().await
}
