//! Namespace-scoped, content-addressed storage for uploaded images.
//!
//! Every client-supplied identifier owns two disjoint directory trees: an
//! originals tree filled by streaming ingest and an optimized tree filled by
//! the compression stage. Files are named `{digest}.{ext}` where the digest
//! is the MD5 of the raw bytes, so re-uploading identical content collapses
//! onto the same file.
//!
//! # Features
//!
//! - **Content-addressed naming**: the digest accumulates while the stream is
//!   written to a staging file; identical bytes land on identical names.
//! - **Namespace isolation**: identifiers and artifact names are
//!   parse-validated before any path is formed, so one namespace can never
//!   reach into another's trees.
//! - **Byte-level sniffing**: the stored bytes decide the format; the
//!   declared extension never does.
//!
//! # Example
//!
//! ```rust
//! use optipress_store::{FormatPolicy, NamespaceId, StoreRoot, ingest_reader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = StoreRoot::new("/var/optipress");
//! let id = NamespaceId::parse("client-token")?;
//! let dirs = root.resolve(&id);
//!
//! // Ingest a stream; the returned name is {md5-hex}.png.
//! let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
//! let artifact = ingest_reader(&dirs, "photo.png", &png[..]).await?;
//!
//! // The stored bytes, not the extension, decide whether it may proceed.
//! let policy = FormatPolicy::default();
//! let format = policy.enforce(&dirs.original_path(artifact.name())).await?;
//! # Ok(())
//! # }
//! ```

mod artifact;
mod delete;
mod format;
mod ingest;
mod namespace;

pub use artifact::{ArtifactName, DIGEST_HEX_LEN, declared_extension, open_optimized};
pub use delete::{Deletion, delete_artifact};
pub use format::{FormatPolicy, ImageFormat, SNIFF_LEN};
pub use ingest::{IngestedArtifact, StagedUpload, ingest_reader};
pub use namespace::{
    DEFAULT_OPTIMIZED_DIR, DEFAULT_UPLOADS_DIR, NamespaceDirs, NamespaceId, StoreRoot,
};

pub use optipress_error::{StoreError, StoreErrorKind};
