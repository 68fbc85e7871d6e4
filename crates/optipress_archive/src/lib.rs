//! Streamed zip export of optimized artifacts.
//!
//! The `zip` container wants a `Write + Seek` destination, which an HTTP
//! response body cannot offer. The exporter therefore writes through a
//! bounded in-memory window: bytes the container can still back-patch stay in
//! the window, and everything older is shipped down a channel the moment it
//! becomes final. Peak memory stays near one compressed entry no matter how
//! many artifacts are bundled.

mod export;
mod window;

pub use export::{ExportEntry, archive_file_name, export_zip};

pub use optipress_error::{ArchiveError, ArchiveErrorKind};
