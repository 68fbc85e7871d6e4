//! Archive export error types.

/// Kinds of archive errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ArchiveErrorKind {
    /// Namespace has no optimized files to export
    #[display("Nothing to export for namespace: {}", _0)]
    NamespaceNotFound(String),
    /// Zip writer failed while building the archive
    #[display("Zip write failed: {}", _0)]
    Zip(String),
    /// Failed to read a source file into the archive
    #[display("Failed to read archive entry: {}", _0)]
    EntryRead(String),
    /// Consumer of the archive stream went away
    #[display("Archive stream closed: {}", _0)]
    StreamClosed(String),
}

/// Archive error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Archive Error: {} at line {} in {}", kind, line, file)]
pub struct ArchiveError {
    /// The kind of error that occurred
    pub kind: ArchiveErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ArchiveError {
    /// Create a new archive error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ArchiveErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
