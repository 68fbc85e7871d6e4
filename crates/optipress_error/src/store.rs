//! Store error types.

/// Kinds of store errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// No namespace identifier was supplied with the request
    #[display("No namespace identifier supplied")]
    MissingIdentifier,
    /// Namespace identifier failed validation
    #[display("Invalid namespace identifier: {}", _0)]
    InvalidIdentifier(String),
    /// Artifact name is not a digest-derived name this store produces
    #[display("Invalid artifact name: {}", _0)]
    InvalidArtifactName(String),
    /// Failed to create a storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to stage or finalize an incoming file
    #[display("Ingest failed: {}", _0)]
    IngestFailed(String),
    /// Stored bytes do not match any accepted image format
    #[display("Unsupported file type: {}", _0)]
    UnsupportedFileType(String),
    /// Failed to read a stored file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Artifact not found at the specified location
    #[display("Artifact not found: {}", _0)]
    NotFound(String),
    /// Failed to delete a stored file
    #[display("Deletion failed: {}", _0)]
    DeletionFailed(String),
}

/// Store error with location tracking.
///
/// # Examples
///
/// ```
/// use optipress_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound("abc123.png".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
