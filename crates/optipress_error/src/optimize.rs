//! Optimizer error types.

/// Kinds of optimizer errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum OptimizeErrorKind {
    /// Failed to prepare the output directory for optimized files
    #[display("Failed to prepare output directory: {}", _0)]
    OutputDirectory(String),
    /// Failed to launch the external compressor
    #[display("Failed to launch compressor: {}", _0)]
    Spawn(String),
    /// Compressor exited with a failure status
    #[display("Compressor failed: {}", _0)]
    ToolFailed(String),
    /// Compressor exited cleanly but produced no output file
    #[display("Compressor produced no output: {}", _0)]
    NoOutput(String),
    /// Compressor produced a zero-byte output file
    #[display("Compressor produced an empty file: {}", _0)]
    EmptyOutput(String),
}

/// Optimizer error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Optimize Error: {} at line {} in {}", kind, line, file)]
pub struct OptimizeError {
    /// The kind of error that occurred
    pub kind: OptimizeErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl OptimizeError {
    /// Create a new optimizer error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: OptimizeErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
