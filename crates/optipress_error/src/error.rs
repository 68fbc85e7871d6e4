//! Top-level error wrapper types.

use crate::{ArchiveError, ConfigError, OptimizeError, StoreError};

/// Aggregates the domain errors raised across the optipress crates.
///
/// # Examples
///
/// ```
/// use optipress_error::{ConfigError, OptipressError};
///
/// let cfg_err = ConfigError::new("missing root directory");
/// let err: OptipressError = cfg_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum OptipressErrorKind {
    /// Store error
    #[from(StoreError)]
    Store(StoreError),
    /// Optimizer error
    #[from(OptimizeError)]
    Optimize(OptimizeError),
    /// Archive export error
    #[from(ArchiveError)]
    Archive(ArchiveError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Optipress error with kind discrimination.
///
/// # Examples
///
/// ```
/// use optipress_error::{ConfigError, OptipressResult};
///
/// fn might_fail() -> OptipressResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Optipress Error: {}", _0)]
pub struct OptipressError(Box<OptipressErrorKind>);

impl OptipressError {
    /// Create a new error from a kind.
    pub fn new(kind: OptipressErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &OptipressErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to OptipressErrorKind
impl<T> From<T> for OptipressError
where
    T: Into<OptipressErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for optipress operations.
///
/// # Examples
///
/// ```
/// use optipress_error::{OptipressResult, StoreError, StoreErrorKind};
///
/// fn fetch_artifact() -> OptipressResult<String> {
///     Err(StoreError::new(StoreErrorKind::NotFound("abc.png".into())))?
/// }
/// ```
pub type OptipressResult<T> = std::result::Result<T, OptipressError>;
