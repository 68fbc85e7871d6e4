//! Image format detection from leading bytes.
//!
//! The stored bytes are authoritative. A client's declared extension never
//! decides whether a file may enter the optimization stage.

use optipress_error::{OptipressResult, StoreError, StoreErrorKind};
use std::path::Path;
use strum::IntoEnumIterator;
use tokio::io::AsyncReadExt;

/// Leading bytes read from a file for signature detection.
pub const SNIFF_LEN: usize = 16;

/// PNG signature, RFC 2083 section 12.11.
const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// JPEG SOI marker plus the first marker prefix, common to JFIF and EXIF.
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Image formats the pipeline can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG, either JFIF or EXIF flavored
    Jpeg,
}

impl ImageFormat {
    /// The signature that must prefix a file of this format.
    fn signature(&self) -> &'static [u8] {
        match self {
            ImageFormat::Png => PNG_SIGNATURE,
            ImageFormat::Jpeg => JPEG_SIGNATURE,
        }
    }

    /// Short lowercase name, as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// MIME type derived from the bytes, authoritative over any extension.
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Detect a format from the leading bytes of a file.
    pub fn detect(header: &[u8]) -> Option<ImageFormat> {
        ImageFormat::iter().find(|format| header.starts_with(format.signature()))
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            _ => Err(format!("Unknown image format: {}", s)),
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configured allow-list of formats accepted into the pipeline.
#[derive(Debug, Clone)]
pub struct FormatPolicy {
    allowed: Vec<ImageFormat>,
}

impl FormatPolicy {
    /// Build a policy from the formats it should accept.
    pub fn new(allowed: impl IntoIterator<Item = ImageFormat>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Whether the policy accepts a format.
    pub fn allows(&self, format: ImageFormat) -> bool {
        self.allowed.contains(&format)
    }

    /// Sniff a stored file and verify the detected format is allowed.
    ///
    /// Only the first [`SNIFF_LEN`] bytes are read. Undetectable or
    /// disallowed content fails with `UnsupportedFileType`.
    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn enforce(&self, path: &Path) -> OptipressResult<ImageFormat> {
        let header = read_header(path).await?;

        let Some(format) = ImageFormat::detect(&header) else {
            return Err(StoreError::new(StoreErrorKind::UnsupportedFileType(
                "no known image signature".to_string(),
            ))
            .into());
        };
        if !self.allows(format) {
            return Err(StoreError::new(StoreErrorKind::UnsupportedFileType(format!(
                "{} is not accepted",
                format.mime()
            )))
            .into());
        }

        tracing::debug!(format = %format, "Sniffed stored file");
        Ok(format)
    }
}

impl Default for FormatPolicy {
    /// A policy accepting every known format.
    fn default() -> Self {
        Self::new(ImageFormat::iter())
    }
}

/// Read up to [`SNIFF_LEN`] leading bytes of a file.
async fn read_header(path: &Path) -> OptipressResult<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::new(StoreErrorKind::NotFound(path.display().to_string()))
        } else {
            StoreError::new(StoreErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        }
    })?;

    let mut header = [0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let read = file.read(&mut header[filled..]).await.map_err(|e| {
            StoreError::new(StoreErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(header[..filled].to_vec())
}
