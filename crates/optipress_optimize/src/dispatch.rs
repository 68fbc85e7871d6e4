//! Format-matched dispatch to external compressors.

use crate::ToolSpec;
use derive_getters::Getters;
use optipress_error::{OptimizeError, OptimizeErrorKind, OptipressResult};
use optipress_store::{ImageFormat, IngestedArtifact, NamespaceDirs};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// A compressed artifact in the namespace's optimized tree.
#[derive(Debug, Clone, Getters)]
pub struct OptimizedArtifact {
    /// Path of the optimized copy.
    path: PathBuf,
    /// Byte size read back from the written file.
    size: u64,
}

/// Maps each accepted format to its external compressor.
#[derive(Debug, Clone)]
pub struct Optimizer {
    tools: HashMap<ImageFormat, ToolSpec>,
}

impl Optimizer {
    /// Optimizer with the stock pngquant/jpegtran tools.
    pub fn new() -> Self {
        Self::from_tools([
            (ImageFormat::Png, ToolSpec::pngquant()),
            (ImageFormat::Jpeg, ToolSpec::jpegtran()),
        ])
    }

    /// Optimizer with explicit per-format tools.
    pub fn from_tools(tools: impl IntoIterator<Item = (ImageFormat, ToolSpec)>) -> Self {
        Self {
            tools: tools.into_iter().collect(),
        }
    }

    /// The tool registered for a format, if any.
    pub fn tool(&self, format: ImageFormat) -> Option<&ToolSpec> {
        self.tools.get(&format)
    }

    /// Run the compressor matching `format` over an ingested original.
    ///
    /// The optimized copy keeps the original's `{digest}.{ext}` name inside
    /// the namespace's optimized tree. Success and size are judged from the
    /// written file, never from the tool's own reporting: a clean exit with
    /// a missing or zero-byte output is still a failure.
    #[instrument(
        skip(self, dirs, artifact),
        fields(namespace = %dirs.id(), artifact = %artifact.name(), format = %format)
    )]
    pub async fn optimize(
        &self,
        dirs: &NamespaceDirs,
        artifact: &IngestedArtifact,
        format: ImageFormat,
    ) -> OptipressResult<OptimizedArtifact> {
        let Some(tool) = self.tools.get(&format) else {
            return Err(OptimizeError::new(OptimizeErrorKind::ToolFailed(format!(
                "no compressor registered for {}",
                format
            )))
            .into());
        };

        let input = artifact.path();
        let output = dirs.optimized_path(artifact.name());
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                OptimizeError::new(OptimizeErrorKind::OutputDirectory(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let args = tool.render(input, &output);
        debug!(program = %tool.program(), ?args, "Running compressor");

        let result = Command::new(tool.program())
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                OptimizeError::new(OptimizeErrorKind::Spawn(format!(
                    "Failed to spawn {}: {}",
                    tool.program(),
                    e
                )))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(OptimizeError::new(OptimizeErrorKind::ToolFailed(format!(
                "{} exited with {}: {}",
                tool.program(),
                result.status,
                stderr.trim()
            )))
            .into());
        }

        let size = match tokio::fs::metadata(&output).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OptimizeError::new(OptimizeErrorKind::NoOutput(format!(
                    "{} wrote nothing at {}",
                    tool.program(),
                    output.display()
                )))
                .into());
            }
            Err(e) => {
                return Err(OptimizeError::new(OptimizeErrorKind::NoOutput(format!(
                    "{}: {}",
                    output.display(),
                    e
                )))
                .into());
            }
        };
        if size == 0 {
            // Leave no zero-byte file behind for downloads to find.
            let _ = tokio::fs::remove_file(&output).await;
            return Err(OptimizeError::new(OptimizeErrorKind::EmptyOutput(
                output.display().to_string(),
            ))
            .into());
        }

        info!(size, "Optimized artifact");
        Ok(OptimizedArtifact { path: output, size })
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}
